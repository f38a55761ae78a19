use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems, reported before any extraction begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{role} directory does not exist: {}", path.display())]
    MissingDirectory { role: &'static str, path: PathBuf },

    #[error("{role} path is not a directory: {}", path.display())]
    NotADirectory { role: &'static str, path: PathBuf },
}

/// A class file that could not be decoded.
#[derive(Debug, Error)]
pub enum ClassFormatError {
    #[error("bad magic number 0x{0:08X}")]
    BadMagic(u32),

    #[error("unexpected end of class file at offset {0}")]
    UnexpectedEof(usize),

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("constant pool index {0} is invalid or has the wrong kind")]
    BadConstantIndex(u16),

    #[error("malformed descriptor or signature: {0}")]
    BadDescriptor(String),
}

/// A type that could not be loaded from the catalog.
///
/// Never fatal: callers degrade (placeholder data shape, skipped resource).
#[derive(Debug, Clone, Error)]
pub enum TypeLoadError {
    #[error("type not found: {name}")]
    NotFound { name: String },

    #[error("cannot read class file for {name} ({}): {message}", path.display())]
    Unreadable {
        name: String,
        path: PathBuf,
        message: String,
    },

    #[error("malformed class file for {name}: {message}")]
    Malformed { name: String, message: String },

    #[error("{name} depends on {dependency}, which cannot be loaded")]
    MissingDependency { name: String, dependency: String },
}

impl TypeLoadError {
    /// The name of the type whose load failed.
    pub fn type_name(&self) -> &str {
        match self {
            TypeLoadError::NotFound { name }
            | TypeLoadError::Unreadable { name, .. }
            | TypeLoadError::Malformed { name, .. }
            | TypeLoadError::MissingDependency { name, .. } => name,
        }
    }
}

/// A source file that could not be read. Its facts are simply absent.
#[derive(Debug, Error)]
#[error("cannot read source file {}: {source}", path.display())]
pub struct SourceReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
