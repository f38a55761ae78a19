use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension of compiled JVM artifacts.
pub const CLASS_EXTENSION: &str = "class";
/// File extension of Java source files.
pub const SOURCE_EXTENSION: &str = "java";

/// File scanner for traversing artifact and source directories.
///
/// The `FileScanner` recursively walks a root directory and collects every file with
/// the requested extension. Hidden directories (those starting with `.`) are skipped.
///
/// # Example
///
/// ```no_run
/// use restdoc::scanner::{FileScanner, CLASS_EXTENSION};
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./target/classes"), CLASS_EXTENSION);
/// let result = scanner.scan().unwrap();
/// println!("Found {} class files", result.files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extension: &'static str,
}

/// Result of directory scanning operation.
///
/// Contains the list of discovered files and any warnings encountered during scanning.
pub struct ScanResult {
    /// Paths of all discovered files, in a stable (sorted) order
    pub files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory and extension.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The root directory to scan
    /// * `extension` - File extension to collect, without the leading dot
    pub fn new(root_path: PathBuf, extension: &'static str) -> Self {
        Self {
            root_path,
            extension,
        }
    }

    /// Scans the directory tree and collects all files with the configured extension.
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }
                !e.file_name().to_string_lossy().starts_with('.')
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file()
                        && path.extension().and_then(|s| s.to_str()) == Some(self.extension)
                    {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult { files, warnings })
    }
}

/// Reconstructs a qualified type name from a file path below `root`.
///
/// The root prefix is stripped, the remaining components are joined with `.` and the
/// file extension is dropped: `<root>/com/acme/User.class` becomes `com.acme.User`.
/// Returns `None` when `path` is not below `root` or has no file stem.
pub fn qualified_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let stem = relative.file_stem()?.to_str()?;

    let mut parts: Vec<&str> = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            parts.push(component.as_os_str().to_str()?);
        }
    }
    parts.push(stem);

    Some(parts.join("."))
}
