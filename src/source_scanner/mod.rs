//! Textual pass over Java sources.
//!
//! Compilation erases comments, literal arguments of method calls and the way path
//! fragments were assembled from constants. This module recovers those facts with a
//! handful of small line scanners, each an explicit state machine fed from one shared
//! per-line token pass. Scanners never fail: a line that matches nothing leaves the
//! scanner where it was.

pub mod class_path;
pub mod constants;
pub mod context;
pub mod doc_comment;
pub mod enum_values;
pub mod lexer;
pub mod response_status;

use crate::error::SourceReadError;
use context::FileContext;
use lexer::{Lexer, Token};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// (binary type name, member name)
pub type MemberKey = (String, String);

/// One segment of a `@Path` value as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    /// A reference to a string constant; `owners` are the candidate declaring types,
    /// in lookup order
    Constant { owners: Vec<String>, name: String },
}

/// Path fragment of a type and the type its path is composed onto.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathInfo {
    pub segments: Vec<PathSegment>,
    pub parent: Option<String>,
}

/// What a routed method's `return Response...` statement reveals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFact {
    /// Entity type passed to `ok(...)`, when it could be resolved
    pub type_name: Option<String>,
    pub status_code: u16,
    pub status_text: String,
}

/// Everything the textual pass learned, across all files of a run.
#[derive(Debug, Default)]
pub struct SourceFacts {
    pub doc_comments: HashMap<MemberKey, String>,
    pub response_types: HashMap<MemberKey, ResponseFact>,
    /// Enum binary name -> declaring source file
    pub enum_locations: BTreeMap<String, PathBuf>,
    pub class_paths: HashMap<String, PathInfo>,
    pub constants: HashMap<MemberKey, String>,
}

impl SourceFacts {
    pub fn doc_comment(&self, type_name: &str, method: &str) -> Option<&str> {
        self.doc_comments
            .get(&(type_name.to_string(), method.to_string()))
            .map(String::as_str)
    }

    pub fn response(&self, type_name: &str, method: &str) -> Option<&ResponseFact> {
        self.response_types
            .get(&(type_name.to_string(), method.to_string()))
    }

    pub fn constant(&self, owner: &str, name: &str) -> Option<&str> {
        self.constants
            .get(&(owner.to_string(), name.to_string()))
            .map(String::as_str)
    }

    /// The concatenated value of a type's path fragment, or `None` if any constant
    /// reference cannot be resolved.
    pub fn resolve_segments(&self, segments: &[PathSegment]) -> Option<String> {
        let mut out = String::new();
        for segment in segments {
            match segment {
                PathSegment::Literal(literal) => out.push_str(literal),
                PathSegment::Constant { owners, name } => {
                    let value = owners.iter().find_map(|owner| self.constant(owner, name))?;
                    out.push_str(value);
                }
            }
        }
        Some(out)
    }
}

/// One source line as seen by the scanners.
pub struct Line<'a> {
    pub raw: &'a str,
    pub tokens: &'a [Token],
}

/// A per-file line scanner. Scanners see each line before the file context has
/// consumed it, so `ctx` still describes the enclosing scope of a declaration line.
pub trait LineScanner {
    fn scan_line(&mut self, line: &Line<'_>, ctx: &FileContext, facts: &mut SourceFacts);

    fn end_of_file(&mut self, _ctx: &FileContext, _facts: &mut SourceFacts) {}
}

/// Drives every line scanner over source files.
pub struct SourceScanner;

impl SourceScanner {
    fn scanners() -> Vec<Box<dyn LineScanner>> {
        vec![
            Box::new(doc_comment::DocCommentScanner::default()),
            Box::new(enum_values::EnumValueScanner),
            Box::new(response_status::ResponseStatusScanner::default()),
            Box::new(class_path::ClassPathInheritanceScanner::default()),
            Box::new(constants::ConstantScanner),
        ]
    }

    /// Scan one source file, adding its facts to `facts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read; `facts` is left untouched then.
    pub fn scan_file(path: &Path, facts: &mut SourceFacts) -> Result<(), SourceReadError> {
        let bytes = fs::read(path).map_err(|source| SourceReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Self::scan_text(path, &text, facts);
        Ok(())
    }

    /// Scan source text as if it had been read from `path`.
    pub fn scan_text(path: &Path, text: &str, facts: &mut SourceFacts) {
        debug!("Scanning source {}", path.display());

        let mut ctx = FileContext::new(path);
        let mut lexer = Lexer::new();
        let mut scanners = Self::scanners();

        for raw in text.lines() {
            let tokens = lexer.tokenize(raw);
            let line = Line {
                raw,
                tokens: &tokens,
            };
            for scanner in scanners.iter_mut() {
                scanner.scan_line(&line, &ctx, facts);
            }
            ctx.advance(&tokens);
        }

        for scanner in scanners.iter_mut() {
            scanner.end_of_file(&ctx, facts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_file_collects_all_fact_kinds() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("OrderResource.java");
        fs::write(
            &path,
            r#"package com.acme;

@Path(OrderResource.BASE)
public class OrderResource {
    public static final String BASE = "/orders";

    public enum Kind { ONLINE, STORE }

    /** Creates an order. */
    @POST
    public Response create(Order order) {
        return Response.accepted().build();
    }
}
"#,
        )
        .unwrap();

        let mut facts = SourceFacts::default();
        SourceScanner::scan_file(&path, &mut facts).unwrap();

        assert_eq!(
            facts.doc_comment("com.acme.OrderResource", "create"),
            Some("Creates an order.")
        );
        assert_eq!(
            facts.response("com.acme.OrderResource", "create").map(|r| r.status_code),
            Some(202)
        );
        assert!(facts.enum_locations.contains_key("com.acme.OrderResource$Kind"));
        assert_eq!(facts.constant("com.acme.OrderResource", "BASE"), Some("/orders"));
        assert_eq!(
            facts.resolve_segments(&facts.class_paths["com.acme.OrderResource"].segments),
            Some("/orders".to_string())
        );
    }

    #[test]
    fn test_scan_missing_file() {
        let mut facts = SourceFacts::default();
        let err = SourceScanner::scan_file(Path::new("/nonexistent/A.java"), &mut facts);

        assert!(err.is_err());
        assert!(facts.doc_comments.is_empty());
    }

    #[test]
    fn test_unresolvable_constant() {
        let facts = SourceFacts::default();
        let segments = vec![
            PathSegment::Literal("/a".to_string()),
            PathSegment::Constant {
                owners: vec!["com.acme.Nowhere".to_string()],
                name: "X".to_string(),
            },
        ];

        assert_eq!(facts.resolve_segments(&segments), None);
    }
}
