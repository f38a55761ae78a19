//! Extraction engine: merges the structural and textual passes into a [`RestApiModel`].
//!
//! A run has three strictly ordered phases:
//!
//! 1. **Source walk** - every `.java` file is fed through the
//!    [`SourceScanner`](crate::source_scanner::SourceScanner); enum values are then
//!    resolved through the type catalog.
//! 2. **Artifact walk** - every top-level `.class` file is loaded and, when routed,
//!    registered as a Resource with its Endpoints (see [`endpoints`]).
//! 3. **Finalization** - root paths are composed along parent chains ([`paths`]) and
//!    payload shapes are discovered breadth-first ([`shapes`]).
//!
//! All per-run state lives in an [`ExtractionContext`]; nothing is global, so runs are
//! independent and repeatable.
//!
//! # Example
//!
//! ```no_run
//! use restdoc::extractor::{ExtractionConfig, ExtractionEngine};
//!
//! let config = ExtractionConfig::new("target/classes", "src/main/java");
//! let model = ExtractionEngine::new(config).run().unwrap();
//! println!("Found {} resources", model.resources.len());
//! ```

pub mod endpoints;
pub mod paths;
pub mod shapes;

use crate::catalog::TypeCatalog;
use crate::error::ConfigError;
use crate::model::{DataShape, Resource, RestApiModel};
use crate::scanner::{qualified_name, FileScanner, ScanResult, CLASS_EXTENSION, SOURCE_EXTENSION};
use crate::source_scanner::{SourceFacts, SourceScanner};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Input locations of a run.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Root of the compiled classes to document
    pub classes_dir: PathBuf,
    /// Root of the matching Java sources
    pub source_dir: PathBuf,
    /// Extra class directories searched after `classes_dir` (dependencies)
    pub classpath: Vec<PathBuf>,
}

impl ExtractionConfig {
    pub fn new(classes_dir: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            classes_dir: classes_dir.into(),
            source_dir: source_dir.into(),
            classpath: Vec::new(),
        }
    }

    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    /// Check that every configured root exists and is a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_directory("classes", &self.classes_dir)?;
        check_directory("source", &self.source_dir)?;
        for dir in &self.classpath {
            check_directory("classpath", dir)?;
        }
        Ok(())
    }
}

fn check_directory(role: &'static str, path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingDirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Mutable state of one run, passed to each phase.
pub struct ExtractionContext {
    pub catalog: TypeCatalog,
    pub facts: SourceFacts,
    /// Enum binary name -> `", "`-joined constants (`""` when the enum failed to load)
    pub enum_values: HashMap<String, String>,
    pub resources: BTreeMap<String, Resource>,
    pub data_shapes: BTreeMap<String, DataShape>,
}

impl ExtractionContext {
    pub fn new(class_roots: Vec<PathBuf>) -> Self {
        Self {
            catalog: TypeCatalog::new(class_roots),
            facts: SourceFacts::default(),
            enum_values: HashMap::new(),
            resources: BTreeMap::new(),
            data_shapes: BTreeMap::new(),
        }
    }

    /// Look up the constants of every enum found in source.
    pub fn resolve_enum_values(&mut self) {
        let names: Vec<String> = self.facts.enum_locations.keys().cloned().collect();
        for name in names {
            let values = match self.catalog.load_type(&name) {
                Ok(handle) => TypeCatalog::enum_constants(&handle).join(", "),
                Err(e) => {
                    warn!(
                        "Cannot load enum {} declared in {}: {}",
                        name,
                        self.facts.enum_locations[&name].display(),
                        e
                    );
                    String::new()
                }
            };
            self.enum_values.insert(name, values);
        }
    }

    pub fn into_model(self) -> RestApiModel {
        RestApiModel {
            resources: self.resources.into_values().collect(),
            data_shapes: self.data_shapes,
        }
    }
}

/// Runs the full extraction over one classes/sources pair.
pub struct ExtractionEngine {
    config: ExtractionConfig,
}

impl ExtractionEngine {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Run all phases and return the finished model.
    ///
    /// # Errors
    ///
    /// Only configuration problems are errors; everything else degrades the model and
    /// is logged.
    pub fn run(&self) -> Result<RestApiModel, ConfigError> {
        self.config.validate()?;

        let mut roots = vec![self.config.classes_dir.clone()];
        roots.extend(self.config.classpath.iter().cloned());
        let mut ctx = ExtractionContext::new(roots);

        self.walk_sources(&mut ctx);
        ctx.resolve_enum_values();
        self.walk_artifacts(&mut ctx);

        paths::finalize_paths(&mut ctx);
        shapes::resolve_shapes(&mut ctx);

        let model = ctx.into_model();
        info!(
            "Extracted {} resource(s), {} endpoint(s), {} data shape(s)",
            model.resources.len(),
            model.endpoint_count(),
            model.data_shapes.len()
        );
        Ok(model)
    }

    fn walk_sources(&self, ctx: &mut ExtractionContext) {
        let scan = scan_files(&self.config.source_dir, SOURCE_EXTENSION);
        info!("Scanning {} source file(s)", scan.files.len());

        for path in &scan.files {
            if let Err(e) = SourceScanner::scan_file(path, &mut ctx.facts) {
                warn!("{}", e);
            }
        }
    }

    fn walk_artifacts(&self, ctx: &mut ExtractionContext) {
        let root = &self.config.classes_dir;
        let scan = scan_files(root, CLASS_EXTENSION);
        info!("Inspecting {} class file(s)", scan.files.len());

        for path in &scan.files {
            let Some(name) = qualified_name(root, path) else {
                warn!("Cannot derive a type name for {}", path.display());
                continue;
            };
            // Nested and anonymous types are reached through their outer type
            if name.contains('$') {
                debug!("Skipping nested type {}", name);
                continue;
            }
            endpoints::discover_resource(ctx, &name);
        }
    }
}

fn scan_files(root: &Path, extension: &'static str) -> ScanResult {
    match FileScanner::new(root.to_path_buf(), extension).scan() {
        Ok(result) => result,
        Err(e) => {
            warn!("Failed to scan {}: {}", root.display(), e);
            ScanResult {
                files: Vec::new(),
                warnings: vec![e.to_string()],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_builder::ClassSpec;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_reports_missing_and_file_roots() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        let missing = ExtractionConfig::new(temp_dir.path().join("nope"), temp_dir.path());
        assert!(matches!(
            missing.validate(),
            Err(ConfigError::MissingDirectory { role: "classes", .. })
        ));

        let not_dir = ExtractionConfig::new(temp_dir.path(), &file);
        assert!(matches!(
            not_dir.validate(),
            Err(ConfigError::NotADirectory { role: "source", .. })
        ));

        let bad_classpath = ExtractionConfig::new(temp_dir.path(), temp_dir.path())
            .with_classpath(vec![temp_dir.path().join("lib")]);
        assert!(bad_classpath.validate().is_err());
    }

    #[test]
    fn test_enum_values_are_resolved_or_empty() {
        let temp_dir = TempDir::new().unwrap();
        ClassSpec::new_enum("com/acme/Color", &["RED", "GREEN"]).write_to(temp_dir.path());

        let mut ctx = ExtractionContext::new(vec![temp_dir.path().to_path_buf()]);
        ctx.facts
            .enum_locations
            .insert("com.acme.Color".into(), PathBuf::from("Color.java"));
        ctx.facts
            .enum_locations
            .insert("com.acme.Gone".into(), PathBuf::from("Gone.java"));

        ctx.resolve_enum_values();

        assert_eq!(ctx.enum_values["com.acme.Color"], "RED, GREEN");
        assert_eq!(ctx.enum_values["com.acme.Gone"], "");
    }
}
