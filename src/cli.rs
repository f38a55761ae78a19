use crate::extractor::{ExtractionConfig, ExtractionEngine};
use crate::html_output::{write_site, HtmlRenderer};
use crate::model::RestApiModel;
use crate::openapi_builder::{ApiInfo, OpenApiBuilder};
use crate::serializer::{serialize_json, serialize_model, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// restdoc - Generate REST API documentation from compiled JAX-RS classes and their sources
#[derive(Parser, Debug)]
#[command(name = "restdoc")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Root directory of the compiled classes
    #[arg(value_name = "CLASSES_DIR")]
    pub classes_dir: PathBuf,

    /// Root directory of the matching Java sources
    #[arg(value_name = "SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout); the output directory
    /// for the html format
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// Additional class directory searched for dependencies (repeatable)
    #[arg(long = "classpath", value_name = "DIR")]
    pub classpath: Vec<PathBuf>,

    /// Document title
    #[arg(long = "title", default_value = "REST API")]
    pub title: String,

    /// Document version
    #[arg(long = "api-version", default_value = "1.0.0")]
    pub api_version: String,

    /// License name
    #[arg(long = "license")]
    pub license: Option<String>,

    /// Development server URL
    #[arg(long = "dev-server", value_name = "URL")]
    pub dev_server: Option<String>,

    /// Staging server URL
    #[arg(long = "staging-server", value_name = "URL")]
    pub staging_server: Option<String>,

    /// Production server URL
    #[arg(long = "production-server", value_name = "URL")]
    pub production_server: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// OpenAPI as YAML
    Yaml,
    /// OpenAPI as JSON
    Json,
    /// The raw extraction model as JSON
    Model,
    /// A static HTML site, one page per resource and data shape
    Html,
}

impl CliArgs {
    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig::new(&self.classes_dir, &self.source_dir)
            .with_classpath(self.classpath.clone())
    }

    pub fn api_info(&self) -> ApiInfo {
        ApiInfo {
            title: self.title.clone(),
            version: self.api_version.clone(),
            license: self.license.clone(),
            development_server: self.dev_server.clone(),
            staging_server: self.staging_server.clone(),
            production_server: self.production_server.clone(),
        }
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    check_directory("Classes", &args.classes_dir)?;
    check_directory("Source", &args.source_dir)?;
    for dir in &args.classpath {
        check_directory("Classpath", dir)?;
    }

    info!("Classes directory: {}", args.classes_dir.display());
    info!("Source directory: {}", args.source_dir.display());
    if !args.classpath.is_empty() {
        info!("Classpath: {:?}", args.classpath);
    }
    info!("Output format: {:?}", args.output_format);
    if args.output_format == OutputFormat::Html && args.output_path.is_none() {
        anyhow::bail!("The html format needs an output directory (-o)");
    }
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

fn check_directory(role: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("{} directory does not exist: {}", role, path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("{} directory is not a directory: {}", role, path.display());
    }
    Ok(())
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting REST documentation extraction...");

    // Step 1: Extract the model
    let engine = ExtractionEngine::new(args.extraction_config());
    let model = engine.run().context("Extraction failed")?;

    if model.resources.is_empty() {
        log::warn!("No REST resources found under {}", args.classes_dir.display());
    }

    // Step 2: Render in the requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Html => {
            let output_dir = args
                .output_path
                .as_deref()
                .context("The html format needs an output directory (-o)")?;
            let pages = HtmlRenderer::new(&args.title, &model).render();
            write_site(&pages, output_dir)?;
            log_summary(&model);
            return Ok(());
        }
        OutputFormat::Model => serialize_model(&model)?,
        OutputFormat::Yaml | OutputFormat::Json => {
            info!("Building OpenAPI document...");
            let document = OpenApiBuilder::render(args.api_info(), &model);
            if args.output_format == OutputFormat::Yaml {
                serialize_yaml(&document)?
            } else {
                serialize_json(&document)?
            }
        }
    };

    // Step 3: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }

    log_summary(&model);

    Ok(())
}

fn log_summary(model: &RestApiModel) {
    info!("Summary:");
    info!("  - Resources: {}", model.resources.len());
    info!("  - Endpoints: {}", model.endpoint_count());
    info!("  - Data shapes: {}", model.data_shapes.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_defaults() {
        let args = CliArgs::try_parse_from(["restdoc", "classes", "src"]).unwrap();

        assert_eq!(args.output_format, OutputFormat::Yaml);
        assert_eq!(args.title, "REST API");
        assert_eq!(args.api_version, "1.0.0");
        assert!(args.classpath.is_empty());
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_all_options() {
        let args = CliArgs::try_parse_from([
            "restdoc",
            "classes",
            "src",
            "-f",
            "model",
            "-o",
            "out.json",
            "--classpath",
            "lib1",
            "--classpath",
            "lib2",
            "--title",
            "Shop",
            "--api-version",
            "3",
            "--license",
            "MIT",
            "--dev-server",
            "http://localhost",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.output_format, OutputFormat::Model);
        assert_eq!(args.classpath, vec![PathBuf::from("lib1"), PathBuf::from("lib2")]);
        let info = args.api_info();
        assert_eq!(info.title, "Shop");
        assert_eq!(info.license.as_deref(), Some("MIT"));
        assert_eq!(info.development_server.as_deref(), Some("http://localhost"));
        assert!(info.production_server.is_none());
        assert!(args.verbose);
    }

    #[test]
    fn test_validation_rejects_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let dir = temp_dir.path().to_str().unwrap();

        let missing = CliArgs::try_parse_from(["restdoc", "/no/such/dir", dir]).unwrap();
        let err = parse_args_from_parsed(missing).unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let not_dir = CliArgs::try_parse_from(["restdoc", dir, file.to_str().unwrap()]).unwrap();
        let err = parse_args_from_parsed(not_dir).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));

        let valid = CliArgs::try_parse_from(["restdoc", dir, dir]).unwrap();
        assert!(parse_args_from_parsed(valid).is_ok());
    }

    #[test]
    fn test_html_format_needs_output_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_str().unwrap();

        let args = CliArgs::try_parse_from(["restdoc", dir, dir, "-f", "html"]).unwrap();
        let err = parse_args_from_parsed(args).unwrap_err();
        assert!(err.to_string().contains("output directory"));
    }

    #[test]
    fn test_run_writes_html_site() {
        let temp_dir = TempDir::new().unwrap();
        let classes = temp_dir.path().join("classes");
        let sources = temp_dir.path().join("src");
        fs::create_dir_all(&classes).unwrap();
        fs::create_dir_all(&sources).unwrap();
        let site = temp_dir.path().join("site");

        let args = CliArgs::try_parse_from([
            "restdoc",
            classes.to_str().unwrap(),
            sources.to_str().unwrap(),
            "-f",
            "html",
            "-o",
            site.to_str().unwrap(),
            "--title",
            "Shop",
        ])
        .unwrap();
        run(args).unwrap();

        let index = fs::read_to_string(site.join("index.html")).unwrap();
        assert!(index.contains("REST API for project: &quot;Shop&quot;"));
        assert!(site.join("programmersinfo.html").is_file());
    }

    #[test]
    fn test_run_writes_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let classes = temp_dir.path().join("classes");
        let sources = temp_dir.path().join("src");
        fs::create_dir_all(&classes).unwrap();
        fs::create_dir_all(&sources).unwrap();
        let output = temp_dir.path().join("out").join("openapi.json");

        let args = CliArgs::try_parse_from([
            "restdoc",
            classes.to_str().unwrap(),
            sources.to_str().unwrap(),
            "-f",
            "json",
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(args).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(parsed["openapi"], "3.0.1");
        assert!(parsed["paths"].as_object().unwrap().is_empty());
    }
}
