//! restdoc - command-line REST documentation extractor for JAX-RS code bases.
//!
//! Reads a compiled classes directory together with the matching Java sources and
//! writes an OpenAPI 3.0.1 document (or the raw extraction model).
//!
//! # Usage
//!
//! ```bash
//! restdoc [OPTIONS] <CLASSES_DIR> <SOURCE_DIR>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! restdoc target/classes src/main/java -o openapi.yaml
//! ```
//!
//! Write the HTML site into a directory:
//! ```bash
//! restdoc target/classes src/main/java -f html -o target/restdoc
//! ```
//!
//! Dump the extraction model with verbose logging:
//! ```bash
//! restdoc target/classes src/main/java -f model -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use restdoc::cli;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can configure the logger
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("restdoc starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args)?;

    info!("REST documentation generation completed successfully");

    Ok(())
}
