//! restdoc - REST API documentation extracted from JAX-RS code bases.
//!
//! Compiled classes alone lose information a document needs: generic element types
//! survive only in signatures, doc comments and constant expressions are gone, and
//! the status a method answers with lives in its body. restdoc therefore reads each
//! code base twice and merges the results:
//!
//! - the **structural pass** decodes `.class` files ([`classfile`], [`catalog`]) and
//!   is authoritative for routes, verbs, parameters and payload types;
//! - the **textual pass** runs line-oriented scanners over the `.java` sources
//!   ([`source_scanner`]) and enriches the model with doc comments, response
//!   statuses, enum locations, constant-based `@Path` values and path inheritance.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively collects `.class` and `.java` files
//! 2. [`classfile`] - Decodes class files and type descriptors
//! 3. [`catalog`] - Loads and caches types by binary name
//! 4. [`source_scanner`] - Per-line state machines over Java sources
//! 5. [`extractor`] - Merges both passes into a [`model::RestApiModel`]
//! 6. [`schema_generator`] - Converts data shapes to OpenAPI schemas
//! 7. [`openapi_builder`] - Constructs the OpenAPI document
//! 8. [`serializer`] - Serializes the document (or the model) to YAML or JSON
//! 9. [`html_output`] - Renders the model as a linked static HTML site
//!
//! # Example Usage
//!
//! ```no_run
//! use restdoc::{
//!     extractor::{ExtractionConfig, ExtractionEngine},
//!     openapi_builder::{ApiInfo, OpenApiBuilder},
//!     serializer::serialize_yaml,
//! };
//!
//! let config = ExtractionConfig::new("target/classes", "src/main/java");
//! let model = ExtractionEngine::new(config).run().unwrap();
//!
//! let document = OpenApiBuilder::render(ApiInfo::default(), &model);
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod catalog;
pub mod classfile;
pub mod cli;
pub mod error;
pub mod extractor;
pub mod html_output;
pub mod model;
pub mod openapi_builder;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod source_scanner;

#[cfg(test)]
#[path = "../tests/support/class_builder.rs"]
pub(crate) mod class_builder;
