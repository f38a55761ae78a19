//! Output serialization: OpenAPI documents as YAML or JSON, and the raw extraction
//! model as JSON.

use crate::model::RestApiModel;
use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// # Example
///
/// ```no_run
/// use restdoc::model::RestApiModel;
/// use restdoc::openapi_builder::{ApiInfo, OpenApiBuilder};
/// use restdoc::serializer::serialize_yaml;
///
/// let doc = OpenApiBuilder::render(ApiInfo::default(), &RestApiModel::default());
/// println!("{}", serialize_yaml(&doc).unwrap());
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to pretty-printed JSON.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Serializes the extraction model itself, for inspection or further tooling.
pub fn serialize_model(model: &RestApiModel) -> Result<String> {
    debug!("Serializing REST API model to JSON");
    serde_json::to_string_pretty(model).context("Failed to serialize REST API model to JSON")
}

/// Writes string content to a file, creating parent directories and overwriting any
/// existing file.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataShape, Endpoint, HttpMethod, Resource, ReturnInfo};
    use crate::openapi_builder::{ApiInfo, OpenApiBuilder};
    use tempfile::TempDir;

    fn create_test_model() -> RestApiModel {
        let mut model = RestApiModel::default();
        model.resources.push(Resource {
            qualified_name: "com.acme.UserResource".to_string(),
            display_name: "UserResource".to_string(),
            class_path: "/users".to_string(),
            root_path: "/users".to_string(),
            endpoints: vec![Endpoint {
                method_name: "list".to_string(),
                http_method: HttpMethod::Get,
                path: String::new(),
                produces: vec!["application/json".to_string()],
                consumes: vec![],
                parameters: vec![],
                return_info: ReturnInfo {
                    type_name: "java.util.List<com.acme.User>".to_string(),
                    annotated_type: None,
                    status_code: 200,
                    status_text: "OK".to_string(),
                },
                doc: None,
                deprecated: false,
                request_body: None,
            }],
        });
        model
            .data_shapes
            .insert("com.acme.User".to_string(), DataShape::with_fields(vec![]));
        model
    }

    fn create_test_document() -> OpenApiDocument {
        let info = ApiInfo {
            title: "Test API".to_string(),
            ..ApiInfo::default()
        };
        OpenApiBuilder::render(info, &create_test_model())
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("openapi: 3.0.1"));
        assert!(yaml.contains("title: Test API"));
        assert!(yaml.contains("/users:"));
        assert!(yaml.contains("operationId: list"));
        assert!(yaml.contains("#/components/schemas/User"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.lines().count() > 5, "JSON should be pretty-printed");
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["openapi"], "3.0.1");
        assert_eq!(parsed["info"]["title"], "Test API");
        assert_eq!(
            parsed["paths"]["/users"]["get"]["responses"]["200"]["content"]["application/json"]
                ["schema"]["type"],
            "array"
        );
        assert!(parsed.get("servers").is_none());
    }

    #[test]
    fn test_serialize_model() {
        let json = serialize_model(&create_test_model()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["resources"][0]["qualified_name"], "com.acme.UserResource");
        assert_eq!(parsed["resources"][0]["endpoints"][0]["http_method"], "GET");
        assert_eq!(
            parsed["data_shapes"]["com.acme.User"]["description"],
            DataShape::NO_FIELDS
        );
    }

    #[test]
    fn test_yaml_reads_back_as_document() {
        let doc = create_test_document();
        let yaml = serialize_yaml(&doc).unwrap();

        let deserialized: OpenApiDocument = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(deserialized, doc);
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("openapi.yaml");

        write_to_file("first", &file_path).unwrap();
        write_to_file("second", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
    }
}
