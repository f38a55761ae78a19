//! Renders a [`RestApiModel`] as an OpenAPI 3.0.1 document.

use crate::classfile::descriptor::{is_core_type, TypeRef};
use crate::extractor::paths::join_path;
use crate::model::{BindingKind, Endpoint, HttpMethod, Resource, RestApiModel};
use crate::schema_generator::{Schema, SchemaGenerator};
use crate::source_scanner::doc_comment::clean_doc_text;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPENAPI_VERSION: &str = "3.0.1";
const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Document-level metadata supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    pub license: Option<String>,
    pub development_server: Option<String>,
    pub staging_server: Option<String>,
    pub production_server: Option<String>,
}

impl Default for ApiInfo {
    fn default() -> Self {
        Self {
            title: "REST API".to_string(),
            version: "1.0.0".to_string(),
            license: None,
            development_server: None,
            staging_server: None,
            production_server: None,
        }
    }
}

impl ApiInfo {
    fn servers(&self) -> Vec<Server> {
        [
            (&self.development_server, "Development server"),
            (&self.staging_server, "Staging server"),
            (&self.production_server, "Production server"),
        ]
        .into_iter()
        .filter_map(|(url, description)| {
            url.as_ref().map(|url| Server {
                url: url.clone(),
                description: Some(description.to_string()),
            })
        })
        .collect()
    }
}

/// OpenAPI document builder
pub struct OpenApiBuilder {
    info: ApiInfo,
    paths: BTreeMap<String, PathItem>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem - one operation per HTTP method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
        }
    }

    /// The operation registered for a verb.
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
        }
    }
}

/// OpenAPI Operation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Keyed by status code
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// path, query or header
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    /// Keyed by media type
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<BTreeMap<String, Schema>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl OpenApiBuilder {
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: ApiInfo::default(),
            paths: BTreeMap::new(),
        }
    }

    pub fn with_info(mut self, info: ApiInfo) -> Self {
        self.info = info;
        self
    }

    /// Render a whole model in one go.
    pub fn render(info: ApiInfo, model: &RestApiModel) -> OpenApiDocument {
        let schema_gen = SchemaGenerator::new(&model.data_shapes);
        let mut builder = Self::new().with_info(info);
        for resource in &model.resources {
            builder.add_resource(resource, &schema_gen);
        }
        builder.build(schema_gen)
    }

    pub fn add_resource(&mut self, resource: &Resource, schema_gen: &SchemaGenerator) {
        debug!(
            "Adding resource {} with {} endpoint(s)",
            resource.qualified_name,
            resource.endpoints.len()
        );
        for endpoint in &resource.endpoints {
            self.add_endpoint(resource, endpoint, schema_gen);
        }
    }

    /// Add one endpoint as an operation. A second endpoint on the same path and verb
    /// is dropped.
    pub fn add_endpoint(
        &mut self,
        resource: &Resource,
        endpoint: &Endpoint,
        schema_gen: &SchemaGenerator,
    ) {
        let path = operation_path(&resource.root_path, &endpoint.path);
        debug!("Adding operation: {} {}", endpoint.http_method, path);

        let operation = build_operation(endpoint, schema_gen);
        let slot = self.paths.entry(path.clone()).or_default().slot(endpoint.http_method);
        if slot.is_some() {
            warn!(
                "Duplicate operation {} {} from {}.{}, keeping the first one",
                endpoint.http_method, path, resource.qualified_name, endpoint.method_name
            );
            return;
        }
        *slot = Some(operation);
    }

    /// Build the final OpenAPI document
    pub fn build(self, schema_gen: SchemaGenerator) -> OpenApiDocument {
        debug!("Building final OpenAPI document with {} path(s)", self.paths.len());

        let schemas = schema_gen.get_schemas();
        let components = if schemas.is_empty() {
            None
        } else {
            Some(Components {
                schemas: Some(schemas.clone()),
            })
        };
        let servers = self.info.servers();

        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info {
                title: self.info.title,
                version: self.info.version,
                description: None,
                license: self.info.license.map(|name| License { name }),
            },
            servers: if servers.is_empty() { None } else { Some(servers) },
            paths: self.paths,
            components,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn build_operation(endpoint: &Endpoint, schema_gen: &SchemaGenerator) -> Operation {
    let doc = endpoint.doc.as_deref().map(clean_doc_text).unwrap_or_default();
    let description = prose(&doc);

    let parameters: Vec<Parameter> = endpoint
        .parameters
        .iter()
        .filter_map(|p| {
            let location = match p.kind {
                BindingKind::Path => "path",
                BindingKind::Header => "header",
                BindingKind::Query => "query",
                BindingKind::Body => return None,
            };
            Some(Parameter {
                name: p.name.clone(),
                location: location.to_string(),
                required: p.kind == BindingKind::Path,
                schema: schema_gen.generate_schema(&p.type_name),
                description: param_description(&doc, &p.name),
            })
        })
        .collect();

    let request_body = endpoint.request_body.as_ref().map(|body| RequestBody {
        description: Some(format!("{}, Class = {}", body.name, body.type_name)),
        required: true,
        content: content(&endpoint.consumes, schema_gen.generate_schema(&body.type_name)),
    });

    let return_info = &endpoint.return_info;
    let return_type = return_info
        .annotated_type
        .as_deref()
        .unwrap_or(&return_info.type_name);
    let response = Response {
        description: return_info.status_text.clone(),
        content: has_payload(return_type)
            .then(|| content(&endpoint.produces, schema_gen.generate_schema(return_type))),
    };

    let mut responses = BTreeMap::new();
    responses.insert(return_info.status_code.to_string(), response);

    Operation {
        summary: description
            .as_deref()
            .and_then(|d| d.lines().next())
            .map(str::to_string),
        description,
        operation_id: Some(endpoint.method_name.clone()),
        deprecated: endpoint.deprecated,
        parameters: if parameters.is_empty() { None } else { Some(parameters) },
        request_body,
        responses,
    }
}

/// One media-type entry per declared type, `application/json` when none is declared.
fn content(media_types: &[String], schema: Schema) -> BTreeMap<String, MediaType> {
    let defaults = [DEFAULT_MEDIA_TYPE.to_string()];
    let media_types = if media_types.is_empty() {
        &defaults[..]
    } else {
        media_types
    };
    media_types
        .iter()
        .map(|m| (m.clone(), MediaType { schema: schema.clone() }))
        .collect()
}

/// Collections, arrays and domain types carry a documented payload.
fn has_payload(type_name: &str) -> bool {
    match type_name.parse::<TypeRef>() {
        Ok(type_ref) => {
            !type_ref.is_void()
                && (type_ref.is_array() || type_ref.is_collection() || !is_core_type(&type_ref.name))
        }
        Err(_) => false,
    }
}

/// Doc text without its `@` tag lines.
fn prose(doc: &str) -> Option<String> {
    let text = doc
        .lines()
        .take_while(|line| !line.starts_with('@'))
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of the `@param <name>` tag.
fn param_description(doc: &str, name: &str) -> Option<String> {
    doc.lines()
        .filter_map(|line| line.strip_prefix("@param"))
        .find_map(|rest| {
            let rest = rest.trim_start();
            let description = rest.strip_prefix(name)?;
            if !description.is_empty() && !description.starts_with(char::is_whitespace) {
                return None;
            }
            Some(description.trim().to_string())
        })
        .filter(|d| !d.is_empty())
}

/// Combine the resource and method fragments into an OpenAPI path: placeholder
/// regexes are stripped and an empty result becomes `/`.
pub fn operation_path(root_path: &str, method_path: &str) -> String {
    let path = join_path([
        strip_placeholder_patterns(root_path).as_str(),
        strip_placeholder_patterns(method_path).as_str(),
    ]);
    if path.is_empty() {
        "/".to_string()
    } else {
        path
    }
}

/// `{id: [0-9]+}` -> `{id}`
fn strip_placeholder_patterns(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0;
    let mut skipping = false;

    for c in path.chars() {
        match c {
            '{' => {
                depth += 1;
                if depth == 1 {
                    out.push(c);
                    skipping = false;
                }
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    out.push(c);
                    skipping = false;
                }
            }
            ':' if depth == 1 => skipping = true,
            _ if depth == 0 => out.push(c),
            _ if depth == 1 && !skipping && !c.is_whitespace() => out.push(c),
            _ => {}
        }
    }

    out
}
