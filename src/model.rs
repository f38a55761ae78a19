//! The REST API model produced by an extraction run.
//!
//! Everything here is plain data: built once by the
//! [`ExtractionEngine`](crate::extractor::ExtractionEngine) and read by the renderers.
//! All types serialize with serde so the raw model can be dumped as JSON.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP verbs a resource method can be routed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Patch,
    ];

    /// The verb's decorator name, which is also its wire name (`GET`).
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Map a decorator simple name (`GET`, `POST`, ...) to its verb.
    pub fn from_decorator(simple_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == simple_name)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Path,
    Header,
    Query,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub kind: BindingKind,
    /// External name (`id` for `@PathParam("id")`)
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestBody {
    pub name: String,
    pub type_name: String,
}

/// Return contract of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnInfo {
    /// Declared return type, or the entity type recovered from `Response.ok(x)`
    pub type_name: String,
    /// Type named by a `DocReturnType` decorator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_type: Option<String>,
    pub status_code: u16,
    pub status_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// Java method name
    pub method_name: String,
    pub http_method: HttpMethod,
    /// Method-level path fragment, `""` when the method has none
    pub path: String,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    /// Declaration order, with path placeholders of the resource path first
    pub parameters: Vec<Parameter>,
    pub return_info: ReturnInfo,
    /// Doc comment text as buffered from source (lines separated by `\r`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Binary name, e.g. `com.acme.UserResource`
    pub qualified_name: String,
    pub display_name: String,
    /// The type's own `@Path` value as compiled
    pub class_path: String,
    /// Full root path composed with inherited fragments
    pub root_path: String,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    /// Element type of a collection or array field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
}

/// The documented shape of a payload type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataShape {
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DataShape {
    pub const NO_FIELDS: &'static str = "No fields found in this class";
    pub const ERROR_FIELD: &'static str = "error";

    pub fn with_fields(fields: Vec<Field>) -> Self {
        if fields.is_empty() {
            return Self::described(Self::NO_FIELDS);
        }
        Self {
            fields,
            description: None,
        }
    }

    pub fn described(description: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            description: Some(description.into()),
        }
    }

    pub fn enumeration(values: &str) -> Self {
        Self::described(format!("enum {}", values))
    }

    /// Placeholder for a type whose structure could not be introspected.
    pub fn error(diagnostic: impl fmt::Display) -> Self {
        Self {
            fields: vec![Field {
                name: Self::ERROR_FIELD.to_string(),
                type_name: Self::ERROR_FIELD.to_string(),
                element_type: None,
            }],
            description: Some(format!("ERROR: Reflection failed to get type info, {}", diagnostic)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].name == Self::ERROR_FIELD
            && self.fields[0].type_name == Self::ERROR_FIELD
    }

    /// Enum values, when this shape describes an enum.
    pub fn enum_values(&self) -> Option<Vec<&str>> {
        let values = self.description.as_deref()?.strip_prefix("enum ")?;
        Some(
            values
                .split(", ")
                .filter(|v| !v.is_empty())
                .collect(),
        )
    }
}

/// The complete result of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestApiModel {
    /// Ordered by qualified name
    pub resources: Vec<Resource>,
    pub data_shapes: BTreeMap<String, DataShape>,
}

impl RestApiModel {
    pub fn resource(&self, qualified_name: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.qualified_name == qualified_name)
    }

    pub fn data_shape(&self, type_name: &str) -> Option<&DataShape> {
        self.data_shapes.get(type_name)
    }

    pub fn endpoint_count(&self) -> usize {
        self.resources.iter().map(|r| r.endpoints.len()).sum()
    }
}
