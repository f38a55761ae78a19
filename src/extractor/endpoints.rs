//! Resource and endpoint discovery over loaded types.

use super::ExtractionContext;
use crate::catalog::{annotation_named, rs_annotation, MethodHandle, TypeHandle};
use crate::classfile::Annotation;
use crate::model::{
    BindingKind, Endpoint, HttpMethod, Parameter, RequestBody, Resource, ReturnInfo,
};
use crate::source_scanner::response_status::default_status;
use log::{debug, warn};

/// Names given to request-body parameters whose compiled name is unavailable.
const ORDINAL_NAMES: [&str; 10] = [
    "First argument",
    "Second argument",
    "Third argument",
    "Fourth argument",
    "Fifth argument",
    "Sixth argument",
    "Seventh argument",
    "Eighth argument",
    "Ninth argument",
    "Tenth argument",
];

/// Parameter decorators that bind from the request context rather than from the
/// documented request.
const INJECTION_DECORATORS: &[&str] = &[
    "Context",
    "Suspended",
    "FormParam",
    "CookieParam",
    "MatrixParam",
    "BeanParam",
];

/// How a method parameter is bound, as declared by its decorators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamDecorator {
    Path(String),
    Header(String),
    Query(String),
    /// Injected by the container; not part of the documented contract
    Injected,
    /// No binding decorator: the request body
    Unbound,
}

impl ParamDecorator {
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        for annotation in annotations {
            if !annotation.type_name.starts_with("javax.ws.rs.")
                && !annotation.type_name.starts_with("jakarta.ws.rs.")
            {
                continue;
            }
            let value = || annotation.string_value("value").unwrap_or_default().to_string();
            match annotation.simple_name() {
                "PathParam" => return ParamDecorator::Path(value()),
                "HeaderParam" => return ParamDecorator::Header(value()),
                "QueryParam" => return ParamDecorator::Query(value()),
                name if INJECTION_DECORATORS.contains(&name) => return ParamDecorator::Injected,
                _ => {}
            }
        }
        ParamDecorator::Unbound
    }
}

/// Fallback name for an unnamed request body at `position` (0-based).
pub fn ordinal_name(position: usize) -> &'static str {
    ORDINAL_NAMES.get(position).copied().unwrap_or("-")
}

/// Normalize a method-level `@Path`: one leading slash, no trailing slash.
fn method_path(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn media_types(own: &[Annotation], fallback: &[Annotation], name: &str) -> Vec<String> {
    rs_annotation(own, name)
        .or_else(|| rs_annotation(fallback, name))
        .map(|a| a.string_values("value"))
        .unwrap_or_default()
}

fn http_method(method: &MethodHandle) -> Option<HttpMethod> {
    method
        .annotations
        .iter()
        .filter(|a| {
            a.type_name.starts_with("javax.ws.rs.") || a.type_name.starts_with("jakarta.ws.rs.")
        })
        .find_map(|a| HttpMethod::from_decorator(a.simple_name()))
}

/// Load `name` and, if it is routed, register it as a Resource.
///
/// A type qualifies when it carries a root `@Path` or declares at least one verb
/// method; the latter are sub-resources whose path comes from inheritance.
pub fn discover_resource(ctx: &mut ExtractionContext, name: &str) {
    let handle = match ctx.catalog.load_type(name) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Skipping {}: {}", name, e);
            return;
        }
    };

    let class_path = rs_annotation(&handle.annotations, "Path")
        .map(|a| a.string_value("value").unwrap_or_default().to_string());

    let endpoints: Vec<Endpoint> = handle
        .methods
        .iter()
        .filter(|m| m.is_public())
        .filter_map(|m| http_method(m).map(|verb| build_endpoint(ctx, &handle, m, verb)))
        .collect();

    if class_path.is_none() && endpoints.is_empty() {
        return;
    }

    debug!(
        "Registered resource {} with {} endpoint(s)",
        handle.name,
        endpoints.len()
    );
    let class_path = class_path.unwrap_or_default();
    ctx.resources.insert(
        handle.name.clone(),
        Resource {
            qualified_name: handle.name.clone(),
            display_name: handle.simple_name().to_string(),
            root_path: class_path.clone(),
            class_path,
            endpoints,
        },
    );
}

fn build_endpoint(
    ctx: &ExtractionContext,
    owner: &TypeHandle,
    method: &MethodHandle,
    verb: HttpMethod,
) -> Endpoint {
    let path = rs_annotation(&method.annotations, "Path")
        .and_then(|a| a.string_value("value"))
        .map(method_path)
        .unwrap_or_default();

    let mut parameters = Vec::new();
    let mut request_body = None;
    for (position, param) in method.parameters.iter().enumerate() {
        let type_name = param.type_ref.to_string();
        let (kind, name) = match ParamDecorator::from_annotations(&param.annotations) {
            ParamDecorator::Path(name) => (BindingKind::Path, name),
            ParamDecorator::Header(name) => (BindingKind::Header, name),
            ParamDecorator::Query(name) => (BindingKind::Query, name),
            ParamDecorator::Injected => continue,
            ParamDecorator::Unbound => {
                let name = param
                    .name
                    .clone()
                    .unwrap_or_else(|| ordinal_name(position).to_string());
                (BindingKind::Body, name)
            }
        };
        if kind == BindingKind::Body && request_body.is_none() {
            request_body = Some(RequestBody {
                name: name.clone(),
                type_name: type_name.clone(),
            });
        }
        parameters.push(Parameter {
            kind,
            name,
            type_name,
        });
    }

    let (default_code, default_text) = default_status();
    let fact = ctx.facts.response(&owner.name, &method.name);
    let return_info = ReturnInfo {
        type_name: fact
            .and_then(|f| f.type_name.clone())
            .unwrap_or_else(|| method.return_type.to_string()),
        annotated_type: annotation_named(&method.annotations, "DocReturnType")
            .and_then(|a| a.string_value("key"))
            .map(str::to_string),
        status_code: fact.map_or(default_code, |f| f.status_code),
        status_text: fact.map_or_else(|| default_text.to_string(), |f| f.status_text.clone()),
    };

    Endpoint {
        method_name: method.name.clone(),
        http_method: verb,
        path,
        produces: media_types(&method.annotations, &owner.annotations, "Produces"),
        consumes: media_types(&method.annotations, &owner.annotations, "Consumes"),
        parameters,
        return_info,
        doc: ctx
            .facts
            .doc_comment(&owner.name, &method.name)
            .map(str::to_string),
        deprecated: method
            .annotations
            .iter()
            .any(|a| a.type_name == "java.lang.Deprecated"),
        request_body,
    }
}
