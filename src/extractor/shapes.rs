//! Payload-shape discovery.
//!
//! Breadth-first over every type reachable from an endpoint's contract. The shape
//! map doubles as the visited set: a type is described at most once, which is what
//! makes cyclic object graphs terminate.

use super::ExtractionContext;
use crate::catalog::{annotation_named, MethodHandle, TypeCatalog};
use crate::classfile::descriptor::{is_core_type, TypeRef};
use crate::model::{BindingKind, DataShape, Field};
use log::{debug, warn};
use std::collections::VecDeque;

/// Whether a type name refers to a type of the analyzed code base.
pub fn is_domain_type(name: &str) -> bool {
    !name.is_empty() && !is_core_type(name)
}

/// All class names mentioned by a model type-name string.
fn referenced_names(type_name: &str) -> Vec<String> {
    match type_name.parse::<TypeRef>() {
        Ok(type_ref) => type_ref.referenced_names(),
        Err(_) => vec![type_name.to_string()],
    }
}

/// Describe every type reachable from the registered endpoints.
pub fn resolve_shapes(ctx: &mut ExtractionContext) {
    let mut queue: VecDeque<String> = VecDeque::new();
    for resource in ctx.resources.values() {
        for endpoint in &resource.endpoints {
            queue.extend(referenced_names(&endpoint.return_info.type_name));
            if let Some(annotated) = &endpoint.return_info.annotated_type {
                queue.extend(referenced_names(annotated));
            }
            if let Some(body) = &endpoint.request_body {
                queue.extend(referenced_names(&body.type_name));
            }
            // Unbound parameters past the first are payloads too
            for parameter in &endpoint.parameters {
                if parameter.kind == BindingKind::Body {
                    queue.extend(referenced_names(&parameter.type_name));
                }
            }
        }
    }

    while let Some(name) = queue.pop_front() {
        if !is_domain_type(&name) || ctx.data_shapes.contains_key(&name) {
            continue;
        }
        let (shape, references) = describe_type(ctx, &name);
        ctx.data_shapes.insert(name, shape);
        queue.extend(references);
    }

    debug!("Registered {} data shape(s)", ctx.data_shapes.len());
}

/// Describe one type, returning its shape and the type names its fields reference.
fn describe_type(ctx: &mut ExtractionContext, name: &str) -> (DataShape, Vec<String>) {
    let handle = match ctx.catalog.load_type(name) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Cannot describe {}: {}", name, e);
            return (DataShape::error(e), Vec::new());
        }
    };

    if handle.is_enum() {
        let values = ctx
            .enum_values
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| TypeCatalog::enum_constants(&handle).join(", "));
        return (DataShape::enumeration(&values), Vec::new());
    }

    let methods = match ctx.catalog.public_methods(name) {
        Ok(methods) => methods,
        Err(e) => {
            warn!("Cannot describe {}: {}", name, e);
            return (DataShape::error(e), Vec::new());
        }
    };

    let mut fields = Vec::new();
    let mut references = Vec::new();
    for method in methods.iter().filter(|m| is_getter(m)) {
        let Some(field_name) = property_name(&method.name) else {
            continue;
        };

        let list_override = annotation_named(&method.annotations, "DocListType")
            .and_then(|a| a.string_value("key"))
            .map(str::to_string);
        let element_type = list_override
            .clone()
            .or_else(|| method.return_type.element_type().map(|e| e.to_string()));

        references.extend(method.return_type.referenced_names());
        if let Some(list_type) = list_override {
            references.extend(referenced_names(&list_type));
        }

        fields.push(Field {
            name: field_name,
            type_name: method.return_type.erasure(),
            element_type,
        });
    }

    (DataShape::with_fields(fields), references)
}

fn is_getter(method: &MethodHandle) -> bool {
    method.parameters.is_empty()
        && !method.return_type.is_void()
        && method.name != "getClass"
        && method.return_type.name != "java.lang.Class"
}

/// `getFirstName` -> `firstName`, `isActive` -> `active`.
fn property_name(method_name: &str) -> Option<String> {
    let suffix = method_name
        .strip_prefix("get")
        .or_else(|| method_name.strip_prefix("is"))?;
    let mut chars = suffix.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(first.to_lowercase().chain(chars).collect())
}
