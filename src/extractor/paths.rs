//! Root-path finalization.
//!
//! Runs after both walks, since a resource's path can depend on constants and parent
//! types discovered by either of them.

use super::ExtractionContext;
use crate::catalog::rs_annotation;
use crate::classfile::descriptor::is_core_type;
use crate::model::{BindingKind, Parameter, Resource};
use log::debug;
use std::collections::HashSet;

/// Type of synthesized path parameters.
const PLACEHOLDER_TYPE: &str = "java.lang.String";

/// Resolve every resource's root path and propagate its placeholders to the endpoints.
pub fn finalize_paths(ctx: &mut ExtractionContext) {
    let names: Vec<String> = ctx.resources.keys().cloned().collect();
    for name in names {
        let chain = parent_chain(ctx, &name);
        let fragments: Vec<String> = chain.iter().map(|t| fragment(ctx, t)).collect();
        let root_path = join_path(fragments.iter().map(String::as_str));
        debug!("Root path of {}: {:?} via {:?}", name, root_path, chain);

        if let Some(resource) = ctx.resources.get_mut(&name) {
            resource.root_path = root_path;
            add_path_parameters(resource);
        }
    }
}

/// The type and its ancestors, root-first. Stops at a missing parent or a loop.
fn parent_chain(ctx: &mut ExtractionContext, name: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(name.to_string());

    while let Some(type_name) = current.take() {
        if !visited.insert(type_name.clone()) {
            break;
        }
        current = parent_of(ctx, &type_name);
        chain.push(type_name);
    }

    chain.reverse();
    chain
}

/// Parent as recorded from source; without a source file, the compiled super class.
fn parent_of(ctx: &mut ExtractionContext, type_name: &str) -> Option<String> {
    if let Some(info) = ctx.facts.class_paths.get(type_name) {
        return info.parent.clone();
    }
    ctx.catalog
        .load_type(type_name)
        .ok()
        .and_then(|handle| handle.super_class.clone())
        .filter(|s| !is_core_type(s))
}

/// A type's own path fragment: the source expression with its constants resolved,
/// falling back to the compiled `@Path` value.
fn fragment(ctx: &mut ExtractionContext, type_name: &str) -> String {
    let textual = ctx
        .facts
        .class_paths
        .get(type_name)
        .filter(|info| !info.segments.is_empty())
        .and_then(|info| ctx.facts.resolve_segments(&info.segments));
    if let Some(value) = textual {
        return value;
    }

    if let Some(resource) = ctx.resources.get(type_name) {
        return resource.class_path.clone();
    }
    ctx.catalog
        .load_type(type_name)
        .ok()
        .and_then(|handle| {
            rs_annotation(&handle.annotations, "Path")
                .and_then(|a| a.string_value("value"))
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// Concatenate path fragments: duplicate and trailing slashes collapse and the result
/// has exactly one leading slash. No non-empty segment at all gives `""`.
pub fn join_path<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    let segments: Vec<&str> = fragments
        .into_iter()
        .flat_map(|f| f.split('/'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return String::new();
    }
    format!("/{}", segments.join("/"))
}

/// Names of the `{name}` / `{name: regex}` placeholders in a path, in order.
pub fn placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = path.char_indices();

    while let Some((start, c)) = chars.next() {
        if c != '{' {
            continue;
        }
        let mut depth = 1;
        let mut end = None;
        for (i, c) in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(end) = end else {
            break;
        };

        let inner = &path[start + 1..end];
        let name = inner.split(':').next().unwrap_or(inner).trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Prepend the root path's placeholders as path parameters to every endpoint that does
/// not already bind them.
fn add_path_parameters(resource: &mut Resource) {
    let names = placeholders(&resource.root_path);
    if names.is_empty() {
        return;
    }

    for endpoint in &mut resource.endpoints {
        let mut synthesized: Vec<Parameter> = names
            .iter()
            .filter(|name| {
                !endpoint
                    .parameters
                    .iter()
                    .any(|p| p.kind == BindingKind::Path && &p.name == *name)
            })
            .map(|name| Parameter {
                kind: BindingKind::Path,
                name: name.clone(),
                type_name: PLACEHOLDER_TYPE.to_string(),
            })
            .collect();
        synthesized.append(&mut endpoint.parameters);
        endpoint.parameters = synthesized;
    }
}
