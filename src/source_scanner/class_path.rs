use super::context::{skip_annotations, skip_balanced, type_declaration, FileContext};
use super::lexer::Token;
use super::{Line, LineScanner, PathInfo, PathSegment, SourceFacts};
use log::debug;

/// A `@Path` argument segment as written, before its owner is known.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawSegment {
    Literal(String),
    Constant {
        qualifier: Option<String>,
        name: String,
    },
}

/// Records, for every type declaration, the `@Path` fragment written on it and the
/// type it inherits its path prefix from.
#[derive(Debug, Default)]
pub struct ClassPathInheritanceScanner {
    pending: Option<Vec<RawSegment>>,
}

/// Parse the argument list of `@Path(...)`: a literal or a `+`-concatenation of
/// literals and constant references, optionally written as `value = ...`.
fn path_argument(tokens: &[Token]) -> Option<Vec<RawSegment>> {
    let at = tokens.iter().position(|t| match t {
        Token::Annotation(name) => name == "Path" || name.ends_with(".Path"),
        _ => false,
    })?;
    if !tokens.get(at + 1)?.is_punct('(') {
        return None;
    }
    let close = skip_balanced(tokens, at + 1, '(', ')');
    let mut args = &tokens[at + 2..close.saturating_sub(1).max(at + 2)];

    if let [Token::Word(key), Token::Punct('='), rest @ ..] = args {
        if key == "value" {
            args = rest;
        }
    }

    let mut segments = Vec::new();
    for (i, token) in args.iter().enumerate() {
        let expect_operand = i % 2 == 0;
        match (expect_operand, token) {
            (true, Token::Str(literal)) => segments.push(RawSegment::Literal(literal.clone())),
            (true, Token::Word(reference)) => {
                let segment = match reference.rsplit_once('.') {
                    Some((qualifier, name)) => RawSegment::Constant {
                        qualifier: Some(qualifier.to_string()),
                        name: name.to_string(),
                    },
                    None => RawSegment::Constant {
                        qualifier: None,
                        name: reference.clone(),
                    },
                };
                segments.push(segment);
            }
            (false, Token::Punct('+')) => {}
            _ => return None,
        }
    }
    Some(segments)
}

/// Candidate owners of a constant reference, in lookup order.
fn constant_owners(
    qualifier: Option<&str>,
    name: &str,
    declared: &str,
    ctx: &FileContext,
) -> Vec<String> {
    if let Some(qualifier) = qualifier {
        return vec![ctx.qualify(qualifier)];
    }

    let mut owners = Vec::new();
    if let Some(owner) = ctx.static_import_owner(name) {
        owners.push(owner.to_string());
    }
    owners.push(declared.to_string());
    owners.extend(ctx.enclosing_types().map(str::to_string));
    owners.extend(ctx.static_wildcards().iter().cloned());
    owners
}

impl LineScanner for ClassPathInheritanceScanner {
    fn scan_line(&mut self, line: &Line<'_>, ctx: &FileContext, facts: &mut SourceFacts) {
        if let Some(segments) = path_argument(line.tokens) {
            self.pending = Some(segments);
        }

        if let Some(decl) = type_declaration(line.tokens) {
            let name = ctx.binary_name_for(&decl.simple_name);
            let segments = self
                .pending
                .take()
                .unwrap_or_default()
                .into_iter()
                .map(|raw| match raw {
                    RawSegment::Literal(literal) => PathSegment::Literal(literal),
                    RawSegment::Constant { qualifier, name: constant } => PathSegment::Constant {
                        owners: constant_owners(qualifier.as_deref(), &constant, &name, ctx),
                        name: constant,
                    },
                })
                .collect();
            let parent = match &decl.extends {
                Some(extends) => Some(ctx.qualify(extends)),
                None => ctx.current_type().map(str::to_string),
            };

            debug!("Path info for {}: parent {:?}", name, parent);
            facts
                .class_paths
                .insert(name, PathInfo { segments, parent });
            return;
        }

        // Any member line consumes a pending method-level @Path.
        if skip_annotations(line.tokens, 0) < line.tokens.len() {
            self.pending = None;
        }
    }
}
