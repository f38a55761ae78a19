use super::context::{method_signature, skip_balanced, type_declaration, FileContext};
use super::lexer::Token;
use super::{Line, LineScanner, ResponseFact, SourceFacts};
use log::debug;
use std::collections::HashMap;

const ROUTE_DECORATORS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "Path",
];

/// `Response.<builder>(...)` factory methods and the status they imply.
const BUILDERS: &[(&str, u16, &str)] = &[
    ("ok", 200, "OK"),
    ("created", 201, "CREATED"),
    ("accepted", 202, "ACCEPTED"),
    ("noContent", 204, "NO_CONTENT"),
    ("seeOther", 303, "SEE_OTHER"),
    ("notModified", 304, "NOT_MODIFIED"),
    ("temporaryRedirect", 307, "TEMPORARY_REDIRECT"),
    ("notAcceptable", 406, "NOT_ACCEPTABLE"),
    ("serverError", 500, "INTERNAL_SERVER_ERROR"),
];

/// `Response.Status` constants.
const STATUSES: &[(&str, u16)] = &[
    ("OK", 200),
    ("CREATED", 201),
    ("ACCEPTED", 202),
    ("NO_CONTENT", 204),
    ("RESET_CONTENT", 205),
    ("PARTIAL_CONTENT", 206),
    ("MOVED_PERMANENTLY", 301),
    ("FOUND", 302),
    ("SEE_OTHER", 303),
    ("NOT_MODIFIED", 304),
    ("USE_PROXY", 305),
    ("TEMPORARY_REDIRECT", 307),
    ("BAD_REQUEST", 400),
    ("UNAUTHORIZED", 401),
    ("PAYMENT_REQUIRED", 402),
    ("FORBIDDEN", 403),
    ("NOT_FOUND", 404),
    ("METHOD_NOT_ALLOWED", 405),
    ("NOT_ACCEPTABLE", 406),
    ("PROXY_AUTHENTICATION_REQUIRED", 407),
    ("REQUEST_TIMEOUT", 408),
    ("CONFLICT", 409),
    ("GONE", 410),
    ("LENGTH_REQUIRED", 411),
    ("PRECONDITION_FAILED", 412),
    ("REQUEST_ENTITY_TOO_LARGE", 413),
    ("REQUEST_URI_TOO_LONG", 414),
    ("UNSUPPORTED_MEDIA_TYPE", 415),
    ("REQUESTED_RANGE_NOT_SATISFIABLE", 416),
    ("EXPECTATION_FAILED", 417),
    ("PRECONDITION_REQUIRED", 428),
    ("TOO_MANY_REQUESTS", 429),
    ("REQUEST_HEADER_FIELDS_TOO_LARGE", 431),
    ("INTERNAL_SERVER_ERROR", 500),
    ("NOT_IMPLEMENTED", 501),
    ("BAD_GATEWAY", 502),
    ("SERVICE_UNAVAILABLE", 503),
    ("GATEWAY_TIMEOUT", 504),
    ("HTTP_VERSION_NOT_SUPPORTED", 505),
    ("NETWORK_AUTHENTICATION_REQUIRED", 511),
];

/// Words that can start a statement but never a local variable's type.
const STATEMENT_KEYWORDS: &[&str] = &[
    "return", "new", "throw", "if", "else", "for", "while", "do", "switch", "case", "try",
    "catch", "finally", "break", "continue", "this", "super", "assert", "yield",
];

/// Status of a routed method whose return statement was not recognized.
pub fn default_status() -> (u16, &'static str) {
    (200, "OK")
}

/// Status code of a `Response.Status` constant name.
pub fn status_code(name: &str) -> Option<u16> {
    STATUSES
        .iter()
        .find(|(status, _)| *status == name)
        .map(|(_, code)| *code)
}

#[derive(Debug, Default)]
enum State {
    #[default]
    SeekingRouteDecorator,
    SeekingMethodSignature,
    SeekingReturn {
        owner: String,
        method: String,
        locals: HashMap<String, String>,
    },
}

/// Recovers the status code and entity type of routed methods returning `Response`.
#[derive(Debug, Default)]
pub struct ResponseStatusScanner {
    state: State,
}

fn has_route_decorator(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| match t {
        Token::Annotation(name) => {
            let simple = name.rsplit('.').next().unwrap_or(name);
            ROUTE_DECORATORS.contains(&simple)
        }
        _ => false,
    })
}

fn returns_response(return_type: &[Token]) -> bool {
    matches!(return_type, [Token::Word(w)] if w == "Response" || w.ends_with(".Response"))
}

/// `Type name = ...;` or `Type<Args>[] name = ...;`, excluding `==` comparisons.
fn local_declaration(tokens: &[Token]) -> Option<(&[Token], &str)> {
    let mut start = 0;
    while tokens.get(start).map_or(false, |t| t.is_word("final")) {
        start += 1;
    }
    let first = tokens.get(start)?.word()?;
    // `var` locals carry no declared type to report
    if first == "var" || STATEMENT_KEYWORDS.contains(&first) {
        return None;
    }

    let mut i = start + 1;
    if tokens.get(i).map_or(false, |t| t.is_punct('<')) {
        i = skip_balanced(tokens, i, '<', '>');
    }
    while tokens.get(i).map_or(false, |t| t.is_punct('['))
        && tokens.get(i + 1).map_or(false, |t| t.is_punct(']'))
    {
        i += 2;
    }

    let name = tokens.get(i)?.word()?;
    if name.contains('.') || !tokens.get(i + 1)?.is_punct('=') {
        return None;
    }
    if tokens.get(i + 2).map_or(false, |t| t.is_punct('=')) {
        return None;
    }
    Some((&tokens[start..i], name))
}

/// Find `return ...Response.<call>(<args>)` and split out the call name and the
/// argument tokens.
fn response_call(tokens: &[Token]) -> Option<(&str, &[Token])> {
    let return_at = tokens.iter().position(|t| t.is_word("return"))?;
    for (i, token) in tokens.iter().enumerate().skip(return_at + 1) {
        let Some(word) = token.word() else {
            continue;
        };
        let Some((receiver, call)) = word.rsplit_once('.') else {
            continue;
        };
        if receiver != "Response" && !receiver.ends_with(".Response") {
            continue;
        }
        if !tokens.get(i + 1).map_or(false, |t| t.is_punct('(')) {
            continue;
        }
        let close = skip_balanced(tokens, i + 1, '(', ')');
        let args_end = close.saturating_sub(1).max(i + 2);
        return Some((call, &tokens[i + 2..args_end]));
    }
    None
}

fn resolve(call: &str, args: &[Token], locals: &HashMap<String, String>) -> ResponseFact {
    if call == "ok" {
        if let [Token::Word(local)] = args {
            if let Some(type_name) = locals.get(local) {
                return ResponseFact {
                    type_name: Some(type_name.clone()),
                    status_code: 200,
                    status_text: "OK".to_string(),
                };
            }
        }
    }

    if call == "status" {
        if let [Token::Word(constant)] = args {
            let name = constant.rsplit('.').next().unwrap_or(constant);
            if let Some(code) = status_code(name) {
                return ResponseFact {
                    type_name: None,
                    status_code: code,
                    status_text: name.to_string(),
                };
            }
        }
    }

    if let Some((_, code, text)) = BUILDERS.iter().find(|(builder, _, _)| *builder == call) {
        return ResponseFact {
            type_name: None,
            status_code: *code,
            status_text: text.to_string(),
        };
    }

    let (code, text) = default_status();
    ResponseFact {
        type_name: None,
        status_code: code,
        status_text: text.to_string(),
    }
}

impl ResponseStatusScanner {
    fn seek_signature(&mut self, line: &Line<'_>, ctx: &FileContext) {
        if type_declaration(line.tokens).is_some() {
            self.state = State::SeekingRouteDecorator;
            return;
        }
        let Some(signature) = method_signature(line.tokens) else {
            self.state = State::SeekingMethodSignature;
            return;
        };
        match ctx.current_type() {
            Some(owner) if returns_response(signature.return_type) => {
                self.state = State::SeekingReturn {
                    owner: owner.to_string(),
                    method: signature.name,
                    locals: HashMap::new(),
                };
            }
            _ => self.state = State::SeekingRouteDecorator,
        }
    }
}

impl LineScanner for ResponseStatusScanner {
    fn scan_line(&mut self, line: &Line<'_>, ctx: &FileContext, facts: &mut SourceFacts) {
        match std::mem::take(&mut self.state) {
            State::SeekingRouteDecorator => {
                if has_route_decorator(line.tokens) {
                    self.seek_signature(line, ctx);
                }
            }
            State::SeekingMethodSignature => self.seek_signature(line, ctx),
            State::SeekingReturn {
                owner,
                method,
                mut locals,
            } => {
                // A new routed method or signature closes the pending one with the default.
                if has_route_decorator(line.tokens) {
                    self.seek_signature(line, ctx);
                    return;
                }
                if method_signature(line.tokens).is_some() {
                    return;
                }

                if let Some((call, args)) = response_call(line.tokens) {
                    let fact = resolve(call, args, &locals);
                    debug!(
                        "Response of {}.{}: {} {}",
                        owner, method, fact.status_code, fact.status_text
                    );
                    facts.response_types.insert((owner, method), fact);
                    return;
                }

                if let Some((type_tokens, name)) = local_declaration(line.tokens) {
                    if let Some(type_name) = ctx.qualify_type(type_tokens) {
                        locals.insert(name.to_string(), type_name);
                    }
                }
                self.state = State::SeekingReturn {
                    owner,
                    method,
                    locals,
                };
            }
        }
    }
}
