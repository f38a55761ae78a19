use super::context::{FileContext, TypeKind};
use super::lexer::Token;
use super::{Line, LineScanner, SourceFacts};
use log::debug;

const FIELD_MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "transient",
    "volatile",
];

/// Records `static final String NAME = "literal";` constants of the enclosing type.
/// Interface fields are implicitly static and final, so any string field with a
/// literal initializer counts there.
#[derive(Debug, Default)]
pub struct ConstantScanner;

fn string_constant(tokens: &[Token], implicit_static_final: bool) -> Option<(&str, &str)> {
    let modifiers: Vec<&str> = tokens
        .iter()
        .map_while(|t| t.word().filter(|w| FIELD_MODIFIERS.contains(w)))
        .collect();
    if modifiers.contains(&"private") {
        return None;
    }
    if !implicit_static_final && !(modifiers.contains(&"static") && modifiers.contains(&"final"))
    {
        return None;
    }

    match &tokens[modifiers.len()..] {
        [Token::Word(ty), Token::Word(name), Token::Punct('='), Token::Str(value), Token::Punct(';'), ..]
            if ty == "String" || ty == "java.lang.String" =>
        {
            Some((name.as_str(), value.as_str()))
        }
        _ => None,
    }
}

impl LineScanner for ConstantScanner {
    fn scan_line(&mut self, line: &Line<'_>, ctx: &FileContext, facts: &mut SourceFacts) {
        let Some(owner) = ctx.current_type() else {
            return;
        };
        let in_interface = matches!(
            ctx.current_kind(),
            Some(TypeKind::Interface) | Some(TypeKind::Annotation)
        );

        if let Some((name, value)) = string_constant(line.tokens, in_interface) {
            debug!("Constant {}.{} = {:?}", owner, name, value);
            facts
                .constants
                .insert((owner.to_string(), name.to_string()), value.to_string());
        }
    }
}
