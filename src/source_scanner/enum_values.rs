use super::context::{type_declaration, FileContext, TypeKind};
use super::{Line, LineScanner, SourceFacts};
use log::debug;

/// Records where visibility-qualified enums are declared. Their values are looked up
/// through the type catalog once the source walk is complete.
#[derive(Debug, Default)]
pub struct EnumValueScanner;

impl LineScanner for EnumValueScanner {
    fn scan_line(&mut self, line: &Line<'_>, ctx: &FileContext, facts: &mut SourceFacts) {
        let Some(decl) = type_declaration(line.tokens) else {
            return;
        };
        if decl.kind != TypeKind::Enum || !decl.has_visibility() {
            return;
        }

        let name = ctx.binary_name_for(&decl.simple_name);
        debug!("Found enum {} in {}", name, ctx.path().display());
        facts
            .enum_locations
            .insert(name, ctx.path().to_path_buf());
    }
}
