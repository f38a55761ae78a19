//! Per-file context: package, imports and the stack of enclosing type declarations.

use super::lexer::Token;
use crate::classfile::descriptor::{is_primitive, TypeRef};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `java.lang` types that are visible without an import.
const JAVA_LANG: &[&str] = &[
    "Boolean",
    "Byte",
    "Character",
    "Class",
    "Double",
    "Enum",
    "Exception",
    "Float",
    "Integer",
    "Iterable",
    "Long",
    "Number",
    "Object",
    "Record",
    "RuntimeException",
    "Short",
    "String",
    "StringBuilder",
    "Throwable",
    "Void",
];

pub const VISIBILITY: &[&str] = &["public", "protected", "private"];

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "sealed",
    "strictfp",
    "synchronized",
    "native",
    "default",
    "transient",
    "volatile",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

/// A type declaration found on a line: `public class Foo<T> extends Bar {`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub kind: TypeKind,
    pub simple_name: String,
    /// Modifier words written before the keyword
    pub modifiers: Vec<String>,
    /// The (unqualified, as written) `extends` type
    pub extends: Option<String>,
    keyword_index: usize,
}

impl TypeDeclaration {
    pub fn has_visibility(&self) -> bool {
        self.modifiers
            .iter()
            .any(|m| VISIBILITY.contains(&m.as_str()))
    }
}

/// A visibility-qualified method (or constructor) signature line.
#[derive(Debug)]
pub struct MethodSignature<'t> {
    pub name: String,
    /// Tokens of the return type; empty for constructors
    pub return_type: &'t [Token],
}

#[derive(Debug)]
struct TypeFrame {
    name: String,
    kind: TypeKind,
    depth: usize,
    opened: bool,
}

/// Lexical context of the file being scanned, advanced line by line.
#[derive(Debug)]
pub struct FileContext {
    path: PathBuf,
    package: Option<String>,
    imports: HashMap<String, String>,
    /// Statically imported member name -> owning type
    static_imports: HashMap<String, String>,
    static_wildcards: Vec<String>,
    /// Types declared in this file, simple name -> binary name
    declared: HashMap<String, String>,
    frames: Vec<TypeFrame>,
    depth: usize,
}

impl FileContext {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            package: None,
            imports: HashMap::new(),
            static_imports: HashMap::new(),
            static_wildcards: Vec::new(),
            declared: HashMap::new(),
            frames: Vec::new(),
            depth: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Binary name of the innermost type whose body is open.
    pub fn current_type(&self) -> Option<&str> {
        self.open_frames().next().map(|f| f.name.as_str())
    }

    pub fn current_kind(&self) -> Option<TypeKind> {
        self.open_frames().next().map(|f| f.kind)
    }

    /// Binary names of the enclosing types, innermost first.
    pub fn enclosing_types(&self) -> impl Iterator<Item = &str> {
        self.open_frames().map(|f| f.name.as_str())
    }

    fn open_frames(&self) -> impl Iterator<Item = &TypeFrame> {
        self.frames.iter().rev().filter(|f| f.opened)
    }

    /// Binary name a type declared here with `simple_name` gets.
    pub fn binary_name_for(&self, simple_name: &str) -> String {
        match (self.current_type(), &self.package) {
            (Some(outer), _) => format!("{}${}", outer, simple_name),
            (None, Some(package)) => format!("{}.{}", package, simple_name),
            (None, None) => simple_name.to_string(),
        }
    }

    pub fn static_import_owner(&self, member: &str) -> Option<&str> {
        self.static_imports.get(member).map(String::as_str)
    }

    pub fn static_wildcards(&self) -> &[String] {
        &self.static_wildcards
    }

    /// Resolve a type name as written in this file to a binary name.
    ///
    /// Lookup order: explicit imports, types declared in this file, `java.lang`, then
    /// the file's own package. Dotted names starting with a type (`Outer.Inner`) become
    /// nested binary names; dotted names starting with a package are kept, with any
    /// segments after the first type segment joined by `$`.
    pub fn qualify(&self, name: &str) -> String {
        if is_primitive(name) {
            return name.to_string();
        }

        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() == 1 {
            return self.qualify_simple(name);
        }

        if starts_uppercase(segments[0]) {
            let mut out = self.qualify_simple(segments[0]);
            for segment in &segments[1..] {
                out.push('$');
                out.push_str(segment);
            }
            return out;
        }

        match segments.iter().position(|s| starts_uppercase(s)) {
            Some(first_type) => {
                let mut out = segments[..=first_type].join(".");
                for segment in &segments[first_type + 1..] {
                    out.push('$');
                    out.push_str(segment);
                }
                out
            }
            None => name.to_string(),
        }
    }

    fn qualify_simple(&self, simple: &str) -> String {
        if let Some(imported) = self.imports.get(simple) {
            return imported.clone();
        }
        if let Some(declared) = self.declared.get(simple) {
            return declared.clone();
        }
        if JAVA_LANG.contains(&simple) {
            return format!("java.lang.{}", simple);
        }
        match &self.package {
            Some(package) => format!("{}.{}", package, simple),
            None => simple.to_string(),
        }
    }

    /// Qualify a type expression (`List<User>`, `Foo[]`) into the display form used
    /// for type names throughout the model. `None` when the tokens are not a type.
    pub fn qualify_type(&self, tokens: &[Token]) -> Option<String> {
        if tokens.is_empty() {
            return None;
        }
        let mut text = String::new();
        for token in tokens {
            match token {
                Token::Word(w) if w == "extends" || w == "super" => {
                    text.push(' ');
                    text.push_str(w);
                    text.push(' ');
                }
                Token::Word(w) => text.push_str(&self.qualify(w)),
                Token::Punct(c) if "<>,[]?".contains(*c) => text.push(*c),
                _ => return None,
            }
        }
        text.parse::<TypeRef>().ok().map(|t| t.to_string())
    }

    /// Consume a line: package and import statements, type declarations and braces.
    pub fn advance(&mut self, tokens: &[Token]) {
        if let Some(first) = tokens.first() {
            if first.is_word("package") {
                if let Some(package) = tokens.get(1).and_then(Token::word) {
                    self.package = Some(package.to_string());
                }
                return;
            }
            if first.is_word("import") {
                self.add_import(&tokens[1..]);
                return;
            }
        }

        let declaration = type_declaration(tokens);
        for (i, token) in tokens.iter().enumerate() {
            if let Some(decl) = &declaration {
                if i == decl.keyword_index {
                    let name = self.binary_name_for(&decl.simple_name);
                    self.declared.insert(decl.simple_name.clone(), name.clone());
                    self.frames.push(TypeFrame {
                        name,
                        kind: decl.kind,
                        depth: 0,
                        opened: false,
                    });
                }
            }

            match token {
                Token::Punct('{') => {
                    self.depth += 1;
                    if let Some(top) = self.frames.last_mut() {
                        if !top.opened {
                            top.opened = true;
                            top.depth = self.depth;
                        }
                    }
                }
                Token::Punct('}') => {
                    if matches!(self.frames.last(), Some(top) if top.opened && top.depth == self.depth)
                    {
                        self.frames.pop();
                    }
                    self.depth = self.depth.saturating_sub(1);
                }
                _ => {}
            }
        }
    }

    fn add_import(&mut self, tokens: &[Token]) {
        let is_static = tokens.first().map_or(false, |t| t.is_word("static"));
        let rest = if is_static { &tokens[1..] } else { tokens };
        let Some(path) = rest.first().and_then(Token::word) else {
            return;
        };
        let wildcard = rest.get(1).map_or(false, |t| t.is_punct('.'))
            && rest.get(2).map_or(false, |t| t.is_punct('*'));

        match (is_static, wildcard) {
            (true, true) => self.static_wildcards.push(self.qualify(path)),
            (true, false) => {
                if let Some((owner, member)) = path.rsplit_once('.') {
                    let owner = self.qualify(owner);
                    self.static_imports.insert(member.to_string(), owner);
                }
            }
            // Package wildcards cannot be resolved without an index of the package
            (false, true) => {}
            (false, false) => {
                if let Some((_, simple)) = path.rsplit_once('.') {
                    let binary = self.qualify(path);
                    self.imports.insert(simple.to_string(), binary);
                }
            }
        }
    }
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().map_or(false, char::is_uppercase)
}

/// Index just past the annotations (and their parenthesized arguments) starting at
/// `start`.
pub fn skip_annotations(tokens: &[Token], start: usize) -> usize {
    let mut i = start;
    while matches!(tokens.get(i), Some(Token::Annotation(name)) if name != "interface") {
        i += 1;
        if tokens.get(i).map_or(false, |t| t.is_punct('(')) {
            i = skip_balanced(tokens, i, '(', ')');
        }
    }
    i
}

/// Index just past the group opened at `open_index`, or the end of the line.
pub fn skip_balanced(tokens: &[Token], open_index: usize, open: char, close: char) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open_index) {
        if token.is_punct(open) {
            depth += 1;
        } else if token.is_punct(close) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i + 1;
            }
        }
    }
    tokens.len()
}

/// Find a type declaration (`class`, `interface`, `enum`, `record`, `@interface`).
pub fn type_declaration(tokens: &[Token]) -> Option<TypeDeclaration> {
    for (i, token) in tokens.iter().enumerate() {
        let kind = match token {
            Token::Word(w) => match w.as_str() {
                "class" => TypeKind::Class,
                "interface" => TypeKind::Interface,
                "enum" => TypeKind::Enum,
                "record" => TypeKind::Record,
                _ => continue,
            },
            Token::Annotation(a) if a == "interface" => TypeKind::Annotation,
            _ => continue,
        };
        if i > 0 && tokens[i - 1].is_punct('.') {
            continue;
        }
        let Some(name) = tokens.get(i + 1).and_then(Token::word) else {
            continue;
        };
        if name.contains('.') || MODIFIERS.contains(&name) {
            continue;
        }

        let modifiers = tokens[..i]
            .iter()
            .filter_map(Token::word)
            .filter(|w| MODIFIERS.contains(w))
            .map(str::to_string)
            .collect();

        let mut j = i + 2;
        if tokens.get(j).map_or(false, |t| t.is_punct('<')) {
            j = skip_balanced(tokens, j, '<', '>');
        }
        let extends = if tokens.get(j).map_or(false, |t| t.is_word("extends")) {
            tokens.get(j + 1).and_then(Token::word).map(str::to_string)
        } else {
            None
        };

        return Some(TypeDeclaration {
            kind,
            simple_name: name.to_string(),
            modifiers,
            extends,
            keyword_index: i,
        });
    }
    None
}

/// Recognize a visibility-qualified method or constructor signature, e.g.
/// `@GET public List<User> list(@QueryParam("q") String q) {`.
pub fn method_signature(tokens: &[Token]) -> Option<MethodSignature<'_>> {
    let start = skip_annotations(tokens, 0);
    let visibility = tokens.get(start)?.word()?;
    if !VISIBILITY.contains(&visibility) {
        return None;
    }

    let paren = tokens.iter().position(|t| t.is_punct('('))?;
    if paren <= start + 1 || tokens[start..paren].iter().any(|t| t.is_punct('=')) {
        return None;
    }
    if type_declaration(tokens).is_some() {
        return None;
    }

    let name = tokens[paren - 1].word()?;
    if name.contains('.') {
        return None;
    }

    let mut i = start + 1;
    loop {
        match tokens.get(i) {
            Some(Token::Word(w)) if MODIFIERS.contains(&w.as_str()) => i += 1,
            Some(Token::Annotation(_)) => i = skip_annotations(tokens, i),
            Some(t) if t.is_punct('<') => i = skip_balanced(tokens, i, '<', '>'),
            _ => break,
        }
    }
    if i > paren - 1 {
        return None;
    }

    Some(MethodSignature {
        name: name.to_string(),
        return_type: &tokens[i..paren - 1],
    })
}

/// Whether the line (after leading annotations) starts with a visibility modifier.
pub fn is_visibility_line(tokens: &[Token]) -> bool {
    let start = skip_annotations(tokens, 0);
    tokens
        .get(start)
        .and_then(Token::word)
        .map_or(false, |w| VISIBILITY.contains(&w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_scanner::lexer::Lexer;
    use pretty_assertions::assert_eq;

    fn feed(ctx: &mut FileContext, lines: &[&str]) {
        let mut lexer = Lexer::new();
        for line in lines {
            ctx.advance(&lexer.tokenize(line));
        }
    }

    fn tokens(line: &str) -> Vec<Token> {
        Lexer::new().tokenize(line)
    }

    #[test]
    fn test_qualify_through_imports_and_package() {
        let mut ctx = FileContext::new(Path::new("UserResource.java"));
        feed(
            &mut ctx,
            &[
                "package com.acme.api;",
                "import com.acme.model.User;",
                "import java.util.List;",
                "import static com.acme.Paths.USERS;",
                "import static com.acme.Constants.*;",
            ],
        );

        assert_eq!(ctx.qualify("User"), "com.acme.model.User");
        assert_eq!(ctx.qualify("String"), "java.lang.String");
        assert_eq!(ctx.qualify("Order"), "com.acme.api.Order");
        assert_eq!(ctx.qualify("int"), "int");
        assert_eq!(ctx.qualify("User.Address"), "com.acme.model.User$Address");
        assert_eq!(ctx.qualify("com.acme.Outer.Inner"), "com.acme.Outer$Inner");
        assert_eq!(ctx.static_import_owner("USERS"), Some("com.acme.Paths"));
        assert_eq!(ctx.static_wildcards(), &["com.acme.Constants".to_string()]);
    }

    #[test]
    fn test_qualify_type_expression() {
        let mut ctx = FileContext::new(Path::new("A.java"));
        feed(
            &mut ctx,
            &["package com.acme;", "import java.util.List;", "import java.util.Map;"],
        );

        assert_eq!(
            ctx.qualify_type(&tokens("Map<String, List<User>>")).as_deref(),
            Some("java.util.Map<java.lang.String, java.util.List<com.acme.User>>")
        );
        assert_eq!(
            ctx.qualify_type(&tokens("User[]")).as_deref(),
            Some("com.acme.User[]")
        );
        assert_eq!(ctx.qualify_type(&tokens("new User()")), None);
    }

    #[test]
    fn test_type_stack_tracks_nesting() {
        let mut ctx = FileContext::new(Path::new("Outer.java"));
        feed(
            &mut ctx,
            &[
                "package com.acme;",
                "public class Outer",
                "{",
                "    public static class Inner {",
                "        void run() { if (x) { } }",
            ],
        );
        assert_eq!(ctx.current_type(), Some("com.acme.Outer$Inner"));
        assert_eq!(
            ctx.enclosing_types().collect::<Vec<_>>(),
            vec!["com.acme.Outer$Inner", "com.acme.Outer"]
        );
        assert_eq!(ctx.qualify("Inner"), "com.acme.Outer$Inner");

        feed(&mut ctx, &["    }", "    public enum Kind { A, B }"]);
        assert_eq!(ctx.current_type(), Some("com.acme.Outer"));

        feed(&mut ctx, &["}"]);
        assert_eq!(ctx.current_type(), None);
    }

    #[test]
    fn test_type_declaration() {
        let decl = type_declaration(&tokens(
            "@Path(\"/x\") public class UserResource<T extends Base> extends BaseResource<T> {",
        ))
        .unwrap();

        assert_eq!(decl.kind, TypeKind::Class);
        assert_eq!(decl.simple_name, "UserResource");
        assert_eq!(decl.extends.as_deref(), Some("BaseResource"));
        assert!(decl.has_visibility());

        assert!(type_declaration(&tokens("Class<?> c = User.class;")).is_none());
        assert_eq!(
            type_declaration(&tokens("public @interface DocReturnType {"))
                .unwrap()
                .kind,
            TypeKind::Annotation
        );
    }

    #[test]
    fn test_method_signature() {
        let line = tokens("@GET public static <T> List<User> list(@QueryParam(\"q\") String q) {");
        let sig = method_signature(&line).unwrap();
        assert_eq!(sig.name, "list");
        assert_eq!(
            sig.return_type,
            &[
                Token::Word("List".into()),
                Token::Punct('<'),
                Token::Word("User".into()),
                Token::Punct('>'),
            ]
        );

        assert!(method_signature(&tokens("private Foo foo = build();")).is_none());
        assert!(method_signature(&tokens("void helper() {")).is_none());
        assert!(method_signature(&tokens("public class Foo {")).is_none());

        let ctor_line = tokens("public UserResource(Service s) {");
        let ctor = method_signature(&ctor_line).unwrap();
        assert_eq!(ctor.name, "UserResource");
        assert!(ctor.return_type.is_empty());
    }
}
