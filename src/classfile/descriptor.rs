//! Type descriptors and generic signatures.
//!
//! Compiled classes describe types in two grammars: erased descriptors
//! (`Ljava/util/List;`) and, when generics are involved, the `Signature` attribute
//! (`Ljava/util/List<Lcom/acme/User;>;`). Both parse into a [`TypeRef`], whose
//! `Display` form (`java.util.List<com.acme.User>`) is the type-name string used
//! throughout the model. `TypeRef` also parses back from that display form, so the
//! textual pass can produce type names in the same shape.

use crate::error::ClassFormatError;
use std::fmt;
use std::str::FromStr;

const OBJECT: &str = "java.lang.Object";

/// A (possibly generic, possibly array) type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Erased type name: a primitive keyword (`int`, `void`) or a binary class name
    pub name: String,
    /// Generic type arguments, empty for raw or non-generic types
    pub args: Vec<TypeRef>,
    /// Number of array dimensions (`Foo[][]` has 2)
    pub array_dims: usize,
}

impl TypeRef {
    /// Create a plain, non-generic, non-array type reference
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn is_void(&self) -> bool {
        self.array_dims == 0 && self.name == "void"
    }

    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }

    /// Whether this is a collection-like type whose first type argument is the element.
    pub fn is_collection(&self) -> bool {
        self.array_dims == 0
            && (self.name.ends_with("List")
                || self.name.ends_with("Set")
                || self.name.ends_with("Collection"))
    }

    /// The element type of an array or collection, if there is one.
    pub fn element_type(&self) -> Option<TypeRef> {
        if self.is_array() {
            let mut element = self.clone();
            element.array_dims -= 1;
            return Some(element);
        }
        if self.is_collection() {
            return self.args.first().cloned();
        }
        None
    }

    /// The erased type name including array brackets, e.g. `com.acme.User[]`.
    pub fn erasure(&self) -> String {
        let mut out = self.name.clone();
        for _ in 0..self.array_dims {
            out.push_str("[]");
        }
        out
    }

    /// Every class name mentioned by this reference: the erasure and, recursively,
    /// all type arguments. Array brackets are dropped.
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        for arg in &self.args {
            names.extend(arg.referenced_names());
        }
        names
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Whether a type name denotes a primitive keyword.
pub fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "byte" | "short" | "int" | "long" | "float" | "double" | "boolean" | "char" | "void"
    )
}

/// Whether a type name belongs to the platform (primitives and the `java.*`,
/// `javax.*` and `jakarta.*` namespaces) rather than to the analyzed code base.
pub fn is_core_type(name: &str) -> bool {
    is_primitive(name)
        || name.starts_with("java.")
        || name.starts_with("javax.")
        || name.starts_with("jakarta.")
}

/// Parse a field descriptor or field signature (`I`, `[Ljava/lang/String;`, `TT;`).
pub fn parse_field_type(input: &str) -> Result<TypeRef, ClassFormatError> {
    let mut parser = SignatureParser::new(input);
    let ty = parser.parse_type()?;
    parser.expect_end()?;
    Ok(ty)
}

/// Parse a method descriptor or method signature into (parameter types, return type).
pub fn parse_method_type(input: &str) -> Result<(Vec<TypeRef>, TypeRef), ClassFormatError> {
    let mut parser = SignatureParser::new(input);
    parser.skip_formal_type_parameters()?;
    parser.expect(b'(')?;

    let mut params = Vec::new();
    while parser.peek() != Some(b')') {
        params.push(parser.parse_type()?);
    }
    parser.expect(b')')?;
    let ret = parser.parse_type()?;

    // Anything left is a `^` throws clause, which is not part of the contract.
    Ok((params, ret))
}

struct SignatureParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self) -> ClassFormatError {
        ClassFormatError::BadDescriptor(self.input.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8, ClassFormatError> {
        let b = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, expected: u8) -> Result<(), ClassFormatError> {
        if self.next()? == expected {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn expect_end(&self) -> Result<(), ClassFormatError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Read up to (not including) the first byte in `stops`.
    fn take_until(&mut self, stops: &[u8]) -> Result<&'a str, ClassFormatError> {
        let input = self.input;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                return Ok(&input[start..self.pos]);
            }
            self.pos += 1;
        }
        Err(self.error())
    }

    fn skip_formal_type_parameters(&mut self) -> Result<(), ClassFormatError> {
        if self.peek() != Some(b'<') {
            return Ok(());
        }
        self.pos += 1;
        while self.peek() != Some(b'>') {
            self.take_until(b":")?;
            // Class bound (possibly empty) followed by any interface bounds.
            while self.peek() == Some(b':') {
                self.pos += 1;
                if matches!(self.peek(), Some(b'L') | Some(b'T') | Some(b'[')) {
                    self.parse_type()?;
                }
            }
        }
        self.expect(b'>')
    }

    fn parse_type(&mut self) -> Result<TypeRef, ClassFormatError> {
        let tag = self.next()?;
        let name = match tag {
            b'B' => "byte",
            b'C' => "char",
            b'D' => "double",
            b'F' => "float",
            b'I' => "int",
            b'J' => "long",
            b'S' => "short",
            b'Z' => "boolean",
            b'V' => "void",
            b'[' => {
                let mut element = self.parse_type()?;
                element.array_dims += 1;
                return Ok(element);
            }
            b'T' => {
                // Type variables erase to their bound; the bound is not tracked here.
                self.take_until(b";")?;
                self.expect(b';')?;
                return Ok(TypeRef::named(OBJECT));
            }
            b'L' => return self.parse_class_type(),
            _ => return Err(self.error()),
        };
        Ok(TypeRef::named(name))
    }

    fn parse_class_type(&mut self) -> Result<TypeRef, ClassFormatError> {
        let mut name = self.take_until(b"<;.")?.replace('/', ".");
        let mut args = self.parse_type_arguments()?;

        // Inner class of a parameterized outer: Outer<T>.Inner<U>
        while self.peek() == Some(b'.') {
            self.pos += 1;
            let inner = self.take_until(b"<;.")?;
            name.push('$');
            name.push_str(inner);
            args = self.parse_type_arguments()?;
        }
        self.expect(b';')?;

        Ok(TypeRef {
            name,
            args,
            array_dims: 0,
        })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeRef>, ClassFormatError> {
        let mut args = Vec::new();
        if self.peek() != Some(b'<') {
            return Ok(args);
        }
        self.pos += 1;
        while self.peek() != Some(b'>') {
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    args.push(TypeRef::named(OBJECT));
                }
                Some(b'+') | Some(b'-') => {
                    self.pos += 1;
                    args.push(self.parse_type()?);
                }
                Some(_) => args.push(self.parse_type()?),
                None => return Err(self.error()),
            }
        }
        self.expect(b'>')?;
        Ok(args)
    }
}

/// Parses the display form produced by `TypeRef`'s `Display` impl, as well as the
/// dotted type expressions found in source text (`List<com.acme.User>`, `User[]`).
impl FromStr for TypeRef {
    type Err = ClassFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = DisplayParser {
            input: s,
            chars: s.char_indices().peekable(),
        };
        let ty = parser.parse()?;
        parser.skip_ws();
        if parser.chars.peek().is_some() {
            return Err(ClassFormatError::BadDescriptor(s.to_string()));
        }
        Ok(ty)
    }
}

struct DisplayParser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> DisplayParser<'a> {
    fn error(&self) -> ClassFormatError {
        ClassFormatError::BadDescriptor(self.input.to_string())
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse(&mut self) -> Result<TypeRef, ClassFormatError> {
        let input = self.input;
        self.skip_ws();
        let start = match self.chars.peek() {
            Some(&(i, _)) => i,
            None => return Err(self.error()),
        };
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '.' || c == '_' || c == '$' || c == '?' {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let mut name = &input[start..end];
        if name.is_empty() {
            return Err(self.error());
        }

        // Wildcards: `?` alone, or `? extends X` / `? super X`.
        if name == "?" {
            self.skip_ws();
            let offset = self.chars.peek().map_or(input.len(), |&(i, _)| i);
            let rest = &input[offset..];
            if rest.starts_with("extends") || rest.starts_with("super") {
                let keyword_len = if rest.starts_with("extends") { 7 } else { 5 };
                for _ in 0..keyword_len {
                    self.chars.next();
                }
                return self.parse();
            }
            name = OBJECT;
        }

        let mut ty = TypeRef::named(name);

        self.skip_ws();
        if matches!(self.chars.peek(), Some((_, '<'))) {
            self.chars.next();
            loop {
                ty.args.push(self.parse()?);
                self.skip_ws();
                match self.chars.next() {
                    Some((_, ',')) => continue,
                    Some((_, '>')) => break,
                    _ => return Err(self.error()),
                }
            }
        }

        loop {
            self.skip_ws();
            if !matches!(self.chars.peek(), Some((_, '['))) {
                break;
            }
            self.chars.next();
            match self.chars.next() {
                Some((_, ']')) => ty.array_dims += 1,
                _ => return Err(self.error()),
            }
        }

        Ok(ty)
    }
}
