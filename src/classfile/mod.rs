//! JVM class-file decoder.
//!
//! Decodes just enough of the class-file format to stand in for runtime reflection:
//! the constant pool, access flags, super class, fields, methods and the attributes
//! that carry declarative metadata (`RuntimeVisibleAnnotations`,
//! `RuntimeVisibleParameterAnnotations`, `Signature`, `MethodParameters`). Code
//! attributes and everything else are skipped by length.

pub mod descriptor;

use crate::error::ClassFormatError;

const MAGIC: u32 = 0xCAFE_BABE;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_BRIDGE: u16 = 0x0040;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ENUM: u16 = 0x4000;

/// A decoded class file with constant-pool references already resolved.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub access_flags: u16,
    /// Binary name with `.` separators, e.g. `com.acme.Outer$Inner`
    pub this_class: String,
    /// `None` only for `java.lang.Object` and module descriptors
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub annotations: Vec<Annotation>,
}

/// A field or method declaration.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    /// Generic signature, when the member mentions generic types
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    /// One list per declared parameter (methods only)
    pub parameter_annotations: Vec<Vec<Annotation>>,
    /// Compiled parameter names; empty unless compiled with `-parameters`
    pub parameter_names: Vec<Option<String>>,
}

impl MemberInfo {
    pub fn has_flag(&self, flag: u16) -> bool {
        self.access_flags & flag != 0
    }
}

/// A runtime-visible annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Binary name of the annotation type, e.g. `javax.ws.rs.Path`
    pub type_name: String,
    pub elements: Vec<(String, ElementValue)>,
}

/// An annotation element value.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Enum { type_name: String, constant: String },
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl Annotation {
    /// The annotation type's simple name (`Path` for `javax.ws.rs.Path`).
    pub fn simple_name(&self) -> &str {
        simple_name(&self.type_name)
    }

    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// A single string element, e.g. `@Path("/users")` has `value = "/users"`.
    pub fn string_value(&self, name: &str) -> Option<&str> {
        match self.element(name)? {
            ElementValue::Str(s) => Some(s),
            ElementValue::Array(values) => match values.first() {
                Some(ElementValue::Str(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// All strings of a string or string-array element, e.g. `@Produces({...})`.
    pub fn string_values(&self, name: &str) -> Vec<String> {
        match self.element(name) {
            Some(ElementValue::Str(s)) => vec![s.clone()],
            Some(ElementValue::Array(values)) => values
                .iter()
                .filter_map(|v| match v {
                    ElementValue::Str(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The last `.`- or `$`-separated segment of a binary name.
pub fn simple_name(binary_name: &str) -> &str {
    binary_name
        .rsplit(|c| c == '.' || c == '$')
        .next()
        .unwrap_or(binary_name)
}

impl ClassFile {
    /// Decode a class file from its raw bytes.
    pub fn parse(data: &[u8]) -> Result<ClassFile, ClassFormatError> {
        let mut reader = Reader { data, pos: 0 };

        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassFormatError::BadMagic(magic));
        }
        let _minor = reader.u16()?;
        let _major = reader.u16()?;

        let pool = ConstantPool::read(&mut reader)?;

        let access_flags = reader.u16()?;
        let this_class = pool.class_name(reader.u16()?)?;
        let super_index = reader.u16()?;
        let super_class = if super_index == 0 {
            None
        } else {
            Some(pool.class_name(super_index)?)
        };

        let interface_count = reader.u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(reader.u16()?)?);
        }

        let fields = read_members(&mut reader, &pool)?;
        let methods = read_members(&mut reader, &pool)?;

        let mut annotations = Vec::new();
        let attribute_count = reader.u16()?;
        for _ in 0..attribute_count {
            let (name, body) = read_attribute(&mut reader, &pool)?;
            if name == "RuntimeVisibleAnnotations" {
                annotations = read_annotations(&mut Reader { data: body, pos: 0 }, &pool)?;
            }
        }

        Ok(ClassFile {
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            annotations,
        })
    }

    pub fn has_flag(&self, flag: u16) -> bool {
        self.access_flags & flag != 0
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassFormatError::UnexpectedEof(self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFormatError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFormatError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFormatError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, ClassFormatError> {
        let hi = self.u32()? as u64;
        let lo = self.u32()? as u64;
        Ok((hi << 32) | lo)
    }
}

#[derive(Debug, Clone)]
enum Constant {
    /// Index 0 and the second slot of 8-byte constants
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    /// References, method handles, dynamic constants: not needed for introspection
    Other,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn read(reader: &mut Reader<'_>) -> Result<Self, ClassFormatError> {
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);

        let mut index: u16 = 1;
        while index < count {
            let tag = reader.u8()?;
            let entry = match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.bytes(len)?))
                }
                3 => Constant::Integer(reader.u32()? as i32),
                4 => Constant::Float(f32::from_bits(reader.u32()?)),
                5 => Constant::Long(reader.u64()? as i64),
                6 => Constant::Double(f64::from_bits(reader.u64()?)),
                7 => Constant::Class(reader.u16()?),
                8 => Constant::String(reader.u16()?),
                // Field/Method/InterfaceMethod refs, NameAndType, Dynamic, InvokeDynamic
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.bytes(4)?;
                    Constant::Other
                }
                15 => {
                    reader.bytes(3)?;
                    Constant::Other
                }
                // MethodType, Module, Package
                16 | 19 | 20 => {
                    reader.bytes(2)?;
                    Constant::Other
                }
                _ => return Err(ClassFormatError::UnknownConstantTag { tag, index }),
            };

            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            index += 1;
            if wide {
                entries.push(Constant::Unusable);
                index += 1;
            }
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassFormatError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassFormatError::BadConstantIndex(index))
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassFormatError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            _ => Err(ClassFormatError::BadConstantIndex(index)),
        }
    }

    /// Resolve a `CONSTANT_Class` entry to a dotted binary name.
    fn class_name(&self, index: u16) -> Result<String, ClassFormatError> {
        match self.get(index)? {
            Constant::Class(name_index) => Ok(self.utf8(*name_index)?.replace('/', ".")),
            _ => Err(ClassFormatError::BadConstantIndex(index)),
        }
    }
}

/// Class files store strings in "modified UTF-8": NUL is encoded as `C0 80` and
/// supplementary characters as surrogate pairs. Standard UTF-8 decoding covers the
/// names and literals that matter here; anything else is decoded lossily.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    if bytes.windows(2).any(|w| w == [0xC0, 0x80]) {
        let normalized: Vec<u8> = {
            let mut out = Vec::with_capacity(bytes.len());
            let mut i = 0;
            while i < bytes.len() {
                if bytes[i] == 0xC0 && bytes.get(i + 1) == Some(&0x80) {
                    out.push(0);
                    i += 2;
                } else {
                    out.push(bytes[i]);
                    i += 1;
                }
            }
            out
        };
        return String::from_utf8_lossy(&normalized).into_owned();
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn read_attribute<'a>(
    reader: &mut Reader<'a>,
    pool: &ConstantPool,
) -> Result<(String, &'a [u8]), ClassFormatError> {
    let name = pool.utf8(reader.u16()?)?.to_string();
    let len = reader.u32()? as usize;
    let body = reader.bytes(len)?;
    Ok((name, body))
}

fn read_members(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<MemberInfo>, ClassFormatError> {
    let count = reader.u16()?;
    let mut members = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let access_flags = reader.u16()?;
        let name = pool.utf8(reader.u16()?)?.to_string();
        let descriptor = pool.utf8(reader.u16()?)?.to_string();

        let mut member = MemberInfo {
            access_flags,
            name,
            descriptor,
            signature: None,
            annotations: Vec::new(),
            parameter_annotations: Vec::new(),
            parameter_names: Vec::new(),
        };

        let attribute_count = reader.u16()?;
        for _ in 0..attribute_count {
            let (attr_name, body) = read_attribute(reader, pool)?;
            let mut body_reader = Reader { data: body, pos: 0 };
            match attr_name.as_str() {
                "Signature" => {
                    member.signature = Some(pool.utf8(body_reader.u16()?)?.to_string());
                }
                "RuntimeVisibleAnnotations" => {
                    member.annotations = read_annotations(&mut body_reader, pool)?;
                }
                "RuntimeVisibleParameterAnnotations" => {
                    let parameter_count = body_reader.u8()?;
                    for _ in 0..parameter_count {
                        member
                            .parameter_annotations
                            .push(read_annotations(&mut body_reader, pool)?);
                    }
                }
                "MethodParameters" => {
                    let parameter_count = body_reader.u8()?;
                    for _ in 0..parameter_count {
                        let name_index = body_reader.u16()?;
                        let _flags = body_reader.u16()?;
                        let name = if name_index == 0 {
                            None
                        } else {
                            Some(pool.utf8(name_index)?.to_string())
                        };
                        member.parameter_names.push(name);
                    }
                }
                _ => {}
            }
        }

        members.push(member);
    }

    Ok(members)
}

fn read_annotations(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<Annotation>, ClassFormatError> {
    let count = reader.u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(read_annotation(reader, pool)?);
    }
    Ok(annotations)
}

fn read_annotation(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<Annotation, ClassFormatError> {
    let type_name = descriptor_class_name(pool.utf8(reader.u16()?)?);
    let pair_count = reader.u16()?;
    let mut elements = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        let name = pool.utf8(reader.u16()?)?.to_string();
        let value = read_element_value(reader, pool)?;
        elements.push((name, value));
    }
    Ok(Annotation {
        type_name,
        elements,
    })
}

fn read_element_value(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<ElementValue, ClassFormatError> {
    let tag = reader.u8()?;
    let value = match tag {
        b'B' | b'C' | b'I' | b'S' | b'Z' => {
            let index = reader.u16()?;
            match pool.get(index)? {
                Constant::Integer(v) => ElementValue::Int(*v),
                _ => return Err(ClassFormatError::BadConstantIndex(index)),
            }
        }
        b'J' => {
            let index = reader.u16()?;
            match pool.get(index)? {
                Constant::Long(v) => ElementValue::Long(*v),
                _ => return Err(ClassFormatError::BadConstantIndex(index)),
            }
        }
        b'F' => {
            let index = reader.u16()?;
            match pool.get(index)? {
                Constant::Float(v) => ElementValue::Float(*v),
                _ => return Err(ClassFormatError::BadConstantIndex(index)),
            }
        }
        b'D' => {
            let index = reader.u16()?;
            match pool.get(index)? {
                Constant::Double(v) => ElementValue::Double(*v),
                _ => return Err(ClassFormatError::BadConstantIndex(index)),
            }
        }
        b's' => ElementValue::Str(pool.utf8(reader.u16()?)?.to_string()),
        b'e' => {
            let type_name = descriptor_class_name(pool.utf8(reader.u16()?)?);
            let constant = pool.utf8(reader.u16()?)?.to_string();
            ElementValue::Enum {
                type_name,
                constant,
            }
        }
        b'c' => ElementValue::Class(descriptor_class_name(pool.utf8(reader.u16()?)?)),
        b'@' => ElementValue::Annotation(Box::new(read_annotation(reader, pool)?)),
        b'[' => {
            let count = reader.u16()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(read_element_value(reader, pool)?);
            }
            ElementValue::Array(values)
        }
        other => {
            return Err(ClassFormatError::BadDescriptor(format!(
                "element value tag '{}'",
                other as char
            )))
        }
    };
    Ok(value)
}

/// `Ljavax/ws/rs/Path;` -> `javax.ws.rs.Path`. Non-object descriptors are kept as-is.
fn descriptor_class_name(descriptor: &str) -> String {
    descriptor
        .strip_prefix('L')
        .and_then(|s| s.strip_suffix(';'))
        .unwrap_or(descriptor)
        .replace('/', ".")
}
