//! Minimal class-file writer for tests.
//!
//! Emits just the structures the decoder reads: constant pool, header, fields,
//! methods and the annotation / signature / parameter-name attributes. No code
//! attributes are written, which is fine for introspection.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_BRIDGE: u16 = 0x0040;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ENUM: u16 = 0x4000;

#[derive(Clone)]
enum Value {
    Str(String),
    Int(i32),
    Enum(String, String),
    Array(Vec<Value>),
}

#[derive(Clone)]
pub struct AnnotationSpec {
    type_name: String,
    elements: Vec<(String, Value)>,
}

impl AnnotationSpec {
    /// `type_name` uses internal form, e.g. `javax/ws/rs/Path`.
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn string(mut self, name: &str, value: &str) -> Self {
        self.elements
            .push((name.to_string(), Value::Str(value.to_string())));
        self
    }

    pub fn strings(mut self, name: &str, values: &[&str]) -> Self {
        let values = values.iter().map(|v| Value::Str(v.to_string())).collect();
        self.elements.push((name.to_string(), Value::Array(values)));
        self
    }

    pub fn int(mut self, name: &str, value: i32) -> Self {
        self.elements.push((name.to_string(), Value::Int(value)));
        self
    }

    pub fn enum_value(mut self, name: &str, enum_type: &str, constant: &str) -> Self {
        self.elements.push((
            name.to_string(),
            Value::Enum(enum_type.to_string(), constant.to_string()),
        ));
        self
    }
}

pub struct MethodSpec {
    access: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
    parameter_annotations: Option<Vec<Vec<AnnotationSpec>>>,
    parameter_names: Option<Vec<String>>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            access: ACC_PUBLIC,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            annotations: Vec::new(),
            parameter_annotations: None,
            parameter_names: None,
        }
    }

    /// A public no-argument getter returning the given field descriptor.
    pub fn getter(name: &str, return_descriptor: &str) -> Self {
        Self::new(name, &format!("(){}", return_descriptor))
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn parameter_annotations(mut self, annotations: Vec<Vec<AnnotationSpec>>) -> Self {
        self.parameter_annotations = Some(annotations);
        self
    }

    pub fn parameter_names(mut self, names: &[&str]) -> Self {
        self.parameter_names = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }
}

struct FieldSpec {
    access: u16,
    name: String,
    descriptor: String,
}

pub struct ClassSpec {
    access: u16,
    name: String,
    super_class: Option<String>,
    annotations: Vec<AnnotationSpec>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    long_constants: Vec<i64>,
}

impl ClassSpec {
    /// `name` uses internal form, e.g. `com/acme/UserResource`.
    pub fn new(name: &str) -> Self {
        Self {
            access: ACC_PUBLIC | ACC_SUPER,
            name: name.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            long_constants: Vec::new(),
        }
    }

    /// An enum type: `java/lang/Enum` super class and one constant field per name.
    pub fn new_enum(name: &str, constants: &[&str]) -> Self {
        Self::new(name)
            .access(ACC_PUBLIC | ACC_FINAL | ACC_SUPER | ACC_ENUM)
            .super_class("java/lang/Enum")
            .enum_constants(constants)
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.super_class = Some(name.to_string());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(FieldSpec {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        });
        self
    }

    pub fn enum_constants(mut self, constants: &[&str]) -> Self {
        let descriptor = format!("L{};", self.name);
        for constant in constants {
            self = self.field(
                ACC_PUBLIC | ACC_STATIC | ACC_FINAL | ACC_ENUM,
                constant,
                &descriptor,
            );
        }
        self
    }

    /// Adds an unused `CONSTANT_Long` entry, which occupies two pool slots.
    pub fn long_constant(mut self, value: i64) -> Self {
        self.long_constants.push(value);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let mut body = Vec::new();

        for value in &self.long_constants {
            pool.long(*value);
        }

        put_u16(&mut body, self.access);
        let this_index = pool.class(&self.name);
        put_u16(&mut body, this_index);
        let super_index = match &self.super_class {
            Some(name) => pool.class(name),
            None => 0,
        };
        put_u16(&mut body, super_index);
        put_u16(&mut body, 0); // interfaces

        put_u16(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            put_u16(&mut body, field.access);
            put_u16(&mut body, pool.utf8(&field.name));
            put_u16(&mut body, pool.utf8(&field.descriptor));
            put_u16(&mut body, 0);
        }

        put_u16(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u16(&mut body, method.access);
            put_u16(&mut body, pool.utf8(&method.name));
            put_u16(&mut body, pool.utf8(&method.descriptor));

            let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
            if let Some(signature) = &method.signature {
                let mut data = Vec::new();
                put_u16(&mut data, pool.utf8(signature));
                attributes.push((pool.utf8("Signature"), data));
            }
            if !method.annotations.is_empty() {
                let data = annotations_bytes(&mut pool, &method.annotations);
                attributes.push((pool.utf8("RuntimeVisibleAnnotations"), data));
            }
            if let Some(per_parameter) = &method.parameter_annotations {
                let mut data = vec![per_parameter.len() as u8];
                for annotations in per_parameter {
                    data.extend(annotations_bytes(&mut pool, annotations));
                }
                attributes.push((pool.utf8("RuntimeVisibleParameterAnnotations"), data));
            }
            if let Some(names) = &method.parameter_names {
                let mut data = vec![names.len() as u8];
                for name in names {
                    put_u16(&mut data, pool.utf8(name));
                    put_u16(&mut data, 0);
                }
                attributes.push((pool.utf8("MethodParameters"), data));
            }
            put_attributes(&mut body, &attributes);
        }

        let mut class_attributes = Vec::new();
        if !self.annotations.is_empty() {
            let data = annotations_bytes(&mut pool, &self.annotations);
            class_attributes.push((pool.utf8("RuntimeVisibleAnnotations"), data));
        }
        put_attributes(&mut body, &class_attributes);

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        put_u16(&mut out, 0);
        put_u16(&mut out, 52);
        put_u16(&mut out, pool.next_index);
        out.extend(pool.bytes);
        out.extend(body);
        out
    }

    /// Writes `<root>/<name>.class`, creating package directories.
    pub fn write_to(&self, root: &Path) -> PathBuf {
        let path = root.join(format!("{}.class", self.name));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, self.build()).unwrap();
        path
    }
}

struct Pool {
    bytes: Vec<u8>,
    next_index: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            utf8: HashMap::new(),
            classes: HashMap::new(),
        }
    }
}

impl Pool {
    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8.get(value) {
            return *index;
        }
        let index = self.next_index;
        self.bytes.push(1);
        put_u16(&mut self.bytes, value.len() as u16);
        self.bytes.extend_from_slice(value.as_bytes());
        self.next_index += 1;
        self.utf8.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        let index = self.next_index;
        self.bytes.push(7);
        put_u16(&mut self.bytes, name_index);
        self.next_index += 1;
        self.classes.insert(name.to_string(), index);
        index
    }

    fn int(&mut self, value: i32) -> u16 {
        let index = self.next_index;
        self.bytes.push(3);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.next_index += 1;
        index
    }

    fn long(&mut self, value: i64) -> u16 {
        let index = self.next_index;
        self.bytes.push(5);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.next_index += 2;
        index
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_attributes(out: &mut Vec<u8>, attributes: &[(u16, Vec<u8>)]) {
    put_u16(out, attributes.len() as u16);
    for (name_index, data) in attributes {
        put_u16(out, *name_index);
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(data);
    }
}

fn annotations_bytes(pool: &mut Pool, annotations: &[AnnotationSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    put_u16(&mut out, annotations.len() as u16);
    for annotation in annotations {
        put_u16(&mut out, pool.utf8(&format!("L{};", annotation.type_name)));
        put_u16(&mut out, annotation.elements.len() as u16);
        for (name, value) in &annotation.elements {
            put_u16(&mut out, pool.utf8(name));
            put_value(&mut out, pool, value);
        }
    }
    out
}

fn put_value(out: &mut Vec<u8>, pool: &mut Pool, value: &Value) {
    match value {
        Value::Str(s) => {
            out.push(b's');
            put_u16(out, pool.utf8(s));
        }
        Value::Int(i) => {
            out.push(b'I');
            put_u16(out, pool.int(*i));
        }
        Value::Enum(type_name, constant) => {
            out.push(b'e');
            put_u16(out, pool.utf8(&format!("L{};", type_name)));
            put_u16(out, pool.utf8(constant));
        }
        Value::Array(values) => {
            out.push(b'[');
            put_u16(out, values.len() as u16);
            for v in values {
                put_value(out, pool, v);
            }
        }
    }
}
