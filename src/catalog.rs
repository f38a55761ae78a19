use crate::classfile::descriptor::{is_core_type, parse_field_type, parse_method_type, TypeRef};
use crate::classfile::{
    self, Annotation, ClassFile, MemberInfo, ACC_BRIDGE, ACC_ENUM, ACC_PUBLIC, ACC_STATIC,
    ACC_SYNTHETIC,
};
use crate::error::TypeLoadError;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

/// Type catalog - a reflection-like view over directories of compiled classes.
///
/// Types are located by binary name (`com.acme.Outer$Inner` lives at
/// `<root>/com/acme/Outer$Inner.class`), decoded once and cached. Roots are searched
/// in order, so the primary classes directory shadows extra class-path entries.
pub struct TypeCatalog {
    roots: Vec<PathBuf>,
    /// Both successes and failures are cached, so a broken type is decoded (and
    /// reported) once per run
    cache: HashMap<String, Result<Rc<TypeHandle>, TypeLoadError>>,
}

/// Structural view of one loaded type.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    /// Binary name, e.g. `com.acme.UserResource`
    pub name: String,
    pub access_flags: u16,
    pub super_class: Option<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldHandle>,
    pub methods: Vec<MethodHandle>,
}

#[derive(Debug, Clone)]
pub struct FieldHandle {
    pub name: String,
    pub access_flags: u16,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone)]
pub struct MethodHandle {
    pub name: String,
    pub access_flags: u16,
    /// Generic return type when a signature is available, else the erased one
    pub return_type: TypeRef,
    pub parameters: Vec<ParameterHandle>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct ParameterHandle {
    /// Compiled name, only present when the class was built with `-parameters`
    pub name: Option<String>,
    pub type_ref: TypeRef,
    pub annotations: Vec<Annotation>,
}

impl TypeHandle {
    pub fn simple_name(&self) -> &str {
        classfile::simple_name(&self.name)
    }

    pub fn is_enum(&self) -> bool {
        self.access_flags & ACC_ENUM != 0
    }
}

impl MethodHandle {
    pub fn is_public(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }

    /// Public, non-static, compiler-authored methods are excluded.
    fn is_public_instance(&self) -> bool {
        self.is_public()
            && self.access_flags & (ACC_STATIC | ACC_BRIDGE | ACC_SYNTHETIC) == 0
            && !self.name.starts_with('<')
    }
}

/// Find a JAX-RS annotation by simple name, in either the `javax.ws.rs` or the
/// `jakarta.ws.rs` namespace (including sub-packages such as `core` and `container`).
pub fn rs_annotation<'a>(annotations: &'a [Annotation], simple: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| {
        (a.type_name.starts_with("javax.ws.rs.") || a.type_name.starts_with("jakarta.ws.rs."))
            && a.simple_name() == simple
    })
}

/// Find an annotation by simple name in any namespace.
pub fn annotation_named<'a>(annotations: &'a [Annotation], simple: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.simple_name() == simple)
}

impl TypeCatalog {
    /// Create a catalog over the primary classes directory followed by any extra
    /// class-path directories.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        debug!("Initializing TypeCatalog with {} root(s)", roots.len());
        Self {
            roots,
            cache: HashMap::new(),
        }
    }

    /// Load a type by binary name. Repeated loads return the same cached handle.
    pub fn load_type(&mut self, name: &str) -> Result<Rc<TypeHandle>, TypeLoadError> {
        if let Some(cached) = self.cache.get(name) {
            return cached.clone();
        }

        let result = self.load_uncached(name).map(Rc::new);
        match &result {
            Ok(_) => debug!("Loaded type {}", name),
            Err(e) => debug!("Failed to load type {}: {}", name, e),
        }
        self.cache.insert(name.to_string(), result.clone());
        result
    }

    fn load_uncached(&self, name: &str) -> Result<TypeHandle, TypeLoadError> {
        let relative = format!("{}.class", name.replace('.', "/"));

        let path = self
            .roots
            .iter()
            .map(|root| root.join(&relative))
            .find(|path| path.is_file())
            .ok_or_else(|| TypeLoadError::NotFound {
                name: name.to_string(),
            })?;

        let bytes = fs::read(&path).map_err(|e| TypeLoadError::Unreadable {
            name: name.to_string(),
            path: path.clone(),
            message: e.to_string(),
        })?;

        let class = ClassFile::parse(&bytes).map_err(|e| TypeLoadError::Malformed {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        if class.this_class != name {
            return Err(TypeLoadError::Malformed {
                name: name.to_string(),
                message: format!("file declares {}", class.this_class),
            });
        }

        build_handle(class)
    }

    /// The public instance methods of a type, including those inherited from
    /// loadable superclasses. Subclass declarations come first and shadow
    /// inherited methods with the same name. Core-library superclasses are not
    /// walked.
    pub fn public_methods(&mut self, name: &str) -> Result<Vec<MethodHandle>, TypeLoadError> {
        let mut methods: Vec<MethodHandle> = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();

        let mut current = Some(name.to_string());
        while let Some(type_name) = current.take() {
            if !visited.insert(type_name.clone()) {
                warn!("Superclass cycle detected at {}", type_name);
                break;
            }

            let handle = match self.load_type(&type_name) {
                Ok(handle) => handle,
                Err(e) if type_name == name => return Err(e),
                Err(_) => {
                    return Err(TypeLoadError::MissingDependency {
                        name: name.to_string(),
                        dependency: type_name,
                    })
                }
            };

            for method in handle.methods.iter().filter(|m| m.is_public_instance()) {
                if seen_names.insert(method.name.clone()) {
                    methods.push(method.clone());
                }
            }

            current = handle
                .super_class
                .as_ref()
                .filter(|s| !is_core_type(s))
                .cloned();
        }

        Ok(methods)
    }

    /// Enum constant names in declaration order.
    pub fn enum_constants(handle: &TypeHandle) -> Vec<String> {
        handle
            .fields
            .iter()
            .filter(|f| f.access_flags & ACC_ENUM != 0)
            .map(|f| f.name.clone())
            .collect()
    }
}

fn build_handle(class: ClassFile) -> Result<TypeHandle, TypeLoadError> {
    let name = class.this_class.clone();
    let malformed = |message: String| TypeLoadError::Malformed {
        name: name.clone(),
        message,
    };

    let mut fields = Vec::with_capacity(class.fields.len());
    for field in &class.fields {
        let type_ref = field
            .signature
            .as_deref()
            .and_then(|s| parse_field_type(s).ok())
            .map_or_else(|| parse_field_type(&field.descriptor), Ok)
            .map_err(|e| malformed(e.to_string()))?;
        fields.push(FieldHandle {
            name: field.name.clone(),
            access_flags: field.access_flags,
            type_ref,
        });
    }

    let mut methods = Vec::with_capacity(class.methods.len());
    for method in class.methods {
        methods.push(build_method(method).map_err(|e| malformed(e.to_string()))?);
    }

    Ok(TypeHandle {
        name: class.this_class,
        access_flags: class.access_flags,
        super_class: class.super_class,
        annotations: class.annotations,
        fields,
        methods,
    })
}

fn build_method(method: MemberInfo) -> Result<MethodHandle, crate::error::ClassFormatError> {
    let (erased_params, erased_return) = parse_method_type(&method.descriptor)?;

    // Signatures may omit synthetic parameters; only trust them when the arity agrees.
    let (param_types, return_type) = match method
        .signature
        .as_deref()
        .and_then(|s| parse_method_type(s).ok())
    {
        Some((params, ret)) if params.len() == erased_params.len() => (params, ret),
        Some((_, ret)) => (erased_params, ret),
        None => (erased_params, erased_return),
    };

    let mut parameter_annotations = method.parameter_annotations.into_iter();
    let mut parameter_names = method.parameter_names.into_iter();
    let parameters = param_types
        .into_iter()
        .map(|type_ref| ParameterHandle {
            name: parameter_names.next().flatten(),
            type_ref,
            annotations: parameter_annotations.next().unwrap_or_default(),
        })
        .collect();

    Ok(MethodHandle {
        name: method.name,
        access_flags: method.access_flags,
        return_type,
        parameters,
        annotations: method.annotations,
    })
}
