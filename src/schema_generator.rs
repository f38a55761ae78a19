use crate::classfile::descriptor::{is_core_type, TypeRef};
use crate::classfile::simple_name;
use crate::model::{DataShape, Field};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Schema generator - converts Java type names and DataShapes to OpenAPI schemas
pub struct SchemaGenerator {
    /// Qualified type name -> component schema name
    names: BTreeMap<String, String>,
    /// Component schemas keyed by component name
    schemas: BTreeMap<String, Schema>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Enum values for enum types
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Schema {
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn formatted(schema_type: &str, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::typed(schema_type)
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array")
        }
    }

    pub fn reference(component_name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_PREFIX, component_name)),
            ..Self::default()
        }
    }

    fn described(schema_type: &str, description: Option<&str>) -> Self {
        Self {
            description: description.map(str::to_string),
            ..Self::typed(schema_type)
        }
    }
}

impl SchemaGenerator {
    /// Create a generator over the data shapes of a model and build one component
    /// schema per shape.
    pub fn new(shapes: &BTreeMap<String, DataShape>) -> Self {
        debug!("Initializing SchemaGenerator for {} shape(s)", shapes.len());
        let mut generator = Self {
            names: component_names(shapes.keys()),
            schemas: BTreeMap::new(),
        };

        for (type_name, shape) in shapes {
            let schema = generator.shape_schema(shape);
            if let Some(component) = generator.names.get(type_name).cloned() {
                generator.schemas.insert(component, schema);
            }
        }

        generator
    }

    /// Component name of a described type.
    pub fn component_name(&self, type_name: &str) -> Option<&str> {
        self.names.get(type_name).map(String::as_str)
    }

    /// Generate a schema for a model type-name string (`java.util.List<com.acme.User>`).
    pub fn generate_schema(&self, type_name: &str) -> Schema {
        match type_name.parse::<TypeRef>() {
            Ok(type_ref) => self.type_ref_schema(&type_ref),
            Err(_) => {
                debug!("Unparseable type name {:?}, using object", type_name);
                Schema::typed("object")
            }
        }
    }

    fn type_ref_schema(&self, type_ref: &TypeRef) -> Schema {
        if type_ref.is_array() || type_ref.is_collection() {
            let items = type_ref
                .element_type()
                .map(|element| self.type_ref_schema(&element))
                .unwrap_or_else(|| Schema::typed("object"));
            return Schema::array(items);
        }

        if let Some(schema) = primitive_schema(&type_ref.name) {
            return schema;
        }
        if let Some(component) = self.component_name(&type_ref.name) {
            return Schema::reference(component);
        }
        Schema::typed("object")
    }

    fn field_schema(&self, field: &Field) -> Schema {
        match &field.element_type {
            Some(element) => Schema::array(self.generate_schema(element)),
            None => self.generate_schema(&field.type_name),
        }
    }

    fn shape_schema(&self, shape: &DataShape) -> Schema {
        if shape.is_error() {
            return Schema::described("object", shape.description.as_deref());
        }
        if let Some(values) = shape.enum_values() {
            return Schema {
                enum_values: Some(values.into_iter().map(str::to_string).collect()),
                ..Schema::typed("string")
            };
        }
        if shape.fields.is_empty() {
            return Schema::described("object", shape.description.as_deref());
        }

        let properties = shape
            .fields
            .iter()
            .map(|field| (field.name.clone(), self.field_schema(field)))
            .collect();
        Schema {
            properties: Some(properties),
            ..Schema::described("object", shape.description.as_deref())
        }
    }

    /// Get all generated component schemas
    pub fn get_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }
}

/// Simple names, or the full name where two types share one.
fn component_names<'a>(type_names: impl Iterator<Item = &'a String>) -> BTreeMap<String, String> {
    let type_names: Vec<&String> = type_names.collect();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in &type_names {
        *counts.entry(simple_name(name)).or_default() += 1;
    }

    type_names
        .into_iter()
        .map(|name| {
            let simple = simple_name(name);
            let component = if counts[simple] > 1 {
                name.replace('$', ".")
            } else {
                simple.to_string()
            };
            (name.clone(), component)
        })
        .collect()
}

/// Map primitives and well-known platform types to OpenAPI types.
fn primitive_schema(name: &str) -> Option<Schema> {
    let schema = match name {
        "int" | "java.lang.Integer" | "short" | "java.lang.Short" => {
            Schema::formatted("integer", "int32")
        }
        "long" | "java.lang.Long" => Schema::formatted("integer", "int64"),
        "java.math.BigInteger" => Schema::typed("integer"),
        "float" | "java.lang.Float" => Schema::formatted("number", "float"),
        "double" | "java.lang.Double" => Schema::formatted("number", "double"),
        "java.math.BigDecimal" => Schema::typed("number"),
        "boolean" | "java.lang.Boolean" => Schema::typed("boolean"),
        "byte" | "java.lang.Byte" => Schema::formatted("string", "byte"),
        "char" | "java.lang.Character" | "java.lang.String" => Schema::typed("string"),
        "java.util.UUID" => Schema::formatted("string", "uuid"),
        "java.net.URI" | "java.net.URL" => Schema::formatted("string", "uri"),
        "java.time.LocalDate" => Schema::formatted("string", "date"),
        "java.util.Date"
        | "java.time.Instant"
        | "java.time.LocalDateTime"
        | "java.time.OffsetDateTime"
        | "java.time.ZonedDateTime" => Schema::formatted("string", "date-time"),
        _ if is_core_type(name) => Schema::typed("object"),
        _ => return None,
    };
    Some(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(name: &str, type_name: &str, element: Option<&str>) -> Field {
        Field {
            name: name.to_string(),
            type_name: type_name.to_string(),
            element_type: element.map(str::to_string),
        }
    }

    fn generator(shapes: Vec<(&str, DataShape)>) -> SchemaGenerator {
        let shapes: BTreeMap<String, DataShape> = shapes
            .into_iter()
            .map(|(name, shape)| (name.to_string(), shape))
            .collect();
        SchemaGenerator::new(&shapes)
    }

    #[test]
    fn test_primitive_types() {
        let schema_gen = generator(vec![]);

        assert_eq!(schema_gen.generate_schema("int"), Schema::formatted("integer", "int32"));
        assert_eq!(
            schema_gen.generate_schema("java.lang.Long"),
            Schema::formatted("integer", "int64")
        );
        assert_eq!(schema_gen.generate_schema("boolean"), Schema::typed("boolean"));
        assert_eq!(schema_gen.generate_schema("java.lang.String"), Schema::typed("string"));
        assert_eq!(
            schema_gen.generate_schema("java.util.Date"),
            Schema::formatted("string", "date-time")
        );
        assert_eq!(schema_gen.generate_schema("java.util.Map"), Schema::typed("object"));
    }

    #[test]
    fn test_collections_and_arrays() {
        let schema_gen = generator(vec![("com.acme.User", DataShape::described("x"))]);

        assert_eq!(
            schema_gen.generate_schema("java.util.List<com.acme.User>"),
            Schema::array(Schema::reference("User"))
        );
        assert_eq!(
            schema_gen.generate_schema("long[]"),
            Schema::array(Schema::formatted("integer", "int64"))
        );
        assert_eq!(
            schema_gen.generate_schema("java.util.Set"),
            Schema::array(Schema::typed("object"))
        );
    }

    #[test]
    fn test_object_schema_from_fields() {
        let schema_gen = generator(vec![
            (
                "com.acme.Order",
                DataShape::with_fields(vec![
                    field("id", "long", None),
                    field("lines", "java.util.List", Some("com.acme.Line")),
                    field("status", "com.acme.Status", None),
                ]),
            ),
            ("com.acme.Line", DataShape::with_fields(vec![])),
            ("com.acme.Status", DataShape::enumeration("OPEN, CLOSED")),
        ]);

        let schemas = schema_gen.get_schemas();
        let order = &schemas["Order"];
        assert_eq!(order.schema_type.as_deref(), Some("object"));
        let properties = order.properties.as_ref().unwrap();
        assert_eq!(properties["id"], Schema::formatted("integer", "int64"));
        assert_eq!(properties["lines"], Schema::array(Schema::reference("Line")));
        assert_eq!(properties["status"], Schema::reference("Status"));

        assert_eq!(
            schemas["Line"].description.as_deref(),
            Some(DataShape::NO_FIELDS)
        );
        assert_eq!(
            schemas["Status"].enum_values,
            Some(vec!["OPEN".to_string(), "CLOSED".to_string()])
        );
        assert_eq!(schemas["Status"].schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_error_shape_is_described_object() {
        let schema_gen = generator(vec![("com.acme.Gone", DataShape::error("not found"))]);

        let schema = &schema_gen.get_schemas()["Gone"];
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert!(schema.properties.is_none());
        assert!(schema.description.as_deref().unwrap().contains("not found"));
    }

    #[test]
    fn test_colliding_simple_names_use_full_names() {
        let schema_gen = generator(vec![
            ("com.acme.a.Item", DataShape::described("a")),
            ("com.acme.b.Item", DataShape::described("b")),
            ("com.acme.Outer$Entry", DataShape::described("c")),
        ]);

        assert_eq!(schema_gen.component_name("com.acme.a.Item"), Some("com.acme.a.Item"));
        assert_eq!(schema_gen.component_name("com.acme.b.Item"), Some("com.acme.b.Item"));
        assert_eq!(schema_gen.component_name("com.acme.Outer$Entry"), Some("Entry"));
        assert_eq!(schema_gen.get_schemas().len(), 3);
    }

    #[test]
    fn test_serialized_keywords() {
        let schema = Schema::array(Schema::reference("User"));
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["type"], "array");
        assert_eq!(json["items"]["$ref"], "#/components/schemas/User");
        assert!(json.get("enum").is_none());
    }
}
