//! Format-independent representation of a schema.
//!
//! Produced by the registry from parsed documents and consumed by the
//! relationship resolver, the diff engine and the artifact generators.

mod relation;

pub use relation::{Cardinality, RelationEdge, RelationRef};

use std::collections::BTreeMap;

use serde_json::Value;

/// Every type of a run, keyed by name.
///
/// Ordered by name so every pass over the registry is deterministic.
pub type TypeMap = BTreeMap<String, TypeDefinition>;

/// Bootstrap types describing the JSON:API envelope.
pub const CUSTOM_TYPE_ID: &str = "ID";
pub const CUSTOM_TYPE_TYPE: &str = "Type";
pub const CUSTOM_TYPE_RELATIONSHIPS_DATA_ITEM: &str = "RelationshipsDataItem";
pub const CUSTOM_TYPE_REDIS: &str = "Redis";

/// Bootstrap types a schema must declare.
pub const REQUIRED_CUSTOM_TYPES: [&str; 3] = [
    CUSTOM_TYPE_ID,
    CUSTOM_TYPE_TYPE,
    CUSTOM_TYPE_RELATIONSHIPS_DATA_ITEM,
];

/// Name fragments marking support types that never become entities.
pub const EXCLUDED_SUBTYPES: [&str; 5] = [
    "Attributes",
    "Relationships",
    "QueryParams",
    "Filter",
    "Trees",
];

/// Property holding an entity's relation references.
pub const RELATIONSHIPS_PROPERTY: &str = "relationships";

/// Property holding (or referencing) an entity's columns.
pub const ATTRIBUTES_PROPERTY: &str = "attributes";

/// Column that switches an entity to soft deletes.
pub const SOFT_DELETE_COLUMN: &str = "deleted_at";

/// Prefix of an in-document schema reference.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Kind of a schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Custom,
}

/// One named schema entry.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    /// Properties as declared, in document order.
    pub properties: Vec<PropertyDef>,
    /// Effective columns: the attributes type's properties for entities,
    /// the declared non-relation properties otherwise. Filled by the registry.
    pub columns: Vec<PropertyDef>,
    /// Relation references, in declaration order.
    pub relations: Vec<RelationRef>,
    /// The definition as parsed, used to detect shape conflicts.
    pub raw: Value,
}

/// A single declared property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    /// Declared `type`, or the referenced type name for `$ref` properties.
    pub data_type: String,
    pub format: Option<String>,
    pub is_relation_marker: bool,
    pub max_length: Option<u64>,
    pub required: bool,
    pub default: Option<Value>,
    pub enum_values: Vec<String>,
}

impl TypeDefinition {
    /// Builds a definition from its schema mapping.
    pub fn from_schema(name: &str, schema: &Value) -> Self {
        let kind = if is_custom_type(name) {
            TypeKind::Custom
        } else {
            TypeKind::Object
        };

        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let properties: Vec<PropertyDef> = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(prop_name, prop)| {
                        PropertyDef::from_schema(prop_name, prop, required.contains(&prop_name.as_str()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let relations = schema
            .get("properties")
            .and_then(|p| p.get(RELATIONSHIPS_PROPERTY))
            .and_then(relation_declaration)
            .map(RelationRef::parse_list)
            .unwrap_or_default();

        let columns = properties
            .iter()
            .filter(|p| !p.is_relation_marker)
            .cloned()
            .collect();

        Self {
            name: name.to_string(),
            kind,
            properties,
            columns,
            relations,
            raw: schema.clone(),
        }
    }

    /// Whether artifacts are generated for this type: a non-custom,
    /// non-support type that declares properties.
    pub fn is_entity(&self) -> bool {
        self.kind == TypeKind::Object
            && !is_support_type(&self.name)
            && self.raw.get("properties").is_some()
    }

    /// Whether the entity uses soft deletes.
    pub fn is_soft_delete(&self) -> bool {
        self.columns.iter().any(|c| c.name == SOFT_DELETE_COLUMN)
    }

    /// Declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl PropertyDef {
    fn from_schema(name: &str, schema: &Value, required: bool) -> Self {
        let data_type = schema
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                schema
                    .get("$ref")
                    .and_then(Value::as_str)
                    .map(|r| strip_schema_ref(r).to_string())
            })
            .unwrap_or_else(|| "object".to_string());

        Self {
            name: name.to_string(),
            data_type,
            format: schema.get("format").and_then(Value::as_str).map(str::to_string),
            is_relation_marker: name == RELATIONSHIPS_PROPERTY,
            max_length: schema.get("maxLength").and_then(Value::as_u64),
            required: required || schema.get("required").and_then(Value::as_bool).unwrap_or(false),
            default: schema.get("default").cloned(),
            enum_values: schema
                .get("enum")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Whether two properties declare the same data type and format.
    pub fn same_declaration(&self, other: &PropertyDef) -> bool {
        self.data_type == other.data_type && self.format == other.format
    }
}

/// Whether `name` is one of the bootstrap types.
pub fn is_custom_type(name: &str) -> bool {
    REQUIRED_CUSTOM_TYPES.contains(&name) || name == CUSTOM_TYPE_REDIS
}

/// Whether `name` marks a support type (attributes, relationships, filters...).
pub fn is_support_type(name: &str) -> bool {
    EXCLUDED_SUBTYPES.iter().any(|fragment| name.contains(fragment))
}

/// Strips the in-document reference prefix, if any.
pub fn strip_schema_ref(reference: &str) -> &str {
    reference.strip_prefix(SCHEMA_REF_PREFIX).unwrap_or(reference)
}

fn relation_declaration(value: &Value) -> Option<&str> {
    value
        .get("$ref")
        .or_else(|| value.get("type"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_schema_reads_properties_in_order() {
        let schema = json!({
            "type": "object",
            "required": ["title"],
            "properties": {
                "title": { "type": "string", "maxLength": 255 },
                "views": { "type": "integer", "format": "int64" },
                "status": { "type": "string", "enum": ["draft", "published"] }
            }
        });

        let def = TypeDefinition::from_schema("ArticleAttributes", &schema);

        let names: Vec<_> = def.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["title", "views", "status"]);
        assert!(def.properties[0].required);
        assert_eq!(def.properties[0].max_length, Some(255));
        assert_eq!(def.properties[1].format.as_deref(), Some("int64"));
        assert_eq!(def.properties[2].enum_values, vec!["draft", "published"]);
        assert!(!def.is_entity());
    }

    #[test]
    fn test_relationships_property_yields_relation_refs() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": { "$ref": "#/components/schemas/ID" },
                "relationships": { "$ref": "#/components/schemas/TagRelationships[] | Topic" }
            }
        });

        let def = TypeDefinition::from_schema("Article", &schema);

        assert_eq!(def.properties[0].data_type, "ID");
        assert!(def.properties[1].is_relation_marker);
        assert_eq!(
            def.relations,
            vec![RelationRef::new("Tag", true), RelationRef::new("Topic", false)]
        );
        assert_eq!(def.columns.len(), 1);
        assert!(def.is_entity());
    }

    #[test]
    fn test_custom_and_support_types() {
        assert!(is_custom_type("ID"));
        assert!(is_custom_type("Redis"));
        assert!(!is_custom_type("Article"));
        assert!(is_support_type("ArticleAttributes"));
        assert!(is_support_type("ArticleQueryParams"));
        assert!(!is_support_type("Article"));
    }
}
