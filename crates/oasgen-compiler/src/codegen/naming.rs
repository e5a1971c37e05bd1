//! Name conversions and type mapping shared by the artifact generators.

use crate::ir::PropertyDef;

/// Maps a column's declared type to the scalar type used in generated classes.
pub fn to_php_type(column: &PropertyDef) -> &'static str {
    match column.data_type.as_str() {
        "integer" => "int",
        "number" => "float",
        "boolean" => "bool",
        "array" => "array",
        "object" => "array",
        _ => "string",
    }
}

/// Converts a snake_case name to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Lowercases the first character: `PostTag` becomes `postTag`.
pub fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Unqualified class name: `Oasgen\Extension\BaseModel` becomes `BaseModel`.
pub fn class_basename(path: &str) -> &str {
    path.rsplit('\\').next().unwrap_or(path)
}

/// Table name of an entity.
pub fn table_name(entity: &str) -> String {
    entity.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(data_type: &str) -> PropertyDef {
        PropertyDef {
            name: "c".to_string(),
            data_type: data_type.to_string(),
            format: None,
            is_relation_marker: false,
            max_length: None,
            required: false,
            default: None,
            enum_values: Vec::new(),
        }
    }

    #[test]
    fn test_php_types() {
        assert_eq!(to_php_type(&column("integer")), "int");
        assert_eq!(to_php_type(&column("boolean")), "bool");
        assert_eq!(to_php_type(&column("string")), "string");
        assert_eq!(to_php_type(&column("ID")), "string");
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_pascal_case("post_tag"), "PostTag");
        assert_eq!(lcfirst("PostTag"), "postTag");
        assert_eq!(table_name("BlogPost"), "blogpost");
        assert_eq!(class_basename("Oasgen\\Extension\\BaseModel"), "BaseModel");
        assert_eq!(class_basename("BaseModel"), "BaseModel");
    }
}
