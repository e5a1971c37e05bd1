//! Structure validation for schema documents.
//!
//! Runs before anything is written: a document without the API marker, the
//! schemas section or the JSON:API bootstrap types aborts the run.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::diagnostic::GenError;
use crate::ir::{TypeMap, REQUIRED_CUSTOM_TYPES};

/// Root key marking an API document.
pub const API_MARKER_KEY: &str = "openapi";

/// Optional metadata section.
pub const INFO_KEY: &str = "info";

/// Validates the required top-level sections of a primary document.
pub fn validate_document(document: &Value, path: &Path) -> Result<(), GenError> {
    if is_blank(document.get(API_MARKER_KEY)) {
        return Err(GenError::MissingSection {
            path: path.to_path_buf(),
            section: API_MARKER_KEY.to_string(),
        });
    }

    let has_schemas = document
        .get("components")
        .and_then(|c| c.get("schemas"))
        .map(Value::is_object)
        .unwrap_or(false);
    if !has_schemas {
        return Err(GenError::MissingSection {
            path: path.to_path_buf(),
            section: "components.schemas".to_string(),
        });
    }

    if is_blank(document.get(INFO_KEY)) {
        warn!(
            file = %path.display(),
            "info: field would be convenient to show users what this API is about"
        );
    }

    Ok(())
}

/// Checks that the merged registry declares every bootstrap type.
pub fn validate_custom_types(types: &TypeMap) -> Result<(), GenError> {
    for name in REQUIRED_CUSTOM_TYPES {
        let declared = types.get(name).map(|t| !is_blank(Some(&t.raw))).unwrap_or(false);
        if !declared {
            return Err(GenError::MissingCustomType {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}
