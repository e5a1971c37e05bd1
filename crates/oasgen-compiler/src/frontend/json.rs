//! JSON frontend.

use std::path::Path;

use serde_json::Value;

use super::Frontend;
use crate::diagnostic::GenError;

/// Parses JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFrontend;

impl Frontend for JsonFrontend {
    fn format(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse_document(&self, source: &str, path: &Path) -> Result<Value, GenError> {
        serde_json::from_str(source).map_err(|e| GenError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
