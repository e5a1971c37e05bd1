//! YAML frontend.

use std::path::Path;

use serde_json::Value;

use super::Frontend;
use crate::diagnostic::GenError;

/// Parses YAML documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlFrontend;

impl Frontend for YamlFrontend {
    fn format(&self) -> &str {
        "yaml"
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn parse_document(&self, source: &str, path: &Path) -> Result<Value, GenError> {
        serde_yaml::from_str(source).map_err(|e| GenError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
