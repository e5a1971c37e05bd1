//! Structured-document frontends.
//!
//! A frontend turns the bytes of a schema document into a nested key/value
//! tree. YAML and JSON parse to the same shape, so everything downstream of
//! the frontend is format-agnostic. The frontend is picked by file extension.

mod json;
mod yaml;

pub use json::JsonFrontend;
pub use yaml::YamlFrontend;

use std::path::Path;

use serde_json::Value;

use crate::diagnostic::GenError;

/// Trait for document frontends.
pub trait Frontend {
    /// Returns the format name (e.g., "yaml", "json").
    fn format(&self) -> &str;

    /// Returns file extensions this frontend handles.
    fn extensions(&self) -> &[&str];

    /// Parses document text into a mapping tree.
    fn parse_document(&self, source: &str, path: &Path) -> Result<Value, GenError>;
}

/// Creates a frontend for the given file extension.
pub fn create_frontend(extension: &str) -> Result<Box<dyn Frontend>, GenError> {
    let extension = extension.to_ascii_lowercase();
    let frontends: [Box<dyn Frontend>; 2] = [Box::new(YamlFrontend), Box::new(JsonFrontend)];
    frontends
        .into_iter()
        .find(|f| f.extensions().contains(&extension.as_str()))
        .ok_or(GenError::UnsupportedFormat { extension })
}

/// Creates the frontend matching `path`'s extension.
pub fn frontend_for_path(path: &Path) -> Result<Box<dyn Frontend>, GenError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    create_frontend(&extension)
}
