//! Validation of schema documents and the merged registry.

mod structure;

pub use structure::{validate_custom_types, validate_document};
