//! Generator error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while loading a schema or generating artifacts.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum GenError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(oasgen::io::access_failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Schema Format Errors (fatal, raised before any write)
    // =========================================================================
    #[error("Failed to parse schema document '{}': {message}", path.display())]
    #[diagnostic(code(oasgen::schema::parse_failed))]
    ParseFailed {
        path: PathBuf,
        message: String,
    },

    #[error("Unsupported schema document format: '{extension}'")]
    #[diagnostic(
        code(oasgen::schema::unsupported_format),
        help("Schema documents must use a .yaml, .yml or .json extension")
    )]
    UnsupportedFormat {
        extension: String,
    },

    #[error("Schema document '{}' is missing required section '{section}'", path.display())]
    #[diagnostic(
        code(oasgen::schema::missing_section),
        help("A schema needs an `openapi` key and a `components.schemas` mapping")
    )]
    MissingSection {
        path: PathBuf,
        section: String,
    },

    #[error("Schema is missing the bootstrap type '{name}'")]
    #[diagnostic(
        code(oasgen::schema::missing_custom_type),
        help("Declare ID, Type and RelationshipsDataItem under components.schemas")
    )]
    MissingCustomType {
        name: String,
    },

    #[error("Type '{name}' from '{}' conflicts with an earlier definition of a different shape", path.display())]
    #[diagnostic(
        code(oasgen::schema::shape_conflict),
        help("Rename one of the types or make both definitions identical")
    )]
    ShapeConflict {
        name: String,
        path: PathBuf,
    },

    // =========================================================================
    // Relation Errors (non-fatal, the edge is skipped)
    // =========================================================================
    #[error("Cannot resolve relation {owner} -> {target}: {reason}")]
    #[diagnostic(code(oasgen::relation::ambiguous))]
    RelationAmbiguity {
        owner: String,
        target: String,
        reason: String,
    },

    // =========================================================================
    // History Errors
    // =========================================================================
    #[error("No generation run matches rollback selector '{selector}'")]
    #[diagnostic(
        code(oasgen::history::rollback_target_not_found),
        help("Run `oasgen history` to list the recorded runs")
    )]
    RollbackTargetNotFound {
        selector: String,
    },

    #[error("Invalid rollback selector '{selector}'")]
    #[diagnostic(
        code(oasgen::history::invalid_selector),
        help("Use `most recent`, a positive step count, or a date like 2024-05-01 [13:45:00]")
    )]
    InvalidRollbackSelector {
        selector: String,
    },

    #[error("Failed to record generation history at '{}': {message}", path.display())]
    #[diagnostic(code(oasgen::history::snapshot_failed))]
    HistorySnapshot {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Code Generation Errors
    // =========================================================================
    #[error("Previously generated file '{}' has no '{marker}' marker", path.display())]
    #[diagnostic(
        code(oasgen::codegen::marker_missing),
        help("The file was edited inside a generated region; regenerate it with --regenerate or restore the marker comments")
    )]
    ArtifactMarkerMissing {
        path: PathBuf,
        marker: String,
    },
}

impl GenError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run rather than a single entity or file.
    pub fn is_fatal(&self) -> bool {
        match self {
            GenError::RelationAmbiguity { .. }
            | GenError::ArtifactMarkerMissing { .. }
            | GenError::HistorySnapshot { .. } => false,
            GenError::IoError { .. }
            | GenError::ParseFailed { .. }
            | GenError::UnsupportedFormat { .. }
            | GenError::MissingSection { .. }
            | GenError::MissingCustomType { .. }
            | GenError::ShapeConflict { .. }
            | GenError::RollbackTargetNotFound { .. }
            | GenError::InvalidRollbackSelector { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_follows_propagation_policy() {
        assert!(GenError::MissingCustomType { name: "ID".into() }.is_fatal());
        assert!(GenError::RollbackTargetNotFound { selector: "3".into() }.is_fatal());
        assert!(!GenError::RelationAmbiguity {
            owner: "Post".into(),
            target: "Tag".into(),
            reason: "unknown type".into(),
        }
        .is_fatal());
        assert!(!GenError::ArtifactMarkerMissing {
            path: "Post.php".into(),
            marker: "props".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_display_includes_path() {
        let err = GenError::io("modules/V1/Entities/Post.php", "permission denied");
        assert_eq!(
            err.to_string(),
            "Failed to access 'modules/V1/Entities/Post.php': permission denied"
        );
    }
}
