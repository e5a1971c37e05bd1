//! Write policy for generated artifacts.
//!
//! - absent file: created
//! - existing file, merge mode: merged with the fresh unit
//! - existing file, regenerate: overwritten
//! - existing file otherwise: left untouched
//!
//! Text identical to what is on disk is never rewritten.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::assembler::{splice, AssemblyUnit};
use crate::context::GenerateOptions;
use crate::diagnostic::GenError;
use crate::fs::FileStore;

/// What happened to one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

impl FileAction {
    /// Whether the file was written.
    pub fn is_write(&self) -> bool {
        matches!(self, FileAction::Created | FileAction::Updated)
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileAction::Created => "created",
            FileAction::Updated => "updated",
            FileAction::Unchanged => "unchanged",
            FileAction::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Outcome of writing one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub action: FileAction,
}

/// Applies the write policy through a [`FileStore`].
pub struct ArtifactWriter<'a> {
    fs: &'a dyn FileStore,
    options: GenerateOptions,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new(fs: &'a dyn FileStore, options: GenerateOptions) -> Self {
        Self { fs, options }
    }

    /// Writes `unit` to `path` according to the write policy.
    ///
    /// In merge mode an existing file without region markers yields
    /// [`GenError::ArtifactMarkerMissing`] and is left as it is.
    pub fn write(&self, path: &Path, unit: AssemblyUnit) -> Result<FileOutcome, GenError> {
        if !self.fs.exists(path) {
            self.fs.write(path, &unit.render())?;
            info!(file = %path.display(), "created");
            return Ok(outcome(path, FileAction::Created));
        }

        let existing = self.fs.read_to_string(path)?;
        let text = if self.options.merge {
            splice(&existing, path, unit)?
        } else if self.options.regenerate {
            unit.render()
        } else {
            debug!(file = %path.display(), "exists, not regenerated");
            return Ok(outcome(path, FileAction::Skipped));
        };

        if text == existing {
            debug!(file = %path.display(), "unchanged");
            return Ok(outcome(path, FileAction::Unchanged));
        }

        self.fs.write(path, &text)?;
        info!(file = %path.display(), "updated");
        Ok(outcome(path, FileAction::Updated))
    }
}

fn outcome(path: &Path, action: FileAction) -> FileOutcome {
    FileOutcome {
        path: path.to_path_buf(),
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::assembler::{CodeAssembler, PropertyDecl, Visibility};
    use crate::fs::OsFileStore;
    use tempfile::TempDir;

    fn unit(table: &str) -> AssemblyUnit {
        let mut asm = CodeAssembler::new();
        asm.start_class("Post", Some("BaseModel")).property(
            PropertyDecl::new(Visibility::Protected, "table").with_default(format!("'{}'", table)),
        );
        asm.finish()
    }

    #[test]
    fn test_create_then_skip_without_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Entities/Post.php");
        let writer = ArtifactWriter::new(&OsFileStore, GenerateOptions::default());

        assert_eq!(writer.write(&path, unit("post")).unwrap().action, FileAction::Created);
        assert_eq!(writer.write(&path, unit("posts")).unwrap().action, FileAction::Skipped);
        assert!(OsFileStore.read_to_string(&path).unwrap().contains("'post'"));
    }

    #[test]
    fn test_regenerate_overwrites_only_on_difference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Post.php");
        let options = GenerateOptions {
            regenerate: true,
            ..GenerateOptions::default()
        };
        let writer = ArtifactWriter::new(&OsFileStore, options);

        writer.write(&path, unit("post")).unwrap();
        assert_eq!(writer.write(&path, unit("post")).unwrap().action, FileAction::Unchanged);
        assert_eq!(writer.write(&path, unit("posts")).unwrap().action, FileAction::Updated);
    }

    #[test]
    fn test_merge_reports_missing_marker_and_keeps_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Post.php");
        OsFileStore.write(&path, "<?php\n\nclass Post\n{\n}\n").unwrap();
        let options = GenerateOptions {
            merge: true,
            ..GenerateOptions::default()
        };

        let err = ArtifactWriter::new(&OsFileStore, options)
            .write(&path, unit("post"))
            .unwrap_err();

        assert!(matches!(err, GenError::ArtifactMarkerMissing { .. }));
        assert_eq!(
            OsFileStore.read_to_string(&path).unwrap(),
            "<?php\n\nclass Post\n{\n}\n"
        );
    }
}
