//! Generation history.
//!
//! Every successful, non-rollback run copies the schema documents it consumed
//! into its own directory under the history root:
//!
//! ```text
//! .gen/
//!   2024-05-01_184512/
//!     184512_00_api.yaml      primary document
//!     184512_01_common.yaml   includes, in load order
//!     run.json                manifest, written last
//! ```
//!
//! A run is assembled in a staging directory `.<run id>` and renamed into
//! place once its manifest is written, so a run directory without
//! `run.json` is never a recorded run. Such directories, dotfiles and other
//! entries that do not parse as a run id are ignored. Only this module
//! writes here.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::rollback::RollbackSelector;
use crate::diagnostic::GenError;
use crate::fs::{Clock, FileStore};

/// Layout of a run directory name.
pub const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Length of a formatted [`RUN_ID_FORMAT`] stamp.
const RUN_ID_LEN: usize = 17;

/// Layout of the time prefix of a snapshotted file.
const FILE_PREFIX_FORMAT: &str = "%H%M%S";

/// Manifest file name inside a run directory.
pub const MANIFEST_FILE: &str = "run.json";

/// One recorded generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRun {
    /// Directory name, e.g. `2024-05-01_184512` or `2024-05-01_184512_2`.
    pub id: String,
    pub created_at: NaiveDateTime,
    /// Disambiguates runs recorded within the same second.
    pub sequence: u32,
    pub dir: PathBuf,
}

impl GenerationRun {
    /// Parses a run directory name.
    pub fn parse(id: &str, root: &Path) -> Option<Self> {
        if id.starts_with('.') {
            return None;
        }

        let stamp = id.get(..RUN_ID_LEN)?;
        let rest = id.get(RUN_ID_LEN..)?;
        let created_at = NaiveDateTime::parse_from_str(stamp, RUN_ID_FORMAT).ok()?;
        let sequence = match rest {
            "" => 0,
            suffix => suffix.strip_prefix('_')?.parse().ok()?,
        };

        Some(Self {
            id: id.to_string(),
            created_at,
            sequence,
            dir: root.join(id),
        })
    }
}

/// Manifest recorded alongside the snapshotted files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    /// Generator version that recorded the run.
    #[serde(rename = "generatorVersion")]
    pub generator_version: String,

    #[serde(rename = "createdAt")]
    pub created_at: String,

    /// Snapshot file names, primary first.
    pub files: Vec<String>,

    /// Paths the files were copied from.
    pub sources: Vec<String>,
}

/// Reads and writes run snapshots below a history root.
pub struct HistoryStore<'a> {
    root: PathBuf,
    fs: &'a dyn FileStore,
    clock: &'a dyn Clock,
}

impl<'a> HistoryStore<'a> {
    pub fn new(root: impl Into<PathBuf>, fs: &'a dyn FileStore, clock: &'a dyn Clock) -> Self {
        Self {
            root: root.into(),
            fs,
            clock,
        }
    }

    /// Id for a run recorded now, unique among the existing runs.
    pub fn next_run_id(&self) -> Result<String, GenError> {
        let base = self.clock.now().format(RUN_ID_FORMAT).to_string();
        let existing = self.fs.list_dir(&self.root)?;

        if !existing.contains(&base) {
            return Ok(base);
        }

        let mut sequence = 2;
        loop {
            let candidate = format!("{}_{}", base, sequence);
            if !existing.contains(&candidate) {
                return Ok(candidate);
            }
            sequence += 1;
        }
    }

    /// Copies `files` into the directory of `run_id`, primary first.
    ///
    /// The files and the manifest are staged under `.<run id>` and the
    /// directory is renamed once complete. On failure the staging directory
    /// is removed and no run is recorded.
    pub fn snapshot(&self, files: &[PathBuf], run_id: &str) -> Result<GenerationRun, GenError> {
        let run = GenerationRun::parse(run_id, &self.root).ok_or_else(|| GenError::HistorySnapshot {
            path: self.root.join(run_id),
            message: "run id does not follow the run directory layout".to_string(),
        })?;
        let staging = self.root.join(format!(".{}", run.id));

        if self.fs.exists(&staging) {
            self.fs
                .remove_dir_all(&staging)
                .map_err(|e| snapshot_error(&staging, e))?;
        }

        let staged = self.stage(files, &run, &staging).and_then(|()| {
            self.fs
                .rename(&staging, &run.dir)
                .map_err(|e| snapshot_error(&run.dir, e))
        });

        if let Err(err) = staged {
            if self.fs.exists(&staging) {
                if let Err(cleanup) = self.fs.remove_dir_all(&staging) {
                    warn!(dir = %staging.display(), error = %cleanup, "staged snapshot not removed");
                }
            }
            return Err(err);
        }

        info!(run = %run.id, files = files.len(), "generation run recorded");
        Ok(run)
    }

    fn stage(&self, files: &[PathBuf], run: &GenerationRun, staging: &Path) -> Result<(), GenError> {
        self.fs
            .create_dir_all(staging)
            .map_err(|e| snapshot_error(staging, e))?;

        let prefix = self.clock.now().format(FILE_PREFIX_FORMAT).to_string();
        let mut names = Vec::with_capacity(files.len());

        for (index, source) in files.iter().enumerate() {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| GenError::HistorySnapshot {
                    path: source.clone(),
                    message: "schema path has no file name".to_string(),
                })?;
            let name = format!("{}_{:02}_{}", prefix, index, file_name);

            self.fs
                .copy_atomic(source, &staging.join(&name))
                .map_err(|e| snapshot_error(source, e))?;
            debug!(source = %source.display(), snapshot = %name, "schema file snapshotted");
            names.push(name);
        }

        let manifest = RunManifest {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: run.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            files: names,
            sources: files.iter().map(|f| f.display().to_string()).collect(),
        };
        let manifest_path = staging.join(MANIFEST_FILE);
        let content = serde_json::to_string_pretty(&manifest).map_err(|e| GenError::HistorySnapshot {
            path: manifest_path.clone(),
            message: format!("Failed to serialize manifest: {}", e),
        })?;
        self.fs
            .write(&manifest_path, &content)
            .map_err(|e| snapshot_error(&manifest_path, e))
    }

    /// Recorded runs, most recent first.
    pub fn list_runs(&self) -> Result<Vec<GenerationRun>, GenError> {
        let mut runs: Vec<GenerationRun> = self
            .fs
            .list_dir(&self.root)?
            .iter()
            .filter_map(|name| GenerationRun::parse(name, &self.root))
            .filter(|run| self.fs.exists(&run.dir.join(MANIFEST_FILE)))
            .collect();

        runs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        Ok(runs)
    }

    /// The latest run, if any.
    pub fn latest_run(&self) -> Result<Option<GenerationRun>, GenError> {
        Ok(self.list_runs()?.into_iter().next())
    }

    /// Schema files of the run picked by `selector`, primary first.
    pub fn resolve_rollback_target(&self, selector: &RollbackSelector) -> Result<Vec<PathBuf>, GenError> {
        let runs = self.list_runs()?;
        let not_found = || GenError::RollbackTargetNotFound {
            selector: selector.to_string(),
        };

        let run = selector.select(&runs).ok_or_else(not_found)?;
        let files = self.run_files(run)?;
        if files.is_empty() {
            return Err(not_found());
        }

        debug!(run = %run.id, files = files.len(), "rollback target resolved");
        Ok(files)
    }

    /// Schema files of `run`, primary first, as listed in its manifest.
    pub fn run_files(&self, run: &GenerationRun) -> Result<Vec<PathBuf>, GenError> {
        let manifest_path = run.dir.join(MANIFEST_FILE);
        let content = self.fs.read_to_string(&manifest_path)?;
        let manifest: RunManifest = serde_json::from_str(&content).map_err(|e| GenError::IoError {
            path: manifest_path.clone(),
            message: format!("Failed to parse run manifest: {}", e),
        })?;
        Ok(manifest.files.iter().map(|name| run.dir.join(name)).collect())
    }
}

fn snapshot_error(path: &Path, err: GenError) -> GenError {
    GenError::HistorySnapshot {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
