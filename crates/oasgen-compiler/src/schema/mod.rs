//! Schema history, rollback and change detection.
//!
//! This module keeps generation runs reproducible:
//!
//! 1. Snapshotting the schema documents consumed by each run
//! 2. Resolving rollback selectors to a recorded run
//! 3. Diffing the current schema against the latest run to gate merge mode

pub mod diff;
pub mod history;
pub mod rollback;

pub use diff::{diff_columns, diff_types, DiffResult, DiffStatus, PropertyChange, TypeDiff};
pub use history::{GenerationRun, HistoryStore, RunManifest, MANIFEST_FILE};
pub use rollback::RollbackSelector;
