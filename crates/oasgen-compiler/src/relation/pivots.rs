//! Pivot ownership for many-to-many pairs.
//!
//! Both types of a many-to-many pair resolve the same edge, but only one pivot
//! artifact may exist. Within a run the first type to claim a pair owns it.
//! Across runs the entities directory is probed so a pivot written earlier,
//! in either name order, keeps being the one in use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::resolver::canonical_pair;
use crate::codegen::naming::table_name;
use crate::fs::FileStore;

/// Extension of generated class files.
pub const CLASS_EXTENSION: &str = "php";

/// How a many-to-many pair is materialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotPlan {
    /// Type whose name comes first in the pivot class name.
    pub first: String,
    /// Type whose name comes second.
    pub second: String,
    /// Pivot class file.
    pub path: PathBuf,
    /// Whether the caller owns the pivot artifact in this run.
    pub owned: bool,
}

impl PivotPlan {
    /// Pivot class name, e.g. `PostTag`.
    pub fn class_name(&self) -> String {
        format!("{}{}", self.first, self.second)
    }

    /// Join table name, e.g. `post_tag`.
    pub fn table(&self) -> String {
        format!("{}_{}", table_name(&self.first), table_name(&self.second))
    }
}

/// Tracks pivot claims for one generation run.
#[derive(Debug, Default)]
pub struct PivotRegistry {
    claims: BTreeMap<(String, String), PivotPlan>,
}

impl PivotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the pivot between `owner` and `other`.
    ///
    /// The first claim of a pair in this run returns an owned plan; later
    /// claims get the same plan with `owned` cleared. The plan names the
    /// existing file when one is found in `entities_dir`, preferring the
    /// canonical order, and the canonical order otherwise.
    pub fn claim(
        &mut self,
        owner: &str,
        other: &str,
        entities_dir: &Path,
        fs: &dyn FileStore,
    ) -> PivotPlan {
        let (first, second) = canonical_pair(owner, other);
        let key = (first.to_string(), second.to_string());

        if let Some(existing) = self.claims.get(&key) {
            debug!(owner, other, pivot = %existing.class_name(), "pivot already claimed this run");
            return PivotPlan {
                owned: false,
                ..existing.clone()
            };
        }

        let canonical = class_path(entities_dir, first, second);
        let inverse = class_path(entities_dir, second, first);

        let plan = if !fs.exists(&canonical) && first != second && fs.exists(&inverse) {
            debug!(pivot = %inverse.display(), "adopting pivot from a previous run");
            PivotPlan {
                first: second.to_string(),
                second: first.to_string(),
                path: inverse,
                owned: true,
            }
        } else {
            PivotPlan {
                first: first.to_string(),
                second: second.to_string(),
                path: canonical,
                owned: true,
            }
        };

        debug!(owner, pivot = %plan.class_name(), "pivot claimed");
        self.claims.insert(key, plan.clone());
        plan
    }
}

fn class_path(dir: &Path, first: &str, second: &str) -> PathBuf {
    dir.join(format!("{}{}.{}", first, second, CLASS_EXTENSION))
}
