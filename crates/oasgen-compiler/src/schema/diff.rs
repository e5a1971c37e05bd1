//! Type-level diff between the current schema and a previous run.
//!
//! Each type is classified as:
//!
//! - **New**: only in the current schema
//! - **Changed**: in both, with different columns or relations
//! - **Unchanged**: in both and structurally equal
//! - **Removed**: only in the previous run; reported, never deleted from disk
//!
//! Columns compare by name, declared data type and format. An edge needs a
//! reference on both sides, so when a type's relations appear, disappear or
//! change, every type it references (before or after) is Changed as well.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ir::{PropertyDef, TypeMap};

/// Classification of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    New,
    Changed,
    Unchanged,
    Removed,
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiffStatus::New => "new",
            DiffStatus::Changed => "changed",
            DiffStatus::Unchanged => "unchanged",
            DiffStatus::Removed => "removed",
        };
        f.write_str(label)
    }
}

/// A change to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    /// A column was added.
    Added { column: PropertyDef },

    /// A column was removed.
    Removed { column: PropertyDef },

    /// A column's type or format changed.
    TypeChanged {
        old_column: PropertyDef,
        new_column: PropertyDef,
    },
}

impl PropertyChange {
    pub fn name(&self) -> &str {
        match self {
            PropertyChange::Added { column } | PropertyChange::Removed { column } => &column.name,
            PropertyChange::TypeChanged { new_column, .. } => &new_column.name,
        }
    }
}

/// Diff entry for a single type.
#[derive(Debug, Clone)]
pub struct TypeDiff {
    pub status: DiffStatus,
    /// Column changes, empty unless `status` is `Changed`.
    pub changes: Vec<PropertyChange>,
    /// Whether the relation declarations differ.
    pub relations_changed: bool,
    /// Whether a type referencing this one changed its relations.
    pub counterpart_changed: bool,
}

impl TypeDiff {
    fn new(status: DiffStatus) -> Self {
        Self {
            status,
            changes: Vec::new(),
            relations_changed: false,
            counterpart_changed: false,
        }
    }
}

/// Diff of a whole registry, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    entries: BTreeMap<String, TypeDiff>,
}

impl DiffResult {
    /// Status of `name`, if the type appears on either side.
    pub fn status(&self, name: &str) -> Option<DiffStatus> {
        self.entries.get(name).map(|e| e.status)
    }

    /// Diff entry of `name`.
    pub fn get(&self, name: &str) -> Option<&TypeDiff> {
        self.entries.get(name)
    }

    /// Column changes of `name`.
    pub fn changes(&self, name: &str) -> &[PropertyChange] {
        self.entries
            .get(name)
            .map(|e| e.changes.as_slice())
            .unwrap_or(&[])
    }

    /// Names with the given status, alphabetically.
    pub fn with_status(&self, status: DiffStatus) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.status == status)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether every type is unchanged.
    pub fn is_unchanged(&self) -> bool {
        self.entries.values().all(|e| e.status == DiffStatus::Unchanged)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeDiff)> {
        self.entries.iter().map(|(name, e)| (name.as_str(), e))
    }

    /// Formats every non-unchanged type for display.
    pub fn format_changes(&self) -> String {
        let mut lines = Vec::new();

        for (name, entry) in &self.entries {
            let marker = match entry.status {
                DiffStatus::New => '+',
                DiffStatus::Removed => '-',
                DiffStatus::Changed => '~',
                DiffStatus::Unchanged => continue,
            };
            lines.push(format!("{} {} ({})", marker, name, entry.status));

            for change in &entry.changes {
                let desc = match change {
                    PropertyChange::Added { column } => {
                        format!("+ Column '{}': {}", column.name, declared_type(column))
                    }
                    PropertyChange::Removed { column } => {
                        format!("- Column '{}' removed", column.name)
                    }
                    PropertyChange::TypeChanged {
                        old_column,
                        new_column,
                    } => format!(
                        "~ Column '{}' type changed: {} -> {}",
                        new_column.name,
                        declared_type(old_column),
                        declared_type(new_column)
                    ),
                };
                lines.push(format!("    {}", desc));
            }

            if entry.relations_changed {
                lines.push("    ~ Relations changed".to_string());
            }
            if entry.counterpart_changed {
                lines.push("    ~ Referenced by a type whose relations changed".to_string());
            }
        }

        lines.join("\n")
    }
}

/// Compares two registries.
pub fn diff_types(current: &TypeMap, historical: &TypeMap) -> DiffResult {
    let mut entries = BTreeMap::new();

    for (name, def) in current {
        let entry = match historical.get(name) {
            None => TypeDiff::new(DiffStatus::New),
            Some(previous) => {
                let changes = diff_columns(&previous.columns, &def.columns);
                let relations_changed = previous.relations != def.relations;
                let status = if changes.is_empty() && !relations_changed {
                    DiffStatus::Unchanged
                } else {
                    DiffStatus::Changed
                };
                TypeDiff {
                    changes,
                    relations_changed,
                    ..TypeDiff::new(status)
                }
            }
        };
        entries.insert(name.clone(), entry);
    }

    for name in historical.keys() {
        if !current.contains_key(name) {
            entries.insert(name.clone(), TypeDiff::new(DiffStatus::Removed));
        }
    }

    let counterparts: BTreeSet<&str> = entries
        .iter()
        .filter(|(_, e)| {
            e.relations_changed || matches!(e.status, DiffStatus::New | DiffStatus::Removed)
        })
        .flat_map(move |(name, _)| {
            current
                .get(name)
                .into_iter()
                .chain(historical.get(name))
                .flat_map(|def| def.relations.iter().map(|r| r.target.as_str()))
        })
        .collect();

    for target in counterparts {
        if let Some(entry) = entries.get_mut(target) {
            if entry.status == DiffStatus::Unchanged {
                entry.status = DiffStatus::Changed;
                entry.counterpart_changed = true;
            }
        }
    }

    DiffResult { entries }
}

/// Column changes from `old` to `new`: removals and type changes in the old
/// order, then additions in the new order.
pub fn diff_columns(old: &[PropertyDef], new: &[PropertyDef]) -> Vec<PropertyChange> {
    let mut changes = Vec::new();

    for previous in old {
        match new.iter().find(|c| c.name == previous.name) {
            None => changes.push(PropertyChange::Removed {
                column: previous.clone(),
            }),
            Some(current) if !current.same_declaration(previous) => {
                changes.push(PropertyChange::TypeChanged {
                    old_column: previous.clone(),
                    new_column: current.clone(),
                });
            }
            Some(_) => {}
        }
    }

    for current in new {
        if !old.iter().any(|c| c.name == current.name) {
            changes.push(PropertyChange::Added {
                column: current.clone(),
            });
        }
    }

    changes
}

fn declared_type(column: &PropertyDef) -> String {
    match &column.format {
        Some(format) => format!("{}({})", column.data_type, format),
        None => column.data_type.clone(),
    }
}
