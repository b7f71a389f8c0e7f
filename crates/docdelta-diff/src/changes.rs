//! Flat change list: the same comparison as [`diff`](crate::diff), reported
//! as one entry per changed path instead of a nested summary.
//!
//! Useful wherever changes are consumed one at a time, e.g. audit logs or
//! line-oriented rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use docdelta_types::{ChangeFilter, ChangeKind, Document, KeyPath};

use crate::walk::{walk, ChangeSink};

/// The list of changes between two documents, in walk order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of changes of `kind`.
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}

/// A single change at a path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Change {
    /// A key was removed.
    Deleted { path: KeyPath, value: Value },
    /// A leaf value changed.
    Updated { path: KeyPath, old: Value, new: Value },
    /// A key was added.
    Created { path: KeyPath, value: Value },
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Deleted { .. } => ChangeKind::Deleted,
            Self::Updated { .. } => ChangeKind::Updated,
            Self::Created { .. } => ChangeKind::Created,
        }
    }

    pub fn path(&self) -> &KeyPath {
        match self {
            Self::Deleted { path, .. } | Self::Updated { path, .. } | Self::Created { path, .. } => {
                path
            }
        }
    }
}

impl ChangeSink for ChangeSet {
    fn deleted(&mut self, path: &KeyPath, old: &Value) {
        self.changes.push(Change::Deleted {
            path: path.clone(),
            value: old.clone(),
        });
    }

    fn updated(&mut self, path: &KeyPath, old: &Value, new: &Value) {
        self.changes.push(Change::Updated {
            path: path.clone(),
            old: old.clone(),
            new: new.clone(),
        });
    }

    fn created(&mut self, path: &KeyPath, new: &Value) {
        self.changes.push(Change::Created {
            path: path.clone(),
            value: new.clone(),
        });
    }
}

/// Compute the flat list of changes from `old` to `new` under `filter`.
pub fn list_changes(old: &Document, new: &Document, filter: &ChangeFilter) -> ChangeSet {
    let mut set = ChangeSet::new();
    walk(old, new, filter, &mut set);
    set
}
