//! Partial-update directives: the flat, dotted-path form of a deep diff.
//!
//! Created and updated leaves become `$set` entries holding the new value;
//! deleted keys become `$unset` entries holding an empty marker. A directive
//! with neither section is a no-op.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use docdelta_path::{delete, set, PathError};
use docdelta_types::{ChangeFilter, Document, KeyPath};

use crate::error::DiffResult;
use crate::walk::{walk, ChangeSink};

/// Value stored against every `$unset` path.
pub const UNSET_MARKER: &str = "";

/// Minimal `$set` / `$unset` update transforming one document into another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDirective {
    /// Dotted path to new value.
    #[serde(rename = "$set", default, skip_serializing_if = "Document::is_empty")]
    pub set: Document,
    /// Dotted path to [`UNSET_MARKER`].
    #[serde(rename = "$unset", default, skip_serializing_if = "Document::is_empty")]
    pub unset: Document,
}

impl UpdateDirective {
    /// Create an empty directive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if applying the directive would change nothing.
    pub fn is_noop(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Total number of `$set` and `$unset` entries.
    pub fn len(&self) -> usize {
        self.set.len() + self.unset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_noop()
    }

    /// Apply the directive to `doc` in place, the way a document store would.
    ///
    /// `$unset` paths that are already absent are ignored. Directive keys are
    /// split on `.`, so document keys containing dots cannot be addressed.
    pub fn apply(&self, doc: &mut Document) -> DiffResult<()> {
        for path in self.unset.keys() {
            match delete(doc, KeyPath::parse(path)) {
                Ok(_) | Err(PathError::KeyNotFound { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
        for (path, value) in &self.set {
            set(doc, KeyPath::parse(path), value.clone())?;
        }
        Ok(())
    }
}

impl ChangeSink for UpdateDirective {
    fn deleted(&mut self, path: &KeyPath, _old: &Value) {
        self.unset.insert(path.dotted(), Value::from(UNSET_MARKER));
    }

    fn updated(&mut self, path: &KeyPath, _old: &Value, new: &Value) {
        self.set.insert(path.dotted(), new.clone());
    }

    fn created(&mut self, path: &KeyPath, new: &Value) {
        self.set.insert(path.dotted(), new.clone());
    }
}

/// Compute the minimal update from `old` to `new`, never touching `_id`.
pub fn compute_update(old: &Document, new: &Document) -> UpdateDirective {
    compute_update_with(old, new, &ChangeFilter::identity_protected())
}

/// Compute the minimal update from `old` to `new` under an explicit filter.
pub fn compute_update_with(
    old: &Document,
    new: &Document,
    filter: &ChangeFilter,
) -> UpdateDirective {
    let mut directive = UpdateDirective::new();
    walk(old, new, filter, &mut directive);

    debug!(
        set = directive.set.len(),
        unset = directive.unset.len(),
        "compiled update directive"
    );
    directive
}
