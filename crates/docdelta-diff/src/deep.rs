//! Deep structural diff: compare two nested documents and summarize the
//! changes as three trees mirroring the input shape.
//!
//! ```
//! use docdelta_diff::diff_default;
//! use serde_json::json;
//!
//! let old = json!({"a": 0, "c": {"d": 2}});
//! let new = json!({"a": 1, "c": {"d": 2}, "y": "1"});
//! let summary = diff_default(old.as_object().unwrap(), new.as_object().unwrap());
//!
//! assert_eq!(
//!     serde_json::to_value(&summary).unwrap(),
//!     json!({
//!         "updated": {"a": {"old": 0, "new": 1}},
//!         "created": {"y": "1"}
//!     })
//! );
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use docdelta_types::{ChangeFilter, ChangeKind, Document, KeyPath};

use crate::walk::{walk, ChangeSink};

/// Categorized changes between two documents.
///
/// Each branch is a nested document shaped like the input at the point of
/// change. Under `updated`, every changed leaf becomes `{"old": .., "new": ..}`.
/// Empty branches are omitted when serialized, so the summary of two equal
/// documents serializes as `{}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    #[serde(default, skip_serializing_if = "Document::is_empty")]
    pub deleted: Document,
    #[serde(default, skip_serializing_if = "Document::is_empty")]
    pub updated: Document,
    #[serde(default, skip_serializing_if = "Document::is_empty")]
    pub created: Document,
}

impl DiffSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no change of any kind was recorded.
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.updated.is_empty() && self.created.is_empty()
    }

    /// The branch holding changes of `kind`.
    pub fn branch(&self, kind: ChangeKind) -> &Document {
        match kind {
            ChangeKind::Created => &self.created,
            ChangeKind::Updated => &self.updated,
            ChangeKind::Deleted => &self.deleted,
        }
    }

    /// The summary as a plain nested document, empty branches omitted.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        for kind in ChangeKind::ALL {
            let branch = self.branch(kind);
            if !branch.is_empty() {
                doc.insert(kind.as_str().to_string(), Value::Object(branch.clone()));
            }
        }
        doc
    }
}

impl ChangeSink for DiffSummary {
    fn deleted(&mut self, path: &KeyPath, old: &Value) {
        insert_at(&mut self.deleted, path, old.clone());
    }

    fn updated(&mut self, path: &KeyPath, old: &Value, new: &Value) {
        insert_at(&mut self.updated, path, json!({"old": old, "new": new}));
    }

    fn created(&mut self, path: &KeyPath, new: &Value) {
        insert_at(&mut self.created, path, new.clone());
    }
}

/// Place `value` at `path` inside `branch`, creating the enclosing mappings.
///
/// Within one branch no recorded path is a prefix of another, so an existing
/// intermediate is always a mapping.
fn insert_at(branch: &mut Document, path: &KeyPath, value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = branch;
    for key in parents {
        let slot = node
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Document::new()));
        node = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    node.insert(last.to_string(), value);
}

/// Compute the categorized diff from `old` to `new` under `filter`.
pub fn diff(old: &Document, new: &Document, filter: &ChangeFilter) -> DiffSummary {
    let mut summary = DiffSummary::new();
    walk(old, new, filter, &mut summary);

    debug!(
        deleted = summary.deleted.len(),
        updated = summary.updated.len(),
        created = summary.created.len(),
        "computed deep diff"
    );
    summary
}

/// [`diff`] with the default filter: every category, no excluded keys.
pub fn diff_default(old: &Document, new: &Document) -> DiffSummary {
    diff(old, new, &ChangeFilter::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdelta_types::IDENTITY_KEY;
    use proptest::prelude::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    fn scenario() -> (Document, Document) {
        (
            doc(json!({"a": 0, "b": 1, "c": {"d": 2, "e": 3, "x": 4}, "x": "0"})),
            doc(json!({"a": 1, "b": 1, "c": {"d": 1, "e": 3, "y": 4}, "y": "1"})),
        )
    }

    #[test]
    fn nested_scenario() {
        let (old, new) = scenario();
        let summary = diff_default(&old, &new);

        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "deleted": {"c": {"x": 4}, "x": "0"},
                "updated": {"a": {"old": 0, "new": 1}, "c": {"d": {"old": 2, "new": 1}}},
                "created": {"c": {"y": 4}, "y": "1"}
            })
        );
        assert_eq!(Value::Object(summary.to_document()), serde_json::to_value(&summary).unwrap());
    }

    #[test]
    fn identical_documents_no_diff() {
        let (old, _) = scenario();
        let summary = diff_default(&old, &old);
        assert!(summary.is_empty());
        assert_eq!(serde_json::to_value(&summary).unwrap(), json!({}));
        assert!(summary.to_document().is_empty());
    }

    #[test]
    fn empty_to_populated_all_created() {
        let new = doc(json!({"x": 42, "y": {"z": true}}));
        let summary = diff_default(&Document::new(), &new);
        assert!(summary.deleted.is_empty());
        assert!(summary.updated.is_empty());
        assert_eq!(summary.created, new);
    }

    #[test]
    fn populated_to_empty_all_deleted() {
        let old = doc(json!({"x": 42}));
        let summary = diff_default(&old, &Document::new());
        assert_eq!(summary.deleted, old);
        assert!(summary.created.is_empty());
    }

    #[test]
    fn arrays_are_replaced_whole() {
        let old = doc(json!({"tags": [1, 2, 3]}));
        let new = doc(json!({"tags": [1, 2, 4]}));
        let summary = diff_default(&old, &new);
        assert_eq!(
            summary.updated["tags"],
            json!({"old": [1, 2, 3], "new": [1, 2, 4]})
        );
    }

    #[test]
    fn mapping_to_scalar_is_an_update() {
        let old = doc(json!({"n": {"a": 1}}));
        let new = doc(json!({"n": 5}));
        let summary = diff_default(&old, &new);
        assert_eq!(summary.updated["n"], json!({"old": {"a": 1}, "new": 5}));
        assert!(summary.deleted.is_empty());
    }

    #[test]
    fn type_change_detected() {
        let old = doc(json!({"value": 42}));
        let new = doc(json!({"value": "forty-two"}));
        let summary = diff_default(&old, &new);
        assert_eq!(summary.updated.len(), 1);
    }

    #[test]
    fn categories_limit_reporting() {
        let (old, new) = scenario();
        let filter = ChangeFilter::default().with_categories([ChangeKind::Updated]);
        let summary = diff(&old, &new, &filter);
        assert!(summary.created.is_empty());
        assert!(summary.deleted.is_empty());
        assert_eq!(summary.updated["a"], json!({"old": 0, "new": 1}));
    }

    #[test]
    fn excluded_keys_skip_delete_and_update() {
        let old = doc(json!({"_id": 1, "gone": true, "n": {"_id": 2}}));
        let new = doc(json!({"_id": 9, "n": {"_id": 3}}));
        let summary = diff(&old, &new, &ChangeFilter::identity_protected());
        assert!(summary.updated.is_empty());
        assert_eq!(Value::Object(summary.deleted), json!({"gone": true}));
    }

    #[test]
    fn grab_polarity_only_reports_listed_keys() {
        let (old, new) = scenario();
        let filter = ChangeFilter::default().only(["d", "x"]);
        let summary = diff(&old, &new, &filter);

        assert_eq!(
            Value::Object(summary.updated),
            json!({"c": {"d": {"old": 2, "new": 1}}})
        );
        assert_eq!(Value::Object(summary.deleted), json!({"c": {"x": 4}, "x": "0"}));
        // creation is never filtered by the grab-list
        assert_eq!(Value::Object(summary.created), json!({"c": {"y": 4}, "y": "1"}));
    }

    #[test]
    fn created_keys_ignore_grab_list() {
        let old = doc(json!({}));
        let new = doc(json!({"_id": 1}));
        let summary = diff(&old, &new, &ChangeFilter::identity_protected());
        assert_eq!(summary.created["_id"], json!(1));
    }

    #[test]
    fn excluded_mapping_shields_its_subtree() {
        let old = doc(json!({"_id": {"shard": 1, "seq": 7}, "n": 1}));
        let new = doc(json!({"_id": {"shard": 2, "zone": "eu"}, "n": 1}));
        let summary = diff(&old, &new, &ChangeFilter::identity_protected());

        assert!(summary.deleted.is_empty());
        assert!(summary.updated.is_empty());
        // new keys below an excluded key are still reported
        assert_eq!(Value::Object(summary.created), json!({"_id": {"zone": "eu"}}));
    }

    #[test]
    fn grabbed_mapping_reports_its_whole_subtree() {
        let old = doc(json!({"meta": {"a": 1, "b": {"c": 2}}, "other": {"a": 1}}));
        let new = doc(json!({"meta": {"a": 2, "b": {}}, "other": {"a": 5}}));
        let summary = diff(&old, &new, &ChangeFilter::default().only(["meta"]));

        assert_eq!(
            Value::Object(summary.updated),
            json!({"meta": {"a": {"old": 1, "new": 2}}})
        );
        assert_eq!(Value::Object(summary.deleted), json!({"meta": {"b": {"c": 2}}}));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (-3i64..3).prop_map(Value::from),
            "[a-c]{0,2}".prop_map(Value::from),
            prop::collection::vec(0i64..3, 0..3).prop_map(|v| json!(v)),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect()))
        })
    }

    fn document() -> impl Strategy<Value = Document> {
        prop::collection::btree_map("_id|[a-d]", value(), 0..5)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn diff_of_equal_documents_is_empty(d in document()) {
            prop_assert!(diff_default(&d, &d).is_empty());
        }

        #[test]
        fn identity_key_never_deleted_or_updated(old in document(), new in document()) {
            let summary = diff(&old, &new, &ChangeFilter::identity_protected());
            prop_assert!(!summary.deleted.contains_key(IDENTITY_KEY));
            prop_assert!(!summary.updated.contains_key(IDENTITY_KEY));
        }

        #[test]
        fn summary_is_empty_iff_documents_equal(old in document(), new in document()) {
            prop_assert_eq!(diff_default(&old, &new).is_empty(), old == new);
        }
    }
}
