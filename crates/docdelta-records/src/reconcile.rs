//! Three-way reconciliation of two record lists keyed by pivot fields.
//!
//! Both lists are sorted by their pivot tuples and walked in merge fashion:
//!
//! - a pivot present only in `old` -> the old record goes to `deleted`;
//! - a pivot present only in `new` -> the new record goes to `created`;
//! - a pivot present in both -> the pair is deep-diffed, and a non-empty diff
//!   goes to `changed` together with the full new record.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use docdelta_diff::{diff, DiffSummary};
use docdelta_types::{ChangeFilter, Document};

use crate::error::{RecordError, Result};
use crate::order::{compare_pivots, pivot_tuple};

/// A matched record pair whose contents differ.
///
/// Serializes as the diff summary's branches plus a `new` field holding the
/// full new record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedRecord {
    #[serde(flatten)]
    pub diff: DiffSummary,
    pub new: Document,
}

/// Outcome of reconciling two record lists, in pivot order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<ChangedRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<Document>,
}

impl Reconciliation {
    /// Returns `true` if the two lists held the same records.
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.changed.is_empty() && self.created.is_empty()
    }

    /// Total number of classified records.
    pub fn len(&self) -> usize {
        self.deleted.len() + self.changed.len() + self.created.len()
    }

    /// The reconciliation as a plain JSON value, empty sections omitted.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Reconcile `old` against `new` by `pivots`, diffing matched pairs under
/// `filter`.
///
/// Every record in both lists must carry every pivot field. Pivot values
/// should be unique within each list; duplicates are paired in sorted order.
pub fn reconcile<S: AsRef<str>>(
    old: &[Document],
    new: &[Document],
    pivots: &[S],
    filter: &ChangeFilter,
) -> Result<Reconciliation> {
    if pivots.is_empty() {
        return Err(RecordError::EmptyPivots);
    }

    let old_keyed = keyed(old, pivots)?;
    let new_keyed = keyed(new, pivots)?;

    let mut result = Reconciliation::default();
    let (mut i, mut j) = (0, 0);
    while i < old_keyed.len() && j < new_keyed.len() {
        let (old_key, old_record) = &old_keyed[i];
        let (new_key, new_record) = &new_keyed[j];
        match compare_pivots(old_key, new_key) {
            Ordering::Equal => {
                let summary = diff(old_record, new_record, filter);
                if !summary.is_empty() {
                    result.changed.push(ChangedRecord {
                        diff: summary,
                        new: (*new_record).clone(),
                    });
                }
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                result.deleted.push((*old_record).clone());
                i += 1;
            }
            Ordering::Greater => {
                result.created.push((*new_record).clone());
                j += 1;
            }
        }
    }
    result
        .deleted
        .extend(old_keyed[i..].iter().map(|(_, record)| (*record).clone()));
    result
        .created
        .extend(new_keyed[j..].iter().map(|(_, record)| (*record).clone()));

    debug!(
        old = old.len(),
        new = new.len(),
        deleted = result.deleted.len(),
        changed = result.changed.len(),
        created = result.created.len(),
        "reconciled record lists"
    );
    Ok(result)
}

/// Records paired with their pivot tuples, stably sorted by tuple.
fn keyed<'a, S: AsRef<str>>(
    records: &'a [Document],
    pivots: &[S],
) -> Result<Vec<(Vec<&'a Value>, &'a Document)>> {
    let mut keyed = records
        .iter()
        .map(|record| Ok((pivot_tuple(record, pivots)?, record)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| compare_pivots(a, b));
    Ok(keyed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdelta_types::ChangeKind;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn docs(value: Value) -> Vec<Document> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => map,
                    other => panic!("expected object, got {other:?}"),
                })
                .collect(),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn unchanged_match_contributes_nothing() {
        let old = docs(json!([{"k": 1, "a": 0}, {"k": 2, "c": 0}]));
        let new = docs(json!([{"k": 2, "c": 0}, {"k": 3, "b": 4}]));

        let result = reconcile(&old, &new, &["k"], &ChangeFilter::default()).unwrap();
        assert_eq!(
            result.to_value(),
            json!({
                "deleted": [{"k": 1, "a": 0}],
                "created": [{"k": 3, "b": 4}]
            })
        );
    }

    #[test]
    fn changed_pair_carries_diff_and_new_record() {
        let old = docs(json!([{"k": 1, "a": 0, "gone": true}]));
        let new = docs(json!([{"k": 1, "a": 5, "fresh": "y"}]));

        let result = reconcile(&old, &new, &["k"], &ChangeFilter::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.to_value(),
            json!({
                "changed": [{
                    "deleted": {"gone": true},
                    "updated": {"a": {"old": 0, "new": 5}},
                    "created": {"fresh": "y"},
                    "new": {"k": 1, "a": 5, "fresh": "y"}
                }]
            })
        );
    }

    #[test]
    fn inputs_need_not_be_sorted() {
        let old = docs(json!([{"k": 3}, {"k": 1}, {"k": 2}]));
        let new = docs(json!([{"k": 4}, {"k": 2}]));

        let result = reconcile(&old, &new, &["k"], &ChangeFilter::default()).unwrap();
        let deleted: Vec<_> = result.deleted.iter().map(|r| r["k"].clone()).collect();
        assert_eq!(deleted, vec![json!(1), json!(3)]);
        assert_eq!(result.created[0]["k"], json!(4));
        assert!(result.changed.is_empty());
    }

    #[test]
    fn composite_pivots() {
        let old = docs(json!([{"g": "a", "k": 1, "v": 0}, {"g": "b", "k": 1, "v": 0}]));
        let new = docs(json!([{"g": "a", "k": 1, "v": 1}, {"g": "a", "k": 2, "v": 0}]));

        let result = reconcile(&old, &new, &["g", "k"], &ChangeFilter::default()).unwrap();
        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.changed[0].new["v"], json!(1));
        assert_eq!(result.deleted[0]["g"], json!("b"));
        assert_eq!(result.created[0]["k"], json!(2));
    }

    #[test]
    fn filter_applies_to_matched_pairs() {
        let old = docs(json!([{"k": 1, "_id": "x", "n": 1}]));
        let new = docs(json!([{"k": 1, "_id": "y", "n": 1}]));

        let protected = ChangeFilter::identity_protected();
        assert!(reconcile(&old, &new, &["k"], &protected).unwrap().is_empty());

        let filter = ChangeFilter::default().with_categories([ChangeKind::Created]);
        assert!(reconcile(&old, &new, &["k"], &filter).unwrap().is_empty());

        let result = reconcile(&old, &new, &["k"], &ChangeFilter::default()).unwrap();
        assert_eq!(result.changed.len(), 1);
    }

    #[test]
    fn empty_lists() {
        let none: Vec<Document> = Vec::new();
        let some = docs(json!([{"k": 1}]));

        let result = reconcile(&none, &none, &["k"], &ChangeFilter::default()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.to_value(), json!({}));

        let result = reconcile(&some, &none, &["k"], &ChangeFilter::default()).unwrap();
        assert_eq!(result.deleted, some);

        let result = reconcile(&none, &some, &["k"], &ChangeFilter::default()).unwrap();
        assert_eq!(result.created, some);
    }

    #[test]
    fn missing_pivot_rejected() {
        let old = docs(json!([{"k": 1}]));
        let new = docs(json!([{"other": 1}]));
        let err = reconcile(&old, &new, &["k"], &ChangeFilter::default()).unwrap_err();
        assert_eq!(err, RecordError::MissingPivot { field: "k".into() });

        let none: [&str; 0] = [];
        assert_eq!(
            reconcile(&old, &old, &none, &ChangeFilter::default()),
            Err(RecordError::EmptyPivots)
        );
    }

    #[test]
    fn changed_record_deserializes() {
        let value = json!({"updated": {"a": {"old": 0, "new": 1}}, "new": {"k": 1, "a": 1}});
        let record: ChangedRecord = serde_json::from_value(value).unwrap();
        assert!(record.diff.created.is_empty());
        assert_eq!(record.diff.updated.len(), 1);
        assert_eq!(record.new["a"], json!(1));
    }

    fn keyed_records() -> impl Strategy<Value = BTreeMap<i64, Document>> {
        prop::collection::btree_map(
            0i64..30,
            prop::collection::btree_map("[a-c]", 0i64..2, 0..3)
                .prop_map(|m| m.into_iter().map(|(f, v)| (f, Value::from(v))).collect()),
            0..12,
        )
    }

    fn with_key(map: &BTreeMap<i64, Document>) -> Vec<Document> {
        map.iter()
            .rev()
            .map(|(k, fields)| {
                let mut record = fields.clone();
                record.insert("k".into(), Value::from(*k));
                record
            })
            .collect()
    }

    proptest! {
        #[test]
        fn every_record_lands_in_exactly_one_bucket(
            old_map in keyed_records(),
            new_map in keyed_records(),
        ) {
            let old = with_key(&old_map);
            let new = with_key(&new_map);
            let result = reconcile(&old, &new, &["k"], &ChangeFilter::default()).unwrap();

            let matched: Vec<i64> = old_map
                .keys()
                .filter(|k| new_map.contains_key(*k))
                .copied()
                .collect();
            let differing = matched.iter().filter(|k| old_map[*k] != new_map[*k]).count();

            prop_assert_eq!(result.deleted.len() + matched.len(), old.len());
            prop_assert_eq!(result.created.len() + matched.len(), new.len());
            prop_assert_eq!(result.changed.len(), differing);

            for record in &result.deleted {
                let k = record["k"].as_i64().unwrap();
                prop_assert!(!new_map.contains_key(&k));
            }
            for record in &result.created {
                let k = record["k"].as_i64().unwrap();
                prop_assert!(!old_map.contains_key(&k));
            }
            for change in &result.changed {
                let k = change.new["k"].as_i64().unwrap();
                prop_assert!(old_map.contains_key(&k));
                let mut expected = new_map[&k].clone();
                expected.insert("k".into(), Value::from(k));
                prop_assert_eq!(&change.new, &expected);
            }
        }
    }
}
