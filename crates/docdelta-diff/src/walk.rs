//! The recursive comparison shared by the summary and directive builders.

use serde_json::Value;
use tracing::trace;

use docdelta_types::{ChangeFilter, ChangeKind, Document, KeyPath};

/// Receives each change found by [`walk`]. `path` is the full location of the
/// changed key, never empty.
pub(crate) trait ChangeSink {
    fn deleted(&mut self, path: &KeyPath, old: &Value);
    fn updated(&mut self, path: &KeyPath, old: &Value, new: &Value);
    fn created(&mut self, path: &KeyPath, new: &Value);
}

/// How the grab-list applies to the keys of one mapping.
///
/// A key named in the grab-list decides for its whole subtree: with
/// `grab = false` nothing beneath it is deleted or updated, with `grab = true`
/// everything beneath it is. Keys not named in the list are tested one level
/// at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    PerKey,
    Included,
    Excluded,
}

impl Scope {
    fn reports(self, filter: &ChangeFilter, key: &str) -> bool {
        match self {
            Self::PerKey => filter.includes(key),
            Self::Included => true,
            Self::Excluded => false,
        }
    }

    fn below(self, filter: &ChangeFilter, key: &str) -> Self {
        match self {
            Self::PerKey if filter.keys.iter().any(|k| k == key) => {
                if filter.grab {
                    Self::Included
                } else {
                    Self::Excluded
                }
            }
            scope => scope,
        }
    }
}

/// Compare `old` and `new`, reporting every change to `sink`.
///
/// Deletions and updates are gated by the filter's categories and grab-list;
/// creations only by categories.
pub(crate) fn walk<S: ChangeSink>(
    old: &Document,
    new: &Document,
    filter: &ChangeFilter,
    sink: &mut S,
) {
    walk_level(old, new, filter, Scope::PerKey, &mut KeyPath::root(), sink);
}

fn walk_level<S: ChangeSink>(
    old: &Document,
    new: &Document,
    filter: &ChangeFilter,
    scope: Scope,
    path: &mut KeyPath,
    sink: &mut S,
) {
    if filter.wants(ChangeKind::Deleted) {
        for (key, old_val) in old {
            if !new.contains_key(key) && scope.reports(filter, key) {
                path.push(key.as_str());
                sink.deleted(path, old_val);
                path.pop();
            }
        }
    }

    for (key, old_val) in old {
        let Some(new_val) = new.get(key) else {
            continue;
        };
        path.push(key.as_str());
        match (old_val, new_val) {
            (Value::Object(old_map), Value::Object(new_map)) => {
                trace!(path = %path, "descending");
                let inner = scope.below(filter, key);
                walk_level(old_map, new_map, filter, inner, path, sink);
            }
            _ => {
                let reported = filter.wants(ChangeKind::Updated) && scope.reports(filter, key);
                if reported && old_val != new_val {
                    sink.updated(path, old_val, new_val);
                }
            }
        }
        path.pop();
    }

    if filter.wants(ChangeKind::Created) {
        for (key, new_val) in new {
            if !old.contains_key(key) {
                path.push(key.as_str());
                sink.created(path, new_val);
                path.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_key_decides_for_its_subtree() {
        let excluding = ChangeFilter::default().excluding(["_id"]);
        let inner = Scope::PerKey.below(&excluding, "_id");
        assert_eq!(inner, Scope::Excluded);
        assert!(!inner.reports(&excluding, "seq"));
        assert_eq!(inner.below(&excluding, "seq"), Scope::Excluded);

        let grabbing = ChangeFilter::default().only(["meta"]);
        let inner = Scope::PerKey.below(&grabbing, "meta");
        assert_eq!(inner, Scope::Included);
        assert!(inner.reports(&grabbing, "anything"));
    }

    #[test]
    fn unlisted_key_keeps_per_key_test() {
        let grabbing = ChangeFilter::default().only(["d"]);
        let inner = Scope::PerKey.below(&grabbing, "c");
        assert_eq!(inner, Scope::PerKey);
        assert!(inner.reports(&grabbing, "d"));
        assert!(!inner.reports(&grabbing, "e"));
    }
}
