//! Shallow mapping combinators.

use docdelta_types::Document;

/// Merge documents left to right into a new document.
///
/// Later documents overwrite earlier keys. Nested mappings are replaced
/// wholesale, never merged recursively.
pub fn merge<'a, I>(docs: I) -> Document
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut merged = Document::new();
    for doc in docs {
        for (key, value) in doc {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Project the top level of `doc` onto `keys`.
///
/// With `keep = true` only the listed keys are retained; with `keep = false`
/// the listed keys are dropped and everything else is retained.
pub fn project<S: AsRef<str>>(doc: &Document, keys: &[S], keep: bool) -> Document {
    doc.iter()
        .filter(|(key, _)| keys.iter().any(|k| k.as_ref() == key.as_str()) == keep)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
