//! Locating records within a list.

use serde_json::Value;

use docdelta_path::get;
use docdelta_types::{Document, KeyPath};

use crate::error::{RecordError, Result};
use crate::pivot::KeyConverter;

/// Find the single record matching every condition.
///
/// `conditions` maps dotted paths to expected values. A record whose path is
/// absent, or runs through a non-mapping, does not match.
///
/// ```
/// use docdelta_records::find_unique;
/// use serde_json::json;
///
/// let records: Vec<_> = [json!({"id": 1, "meta": {"tag": "a"}}), json!({"id": 2})]
///     .into_iter()
///     .map(|v| v.as_object().unwrap().clone())
///     .collect();
/// let conditions = json!({"meta.tag": "a"});
/// let found = find_unique(&records, conditions.as_object().unwrap()).unwrap();
/// assert_eq!(found["id"], json!(1));
/// ```
pub fn find_unique<'a>(records: &'a [Document], conditions: &Document) -> Result<&'a Document> {
    let matches: Vec<&Document> = records
        .iter()
        .filter(|record| {
            conditions.iter().all(|(path, expected)| {
                matches!(get(record, KeyPath::parse(path)), Ok(actual) if actual == expected)
            })
        })
        .collect();

    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(RecordError::NotFound {
            conditions: Value::Object(conditions.clone()).to_string(),
        }),
        many => Err(RecordError::AmbiguousMatch {
            count: many.len(),
            conditions: Value::Object(conditions.clone()).to_string(),
        }),
    }
}

/// Index records by the value of `key`.
///
/// Values become mapping keys through [`KeyConverter::Text`]; on collision
/// the later record wins.
pub fn index_by(records: &[Document], key: &str) -> Result<Document> {
    let mut index = Document::new();
    for record in records {
        let value = record.get(key).ok_or_else(|| RecordError::MissingPivot {
            field: key.to_string(),
        })?;
        index.insert(
            KeyConverter::Text.to_key(value),
            Value::Object(record.clone()),
        );
    }
    Ok(index)
}
