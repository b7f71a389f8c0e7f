//! Pivot transform: turn a flat record list into a nested mapping keyed by
//! pivot field values, and back.
//!
//! Grouping by `["g", "k"]` turns
//!
//! ```text
//! [{"g": "x", "k": 1, "v": 0}, {"g": "x", "k": 2, "v": 1}]
//! ```
//!
//! into
//!
//! ```text
//! {"x": {"1": {"v": 0}, "2": {"v": 1}}}
//! ```
//!
//! The pivot fields are stripped from the grouped records. At the last pivot
//! level a group holding a single record collapses to the bare record; larger
//! groups stay arrays. Readers must accept both shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use docdelta_types::{Document, KeyPath};

use crate::error::{RecordError, Result};

/// Conversion between a pivot field value and the mapping key it groups under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyConverter {
    /// Strings are used verbatim, other values as their JSON text. Keys that
    /// are JSON numbers, booleans or `null` read back as those values, any
    /// other key as a string, so a string pivot such as `"7"` comes back as
    /// the number `7`.
    #[default]
    Text,
    /// Keys read back as integers.
    Integer,
    /// Keys read back as floating-point numbers.
    Float,
    /// Keys read back as `true` / `false`.
    Boolean,
    /// Keys are JSON text and read back as the exact value.
    Json,
}

impl KeyConverter {
    /// The mapping key for a pivot value.
    pub fn to_key(&self, value: &Value) -> String {
        match (self, value) {
            (Self::Json, v) => v.to_string(),
            (_, Value::String(s)) => s.clone(),
            (_, v) => v.to_string(),
        }
    }

    /// The pivot value for a mapping key.
    pub fn from_key(&self, key: &str) -> Result<Value> {
        let converted = match self {
            Self::Text => Some(match serde_json::from_str(key) {
                Ok(scalar @ (Value::Null | Value::Bool(_) | Value::Number(_))) => scalar,
                _ => Value::String(key.to_string()),
            }),
            Self::Integer => key.parse::<i64>().ok().map(Value::from),
            Self::Float => key
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            Self::Boolean => key.parse::<bool>().ok().map(Value::Bool),
            Self::Json => serde_json::from_str(key).ok(),
        };
        converted.ok_or_else(|| RecordError::InvalidKey {
            key: key.to_string(),
            converter: *self,
        })
    }
}

impl std::str::FromStr for KeyConverter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown key converter: {other}")),
        }
    }
}

fn converter_at(converters: &[KeyConverter], level: usize) -> KeyConverter {
    converters.get(level).copied().unwrap_or_default()
}

/// Group `records` into a nested mapping, one level per pivot field.
///
/// `converters[i]` controls how values of `pivots[i]` become keys; missing
/// entries default to [`KeyConverter::Text`].
pub fn group_by_pivots<S: AsRef<str>>(
    records: &[Document],
    pivots: &[S],
    converters: &[KeyConverter],
) -> Result<Document> {
    if pivots.is_empty() {
        return Err(RecordError::EmptyPivots);
    }
    let grouped = group_level(records.to_vec(), pivots, converters, 0)?;
    debug!(records = records.len(), groups = grouped.len(), "grouped records by pivots");
    Ok(grouped)
}

fn group_level<S: AsRef<str>>(
    records: Vec<Document>,
    pivots: &[S],
    converters: &[KeyConverter],
    level: usize,
) -> Result<Document> {
    let field = pivots[level].as_ref();
    let converter = converter_at(converters, level);

    let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();
    for mut record in records {
        let value = record
            .remove(field)
            .ok_or_else(|| RecordError::MissingPivot {
                field: field.to_string(),
            })?;
        groups
            .entry(converter.to_key(&value))
            .or_default()
            .push(record);
    }

    let last = level + 1 == pivots.len();
    let mut grouped = Document::new();
    for (key, mut members) in groups {
        let node = if !last {
            Value::Object(group_level(members, pivots, converters, level + 1)?)
        } else if members.len() == 1 {
            Value::Object(members.swap_remove(0))
        } else {
            Value::Array(members.into_iter().map(Value::Object).collect())
        };
        grouped.insert(key, node);
    }
    Ok(grouped)
}

/// Flatten a grouped mapping back into a record list, restoring the pivot
/// fields from the mapping keys.
///
/// Records come out in mapping key order, which need not match the order of
/// the list that was grouped.
pub fn ungroup<S: AsRef<str>>(
    nested: &Document,
    pivots: &[S],
    converters: &[KeyConverter],
) -> Result<Vec<Document>> {
    if pivots.is_empty() {
        return Err(RecordError::EmptyPivots);
    }
    let mut records = Vec::new();
    let mut bound = Vec::with_capacity(pivots.len());
    ungroup_level(
        nested,
        pivots,
        converters,
        &mut KeyPath::root(),
        &mut bound,
        &mut records,
    )?;
    debug!(records = records.len(), "ungrouped records");
    Ok(records)
}

fn ungroup_level<S: AsRef<str>>(
    node: &Document,
    pivots: &[S],
    converters: &[KeyConverter],
    path: &mut KeyPath,
    bound: &mut Vec<(String, Value)>,
    out: &mut Vec<Document>,
) -> Result<()> {
    let level = path.len();
    let field = pivots[level].as_ref();
    let converter = converter_at(converters, level);
    let last = level + 1 == pivots.len();

    for (key, child) in node {
        bound.push((field.to_string(), converter.from_key(key)?));
        path.push(key.as_str());

        match child {
            Value::Object(inner) if !last => {
                ungroup_level(inner, pivots, converters, path, bound, out)?;
            }
            Value::Object(record) if last => out.push(restore(record, bound)),
            Value::Array(items) if last => {
                for item in items {
                    match item {
                        Value::Object(record) => out.push(restore(record, bound)),
                        _ => return Err(malformed(path)),
                    }
                }
            }
            _ => return Err(malformed(path)),
        }

        path.pop();
        bound.pop();
    }
    Ok(())
}

fn restore(record: &Document, bound: &[(String, Value)]) -> Document {
    let mut restored = record.clone();
    for (field, value) in bound {
        restored.insert(field.clone(), value.clone());
    }
    restored
}

fn malformed(path: &KeyPath) -> RecordError {
    RecordError::MalformedGroup {
        path: path.dotted(),
    }
}
