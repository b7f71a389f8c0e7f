//! Key-path addressing over nested documents.
//!
//! Every operation accepts anything convertible into a [`KeyPath`]: a dotted
//! string (`"c.d"`), an array of segments (`["c", "d"]`), or a `KeyPath`.
//! An empty path is rejected with [`PathError::EmptyPath`].

use serde_json::Value;
use tracing::debug;

use docdelta_types::{Document, KeyPath};

use crate::error::{PathError, Result};

/// Returns `true` if every key along `path` exists.
///
/// Stops with `false` at the first absent key. Fails with `TypeMismatch` if an
/// intermediate value exists but is not a mapping.
pub fn has(doc: &Document, path: impl Into<KeyPath>) -> Result<bool> {
    let path = non_empty(path.into())?;
    let (last, parent) = split(&path)?;

    let mut current = doc;
    for (depth, key) in parent.iter().enumerate() {
        current = match current.get(key) {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(type_mismatch(&path, depth)),
            None => return Ok(false),
        };
    }
    Ok(current.contains_key(last))
}

/// Borrow the value at `path`.
pub fn get(doc: &Document, path: impl Into<KeyPath>) -> Result<&Value> {
    let path = non_empty(path.into())?;
    let (last, parent) = split(&path)?;

    let mut current = doc;
    for (depth, key) in parent.iter().enumerate() {
        current = match current.get(key) {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(type_mismatch(&path, depth)),
            None => return Err(key_not_found(&path, depth)),
        };
    }
    current
        .get(last)
        .ok_or_else(|| key_not_found(&path, parent.len()))
}

/// Mutably borrow the value at `path`.
pub fn get_mut(doc: &mut Document, path: impl Into<KeyPath>) -> Result<&mut Value> {
    let path = non_empty(path.into())?;
    let (last, parent) = split(&path)?;

    let current = descend_mut(doc, &path, parent)?;
    current
        .get_mut(last)
        .ok_or_else(|| key_not_found(&path, parent.len()))
}

/// Assign `value` at `path`, creating intermediate mappings as needed.
///
/// An intermediate key that is absent, or whose value is not a mapping, is
/// (re)initialized to an empty mapping before descending.
pub fn set(doc: &mut Document, path: impl Into<KeyPath>, value: Value) -> Result<()> {
    let path = non_empty(path.into())?;
    let (last, parent) = split(&path)?;

    let mut current = doc;
    for key in parent {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Document::new()));
        current = ensure_mapping(slot);
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Like [`set`], but on an arbitrary root value.
///
/// If `root` is not a mapping it is replaced by a fresh single-entry mapping
/// `{final_key: value}`; callers must not assume the original root survives.
pub fn set_value(root: &mut Value, path: impl Into<KeyPath>, value: Value) -> Result<()> {
    let path = non_empty(path.into())?;
    match root {
        Value::Object(map) => set(map, path, value),
        other => {
            let (last, _) = split(&path)?;
            debug!(path = %path, "root is not a mapping, replacing it");
            let mut fresh = Document::new();
            fresh.insert(last.to_string(), value);
            *other = Value::Object(fresh);
            Ok(())
        }
    }
}

/// Remove the value at `path` and return it.
pub fn delete(doc: &mut Document, path: impl Into<KeyPath>) -> Result<Value> {
    let path = non_empty(path.into())?;
    let (last, parent) = split(&path)?;

    let current = descend_mut(doc, &path, parent)?;
    current
        .remove(last)
        .ok_or_else(|| key_not_found(&path, parent.len()))
}

fn descend_mut<'a>(
    doc: &'a mut Document,
    path: &KeyPath,
    parent: &[String],
) -> Result<&'a mut Document> {
    let mut current = doc;
    for (depth, key) in parent.iter().enumerate() {
        current = match current.get_mut(key) {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(type_mismatch(path, depth)),
            None => return Err(key_not_found(path, depth)),
        };
    }
    Ok(current)
}

fn ensure_mapping(slot: &mut Value) -> &mut Document {
    if !slot.is_object() {
        *slot = Value::Object(Document::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just replaced by a mapping"),
    }
}

fn non_empty(path: KeyPath) -> Result<KeyPath> {
    if path.is_empty() {
        Err(PathError::EmptyPath)
    } else {
        Ok(path)
    }
}

fn split(path: &KeyPath) -> Result<(&str, &[String])> {
    path.split_last().ok_or(PathError::EmptyPath)
}

fn key_not_found(path: &KeyPath, depth: usize) -> PathError {
    PathError::KeyNotFound {
        path: path.prefix(depth + 1).dotted(),
    }
}

fn type_mismatch(path: &KeyPath, depth: usize) -> PathError {
    PathError::TypeMismatch {
        path: path.prefix(depth + 1).dotted(),
    }
}
