//! Total ordering over JSON values and composite pivot keys.
//!
//! Values of different types order by type rank:
//! null < bool < number < string < array < object.
//! Within a type: numbers by numeric value, strings and booleans naturally,
//! arrays element-wise, objects entry-wise (keys, then values).

use std::cmp::Ordering;

use serde_json::{Number, Value};

use docdelta_types::Document;

use crate::error::{RecordError, Result};

/// Compare two JSON values under the total order described above.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            lexicographic(x.iter(), y.iter(), compare_values)
        }
        (Value::Object(x), Value::Object(y)) => {
            lexicographic(x.iter(), y.iter(), |(ka, va), (kb, vb)| {
                ka.cmp(kb).then_with(|| compare_values(va, vb))
            })
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Compare two pivot tuples lexicographically, field by field.
pub fn compare_pivots(a: &[&Value], b: &[&Value]) -> Ordering {
    lexicographic(a.iter(), b.iter(), |x, y| compare_values(x, y))
}

/// Stable-sort `records` ascending by the values of `pivots`.
///
/// Every record must carry every pivot field.
pub fn sort_by_pivots<S: AsRef<str>>(records: &mut [Document], pivots: &[S]) -> Result<()> {
    for record in records.iter() {
        pivot_tuple(record, pivots)?;
    }
    records.sort_by(|a, b| {
        let ka = pivots.iter().map(|p| a.get(p.as_ref()).unwrap_or(&Value::Null));
        let kb = pivots.iter().map(|p| b.get(p.as_ref()).unwrap_or(&Value::Null));
        lexicographic(ka, kb, compare_values)
    });
    Ok(())
}

/// The values of `pivots` in `record`, in pivot order.
pub(crate) fn pivot_tuple<'a, S: AsRef<str>>(
    record: &'a Document,
    pivots: &[S],
) -> Result<Vec<&'a Value>> {
    pivots
        .iter()
        .map(|field| {
            record
                .get(field.as_ref())
                .ok_or_else(|| RecordError::MissingPivot {
                    field: field.as_ref().to_string(),
                })
        })
        .collect()
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or_default();
    let b = y.as_f64().unwrap_or_default();
    a.total_cmp(&b)
}

fn lexicographic<T, I, J, F>(mut a: I, mut b: J, mut cmp: F) -> Ordering
where
    I: Iterator<Item = T>,
    J: Iterator<Item = T>,
    F: FnMut(T, T) -> Ordering,
{
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}
