//! Field-tuple extraction from single entries of unknown shape.
//!
//! The Adversus API exposes the same logical field under many different
//! shapes: `{label, value}` descriptor objects, `{name, val}` variants,
//! entries carrying a `values` array, or bare scalars keyed by a numeric
//! field ID. This module extracts one `(label | id, value)` pair from one
//! such entry using prioritized candidate key lists.
//!
//! All functions here are pure and total: malformed input yields `None`,
//! never an error.

use serde_json::Value;

/// Candidate keys for the human-readable label of a field entry, in
/// priority order. First non-empty string wins.
const LABEL_KEYS: &[&str] = &["label", "name", "title", "key"];

/// Candidate keys for the field value, in priority order.
const VALUE_KEYS: &[&str] = &["value", "val", "data", "text", "content"];

/// One discovered field: a label or numeric ID, plus a non-empty value.
///
/// Invariant: at least one of `label`/`id` is `Some`, and `value` is a
/// non-empty trimmed string. Construction goes through [`extract`] (or the
/// shape normalizer), which discards anything that would violate this.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldTuple {
    /// Human-readable field label, when the entry carried one.
    pub label: Option<String>,
    /// Numeric field ID, when the entry was keyed by one.
    pub id: Option<u64>,
    /// Coerced string value. Never empty.
    pub value: String,
}

impl FieldTuple {
    /// The aggregation identity part of this tuple: the label when present,
    /// otherwise the numeric ID rendered as a string.
    pub fn key_part(&self) -> String {
        match (&self.label, self.id) {
            (Some(label), _) => label.clone(),
            (None, Some(id)) => id.to_string(),
            // Unreachable by construction, but stay total.
            (None, None) => String::new(),
        }
    }
}

/// Extract a field tuple from one entry of unknown shape.
///
/// Label resolution tries `label`, `name`, `title`, `key` in order. When the
/// entry is an object without any of these and a `fallback_key` was supplied
/// (the member key when the caller is iterating an ID-keyed object), the
/// fallback becomes the numeric ID when it parses as an unsigned integer,
/// otherwise the label.
///
/// Value resolution tries `value`, `val`, `data`, `text`, `content` in
/// order; an entry carrying a `values` array has its non-null elements
/// joined with `", "`. Non-object entries coerce directly.
///
/// Returns `None` when no usable label or ID was found, or when the coerced
/// value is empty after trimming.
pub fn extract(entry: &Value, fallback_key: Option<&str>) -> Option<FieldTuple> {
    let (label, id, value) = match entry {
        Value::Object(map) => {
            let label = LABEL_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(nonempty_string));

            let value = VALUE_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(coerce_value))
                .or_else(|| map.get("values").and_then(coerce_value));

            match label {
                Some(label) => (Some(label), None, value),
                None => {
                    let (label, id) = split_fallback(fallback_key);
                    (label, id, value)
                }
            }
        }
        // A bare scalar entry only makes sense when the caller supplies the
        // key it was stored under.
        other => {
            let (label, id) = split_fallback(fallback_key);
            (label, id, coerce_value(other))
        }
    };

    let value = value?;
    if label.is_none() && id.is_none() {
        return None;
    }
    Some(FieldTuple { label, id, value })
}

/// Coerce an arbitrary JSON value into a non-empty trimmed string.
///
/// - Strings are trimmed (`None` when empty)
/// - Numbers and booleans render via `Display`
/// - Arrays join their non-null coerced elements with `", "`
/// - Objects have their inner `value`/`text`/`values` member unwrapped
/// - `null` yields `None`
pub fn coerce_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => nonempty_owned(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(coerce_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("text"))
            .or_else(|| map.get("values"))
            .and_then(coerce_value),
    }
}

/// Navigate a dot-separated path into a JSON value.
///
/// Path segments index objects by key and arrays by decimal position, so
/// `"data.leads.0.resultFields"` reaches the first lead's result fields.
/// Returns `None` as soon as a segment does not resolve.
pub fn value_at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Interpret a fallback key as a numeric ID when it is an unsigned integer,
/// otherwise as a label.
fn split_fallback(fallback_key: Option<&str>) -> (Option<String>, Option<u64>) {
    match fallback_key {
        Some(key) => match key.parse::<u64>() {
            Ok(id) => (None, Some(id)),
            Err(_) => nonempty_owned(key).map_or((None, None), |label| (Some(label), None)),
        },
        None => (None, None),
    }
}

fn nonempty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => nonempty_owned(s),
        _ => None,
    }
}

fn nonempty_owned(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
