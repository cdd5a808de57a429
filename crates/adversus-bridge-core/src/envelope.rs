//! List-envelope resolution.
//!
//! List-returning upstream endpoints are inconsistent about their top-level
//! shape: sometimes a bare array, sometimes an object with the array tucked
//! under one of a handful of conventional container keys. This module
//! resolves whichever shape arrived into a flat record list plus the
//! envelope's own notion of a total count, when it carries one.

use serde_json::Value;

/// Conventional container keys for the record array, in priority order.
const CONTAINER_KEYS: &[&str] = &["items", "data", "rows", "results", "list", "leads", "contacts"];

/// Numeric envelope fields that may carry the collection's total size.
const TOTAL_KEYS: &[&str] = &["total", "count", "totalCount"];

/// A resolved envelope: the flattened records and the envelope-declared
/// total, when present.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEnvelope {
    pub records: Vec<Value>,
    pub declared_total: Option<u64>,
}

/// Resolve the top-level shape of a list response into a flat record list.
///
/// Resolution order: a bare array; an object member under one of the
/// conventional container keys; failing that, the first member of the
/// object, in document order, whose value is an array. Everything else
/// resolves to an empty
/// list. The envelope's own `total`/`count`/`totalCount` field is surfaced
/// when numeric.
pub fn resolve_envelope(body: &Value) -> ResolvedEnvelope {
    match body {
        Value::Array(items) => ResolvedEnvelope {
            records: items.clone(),
            declared_total: None,
        },
        Value::Object(map) => {
            let records = CONTAINER_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
                .or_else(|| map.values().find_map(Value::as_array))
                .cloned()
                .unwrap_or_default();

            let declared_total = TOTAL_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_u64));

            ResolvedEnvelope {
                records,
                declared_total,
            }
        }
        _ => ResolvedEnvelope {
            records: Vec::new(),
            declared_total: None,
        },
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
