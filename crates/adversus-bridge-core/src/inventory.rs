//! Field-inventory scanning across fetched records.
//!
//! The coverage endpoints answer "which fields does this account's data
//! actually carry, and how often". A lead record mixes plain top-level
//! fields with account-configured custom fields nested inside
//! `masterData`/`resultData` containers, and the same logical field can
//! show up either way from record to record. The scan therefore flattens
//! both, and a record contributes at most one hit per field key so
//! coverage stays a fraction of records, not of occurrences.

use crate::aggregate::FieldAggregator;
use crate::shape::{self, NormalizedShape};
use crate::value;
use serde_json::Value;
use std::collections::HashSet;

/// Container members holding account-configured master fields.
const MASTER_CONTAINERS: &[&str] = &["masterData", "masterFields"];

/// Container members holding per-contact-attempt result fields.
const RESULT_CONTAINERS: &[&str] = &["resultData", "resultFields"];

/// Flatten one record into `(field_key, value)` pairs, at most one per key.
///
/// Top-level scalar members become `lead.<member>` keys. Known custom-field
/// containers are run through the shape normalizer; their tuples become
/// `master.<label|id>` / `result.<label|id>` keys. A container the
/// normalizer cannot classify falls back to its plain scalar members, which
/// are treated as ordinary record fields under `lead.` — this is what maps
/// a nested `resultData.phone` onto the same key as a top-level `phone`.
pub fn scan_record_fields(record: &Value) -> Vec<(String, String)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut push = |key: String, val: String, seen: &mut HashSet<String>| {
        if seen.insert(key.clone()) {
            fields.push((key, val));
        }
    };

    let Value::Object(map) = record else {
        return fields;
    };

    for (member, val) in map {
        let prefix = if MASTER_CONTAINERS.contains(&member.as_str()) {
            Some("master")
        } else if RESULT_CONTAINERS.contains(&member.as_str()) {
            Some("result")
        } else {
            None
        };

        match prefix {
            Some(prefix) => match shape::normalize(val) {
                NormalizedShape::Structured(tuples) | NormalizedShape::BareNumeric(tuples) => {
                    for tuple in tuples {
                        push(
                            format!("{prefix}.{}", tuple.key_part()),
                            tuple.value,
                            &mut seen,
                        );
                    }
                }
                // Unclassifiable container: its scalar members read as
                // ordinary record fields that happen to be nested.
                NormalizedShape::Empty => {
                    if let Value::Object(inner) = val {
                        for (key, member_val) in inner {
                            if let Some(coerced) = scalar_coercion(member_val) {
                                push(format!("lead.{key}"), coerced, &mut seen);
                            }
                        }
                    }
                }
            },
            None => {
                if let Some(coerced) = scalar_coercion(val) {
                    push(format!("lead.{member}"), coerced, &mut seen);
                }
            }
        }
    }

    fields
}

/// Aggregate field coverage across a record slice.
///
/// Each record contributes at most one hit per field key, so a key's count
/// equals the number of distinct records carrying it.
pub fn aggregate_records(records: &[Value]) -> FieldAggregator {
    let mut aggregator = FieldAggregator::new();
    for record in records {
        for (key, val) in scan_record_fields(record) {
            aggregator.hit(&key, &val);
        }
    }
    aggregator
}

/// Coerce plain field values only: scalars and scalar arrays, not nested
/// structures (those are either known containers or skipped).
fn scalar_coercion(val: &Value) -> Option<String> {
    match val {
        Value::Object(_) => None,
        other => value::coerce_value(other),
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
