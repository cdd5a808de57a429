//! Container-shape normalization.
//!
//! Upstream responses wrap custom fields in two main container shapes:
//!
//! 1. an array of descriptor entries (`[{label, value}, ...]`), or
//! 2. an object keyed by field ID, where each member is either a descriptor
//!    object (`{"117": {"label": "Phone", "value": "..."}}`) or a bare
//!    scalar (`{"117": "555-0100"}`).
//!
//! The object shape is handled with a two-pass strategy: the structured
//! pass (descriptor-object members) wins when it yields anything, otherwise
//! the bare-numeric pass treats all-digit member keys as field IDs with
//! scalar values. Running the passes in this order keeps a bare-scalar map
//! from being misclassified as structured.
//!
//! The result is tagged with which pass fired so callers and tests can
//! assert the classification, not just the tuples.

use crate::value::{self, FieldTuple};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Matcher for all-digit member keys in the bare-numeric pass.
fn digit_key() -> &'static Regex {
    static DIGIT_KEY: OnceLock<Regex> = OnceLock::new();
    DIGIT_KEY.get_or_init(|| Regex::new(r"^\d+$").expect("static pattern"))
}

/// Outcome of normalizing one container, tagged with the pass that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedShape {
    /// Array elements or descriptor-object members yielded these tuples.
    Structured(Vec<FieldTuple>),
    /// All-digit keys with bare scalar values yielded these tuples.
    BareNumeric(Vec<FieldTuple>),
    /// The container was not a recognizable field collection.
    Empty,
}

impl NormalizedShape {
    /// The normalized tuples, empty for [`NormalizedShape::Empty`].
    pub fn tuples(&self) -> &[FieldTuple] {
        match self {
            Self::Structured(tuples) | Self::BareNumeric(tuples) => tuples,
            Self::Empty => &[],
        }
    }

    /// Consume the shape, yielding its tuples.
    pub fn into_tuples(self) -> Vec<FieldTuple> {
        match self {
            Self::Structured(tuples) | Self::BareNumeric(tuples) => tuples,
            Self::Empty => Vec::new(),
        }
    }

    /// True when no tuples were discovered.
    pub fn is_empty(&self) -> bool {
        self.tuples().is_empty()
    }
}

/// Normalize a raw field container into a uniform tuple list.
///
/// Supported shapes, tried in order with the first nonempty result winning:
/// an array of entries, an object of descriptor-object members (structured
/// pass), or an object of all-digit keys over bare scalars (bare-numeric
/// pass). Anything else yields [`NormalizedShape::Empty`].
///
/// Total over arbitrary JSON input; never errors.
pub fn normalize(container: &Value) -> NormalizedShape {
    match container {
        Value::Array(items) => {
            let tuples: Vec<FieldTuple> = items
                .iter()
                .filter_map(|item| value::extract(item, None))
                .collect();
            if tuples.is_empty() {
                NormalizedShape::Empty
            } else {
                NormalizedShape::Structured(tuples)
            }
        }
        Value::Object(map) => {
            // Structured pass: descriptor-object members only. Scalar leaves
            // are left for the bare-numeric pass.
            let structured: Vec<FieldTuple> = map
                .iter()
                .filter(|(_, member)| member.is_object())
                .filter_map(|(key, member)| value::extract(member, Some(key)))
                .collect();
            if !structured.is_empty() {
                return NormalizedShape::Structured(structured);
            }

            let bare: Vec<FieldTuple> = map
                .iter()
                .filter(|(key, _)| digit_key().is_match(key))
                .filter_map(|(key, member)| {
                    let id = key.parse::<u64>().ok()?;
                    let value = value::coerce_value(member)?;
                    Some(FieldTuple {
                        label: None,
                        id: Some(id),
                        value,
                    })
                })
                .collect();
            if bare.is_empty() {
                NormalizedShape::Empty
            } else {
                NormalizedShape::BareNumeric(bare)
            }
        }
        _ => NormalizedShape::Empty,
    }
}

#[cfg(test)]
#[path = "shape_tests.rs"]
mod tests;
