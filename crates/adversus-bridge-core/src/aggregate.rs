//! Field frequency and coverage aggregation.
//!
//! A [`FieldAggregator`] accumulates discovered field keys across many
//! records inside one request and summarizes them as a coverage table. One
//! aggregator instance belongs to exactly one request; nothing here is
//! shared across requests and the type is deliberately not thread-safe.

use serde::Serialize;
use std::collections::HashMap;

/// Running accumulation for one discovered field key.
#[derive(Debug, Clone)]
struct AggregateEntry {
    count: u64,
    example: String,
}

/// One row of the summarized coverage table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    /// The aggregation key, e.g. `lead.phone` or `result.117`.
    pub field: String,
    /// Number of hits recorded for this key.
    pub count: u64,
    /// Percentage of scanned records carrying this field, when a record
    /// total was supplied to [`FieldAggregator::summarize`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_pct: Option<u32>,
    /// A representative value: the first non-empty one seen.
    pub example: String,
}

/// Sequential, single-request accumulator of field hits.
#[derive(Debug, Default)]
pub struct FieldAggregator {
    entries: HashMap<String, AggregateEntry>,
}

impl FieldAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation of `key` with `value`.
    ///
    /// Empty values (after trimming) are ignored entirely. The stored
    /// example follows a first-wins policy: the first non-empty value
    /// sticks, later values only fill an example that is still empty.
    pub fn hit(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }

        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| AggregateEntry {
                count: 0,
                example: String::new(),
            });
        entry.count += 1;
        if entry.example.is_empty() {
            entry.example = value.to_string();
        }
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no hits have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the coverage table.
    ///
    /// When `total_records` is supplied, each row carries
    /// `coverage_pct = round(count / max(total, 1) * 100)`. Rows are ordered
    /// by descending coverage/count, ties broken by ascending field key, so
    /// the output is deterministic. Summarize does not consume or mutate the
    /// aggregator: repeated calls without further hits return identical
    /// output.
    pub fn summarize(&self, total_records: Option<u64>) -> Vec<FieldSummary> {
        let mut rows: Vec<FieldSummary> = self
            .entries
            .iter()
            .map(|(field, entry)| FieldSummary {
                field: field.clone(),
                count: entry.count,
                coverage_pct: total_records.map(|total| {
                    let denominator = total.max(1) as f64;
                    ((entry.count as f64 / denominator) * 100.0).round() as u32
                }),
                example: entry.example.clone(),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.coverage_pct
                .cmp(&a.coverage_pct)
                .then(b.count.cmp(&a.count))
                .then(a.field.cmp(&b.field))
        });
        rows
    }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
