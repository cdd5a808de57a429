//! Contact enrichment joining with bounded concurrency.
//!
//! Joins a secondary entity (typically a contact) onto each primary record
//! via a foreign-key field. Lookups are batched: requests within a batch
//! run concurrently, batches run sequentially, which caps simultaneous
//! upstream connections without serializing the whole join.

use crate::RecordId;
use futures::future;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, instrument, warn};

/// A primary record with its joined secondary entity, when one resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub record: Value,
    pub joined: Option<Value>,
}

impl JoinedRecord {
    /// Merge the joined entity into the record under `field_name`.
    ///
    /// Records that are not JSON objects are returned unchanged.
    pub fn merged(self, field_name: &str) -> Value {
        match self.record {
            Value::Object(mut map) => {
                map.insert(
                    field_name.to_string(),
                    self.joined.unwrap_or(Value::Null),
                );
                Value::Object(map)
            }
            other => other,
        }
    }
}

/// Join a secondary entity onto each record via `foreign_key_field`.
///
/// Distinct non-null foreign-key values are looked up through `fetch_one`
/// in batches of `batch_size` (minimum 1): concurrent within a batch,
/// sequential across batches. A lookup failure resolves to `None` for that
/// key only; it never aborts the batch or the join. Records without a
/// foreign key join to `None`.
#[instrument(skip(records, fetch_one), fields(records = records.len(), batch_size))]
pub async fn join_records<F, Fut, E>(
    records: Vec<Value>,
    foreign_key_field: &str,
    fetch_one: F,
    batch_size: usize,
) -> Vec<JoinedRecord>
where
    F: Fn(RecordId) -> Fut,
    Fut: Future<Output = Result<Option<Value>, E>>,
    E: std::fmt::Display,
{
    // Distinct keys, order of first appearance irrelevant.
    let mut keys: Vec<RecordId> = Vec::new();
    for record in &records {
        if let Some(key) = foreign_key_of(record, foreign_key_field) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    let batch_size = batch_size.max(1);
    let mut resolved: HashMap<RecordId, Option<Value>> = HashMap::with_capacity(keys.len());

    for batch in keys.chunks(batch_size) {
        let lookups = batch.iter().map(|key| {
            let fut = fetch_one(key.clone());
            async move {
                let outcome = fut.await;
                (key.clone(), outcome)
            }
        });

        for (key, outcome) in future::join_all(lookups).await {
            let joined = match outcome {
                Ok(value) => value,
                Err(error) => {
                    warn!(key = %key, %error, "Enrichment lookup failed");
                    None
                }
            };
            resolved.insert(key, joined);
        }
    }

    debug!(distinct_keys = resolved.len(), "Enrichment lookups complete");

    records
        .into_iter()
        .map(|record| {
            let joined = foreign_key_of(&record, foreign_key_field)
                .and_then(|key| resolved.get(&key).cloned())
                .flatten();
            JoinedRecord { record, joined }
        })
        .collect()
}

fn foreign_key_of(record: &Value, field: &str) -> Option<RecordId> {
    record.get(field).and_then(RecordId::from_json)
}

#[cfg(test)]
#[path = "join_tests.rs"]
mod tests;
