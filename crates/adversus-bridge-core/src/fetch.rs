//! Lead list fetching over the upstream fetcher trait.

use crate::envelope::resolve_envelope;
use crate::upstream::{UpstreamError, UpstreamFetcher};
use serde_json::Value;
use tracing::{debug, instrument};

/// One fetched page of upstream records, flattened out of its envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    /// The flattened records, capped at the caller's limit when one was
    /// given.
    pub records: Vec<Value>,
    /// Collection size: the envelope's declared total when present, else
    /// the raw pre-truncation record count.
    pub total_count: u64,
    /// True when a positive limit was exceeded and the list was cut.
    pub truncated: bool,
}

/// Fetch a collection resource and flatten its envelope.
///
/// When `limit` is a positive number smaller than the fetched record count,
/// the list is truncated to that length and `truncated` is set. Upstream
/// failures (non-2xx, timeout, network) propagate as [`UpstreamError`].
#[instrument(skip(fetcher, query), fields(path = path))]
pub async fn fetch_list(
    fetcher: &dyn UpstreamFetcher,
    path: &str,
    query: &[(String, String)],
    limit: Option<usize>,
) -> Result<ListPage, UpstreamError> {
    let body = fetcher.fetch_json(path, query).await?;
    let resolved = resolve_envelope(&body);

    let raw_len = resolved.records.len();
    let mut records = resolved.records;
    let mut truncated = false;
    if let Some(cap) = limit {
        if cap > 0 && records.len() > cap {
            records.truncate(cap);
            truncated = true;
        }
    }

    let total_count = resolved
        .declared_total
        .unwrap_or_else(|| raw_len.max(records.len()) as u64);

    debug!(
        records = records.len(),
        total_count, truncated, "Fetched upstream list"
    );

    Ok(ListPage {
        records,
        total_count,
        truncated,
    })
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
