//! Multi-source probing for per-record result fields.
//!
//! No single Adversus endpoint reliably exposes a lead's custom result
//! fields across accounts and configurations: depending on account setup
//! they may sit on the lead itself, on a per-lead results sub-resource, or
//! behind a filtered results query. The prober therefore walks an ordered
//! list of candidate sources and keeps the first one that yields anything,
//! recording every attempt in a diagnostic trail that endpoints surface
//! verbatim.
//!
//! The source list is caller-supplied configuration; none of the shapes is
//! treated as authoritative.

use crate::pacing::Pacer;
use crate::shape;
use crate::upstream::UpstreamFetcher;
use crate::value::{self, FieldTuple};
use crate::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Result-object members that may hold the custom field container.
const RESULT_FIELD_CONTAINERS: &[&str] = &["resultData", "resultFields", "fields"];

/// Object members checked by the success filter, in order.
const OUTCOME_KEYS: &[&str] = &["status", "outcome", "disposition", "result"];

// ============================================================================
// Source description
// ============================================================================

/// One candidate upstream source of result fields for a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Diagnostic name surfaced in the attempt trail, e.g. `lead-results`.
    pub name: String,
    /// Upstream path with `{id}` standing for the record ID.
    pub path: String,
    /// Query parameters; values may also carry `{id}`.
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// Candidate sub-paths of the response body to normalize, tried in
    /// order with the first nonempty winning. An empty string means the
    /// body root.
    pub extract_paths: Vec<String>,
    /// True when the extracted arrays hold result records that the
    /// prober's success vocabulary should filter before normalizing.
    /// False for sources whose arrays already are field collections.
    #[serde(default)]
    pub filter_results: bool,
}

impl SourceDescriptor {
    /// Substitute the record ID into the path template.
    pub fn path_for(&self, record_id: &RecordId) -> String {
        self.path.replace("{id}", record_id.as_str())
    }

    /// Substitute the record ID into the query template.
    pub fn query_for(&self, record_id: &RecordId) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|(k, v)| (k.clone(), v.replace("{id}", record_id.as_str())))
            .collect()
    }
}

/// One entry of the diagnostic trail: a source tried for a record.
///
/// Append-only, surfaced verbatim in responses; attempts are never retried
/// or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeAttempt {
    pub record_id: RecordId,
    pub source: String,
    pub succeeded: bool,
    pub item_count: usize,
}

/// Outcome of probing one record: the winning source's tuples plus the
/// full attempt trail.
#[derive(Debug, Clone, Serialize)]
pub struct RecordProbeOutcome {
    pub record_id: RecordId,
    pub tuples: Vec<FieldTuple>,
    pub attempts: Vec<ProbeAttempt>,
    /// Name of the source that produced the tuples, when any did.
    pub matched_source: Option<String>,
}

// ============================================================================
// Success filter
// ============================================================================

/// Case-insensitive vocabulary match against a result object's outcome
/// field.
///
/// The word list is configuration data, not an algorithm detail: the
/// default set below is known to be incomplete across accounts and
/// deployments override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessFilter {
    terms: Vec<String>,
}

impl SuccessFilter {
    /// Build a filter from a term list; matching is case-insensitive exact.
    pub fn new(terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.into().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Whether a result object's status/outcome/disposition matches the
    /// vocabulary. Objects without any outcome field do not match.
    pub fn matches(&self, object: &Value) -> bool {
        let Value::Object(map) = object else {
            return false;
        };
        OUTCOME_KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .any(|outcome| self.terms.contains(&outcome.trim().to_lowercase()))
    }
}

impl Default for SuccessFilter {
    fn default() -> Self {
        Self::new(["success", "sale", "won", "interested", "completed", "yes"])
    }
}

// ============================================================================
// Prober
// ============================================================================

/// Probes an ordered source list per record, short-circuiting on the first
/// source that yields normalized tuples.
pub struct RecordProber<'a> {
    fetcher: &'a dyn UpstreamFetcher,
    pacer: &'a dyn Pacer,
    success_filter: Option<SuccessFilter>,
}

impl<'a> RecordProber<'a> {
    pub fn new(fetcher: &'a dyn UpstreamFetcher, pacer: &'a dyn Pacer) -> Self {
        Self {
            fetcher,
            pacer,
            success_filter: None,
        }
    }

    /// Restrict candidate result objects to those passing the filter.
    pub fn with_success_filter(mut self, filter: SuccessFilter) -> Self {
        self.success_filter = Some(filter);
        self
    }

    /// Probe the sources for one record, strictly in the given order.
    ///
    /// Each source costs an upstream round trip, so probing stops at the
    /// first source with a nonempty tuple list; later sources are never
    /// fetched and never appear in the attempt trail. A later source might
    /// have yielded additional fields — that is accepted, the short-circuit
    /// is a latency optimization, not a completeness guarantee.
    #[instrument(skip(self, sources), fields(record_id = %record_id))]
    pub async fn probe_record(
        &self,
        record_id: &RecordId,
        sources: &[SourceDescriptor],
    ) -> RecordProbeOutcome {
        let mut attempts = Vec::new();

        for source in sources {
            let path = source.path_for(record_id);
            let query = source.query_for(record_id);

            let tuples = match self.fetcher.fetch_json(&path, &query).await {
                Ok(body) => self.extract_tuples(&body, source),
                Err(error) => {
                    warn!(source = %source.name, %error, "Probe fetch failed");
                    Vec::new()
                }
            };

            let attempt = ProbeAttempt {
                record_id: record_id.clone(),
                source: source.name.clone(),
                succeeded: !tuples.is_empty(),
                item_count: tuples.len(),
            };
            let succeeded = attempt.succeeded;
            attempts.push(attempt);

            if succeeded {
                debug!(source = %source.name, items = tuples.len(), "Probe matched");
                return RecordProbeOutcome {
                    record_id: record_id.clone(),
                    tuples,
                    attempts,
                    matched_source: Some(source.name.clone()),
                };
            }
        }

        RecordProbeOutcome {
            record_id: record_id.clone(),
            tuples: Vec::new(),
            attempts,
            matched_source: None,
        }
    }

    /// Probe a sequence of records, pausing the pacer between successive
    /// records. Records are processed strictly sequentially; a scan never
    /// holds two records in flight.
    pub async fn probe_records(
        &self,
        record_ids: &[RecordId],
        sources: &[SourceDescriptor],
    ) -> Vec<RecordProbeOutcome> {
        let mut outcomes = Vec::with_capacity(record_ids.len());
        for (index, record_id) in record_ids.iter().enumerate() {
            if index > 0 {
                self.pacer.pause().await;
            }
            outcomes.push(self.probe_record(record_id, sources).await);
        }
        outcomes
    }

    /// Run the shape normalizer against the candidate sub-paths of a fetched
    /// body, first nonempty path winning.
    fn extract_tuples(&self, body: &Value, source: &SourceDescriptor) -> Vec<FieldTuple> {
        for path in &source.extract_paths {
            let candidate = if path.is_empty() {
                Some(body)
            } else {
                value::value_at_path(body, path)
            };
            let Some(candidate) = candidate else {
                continue;
            };

            let tuples = match (&self.success_filter, candidate) {
                (Some(filter), Value::Array(objects)) if source.filter_results => objects
                    .iter()
                    .filter(|object| filter.matches(object))
                    .flat_map(|object| normalize_result_object(object))
                    .collect(),
                _ => shape::normalize(candidate).into_tuples(),
            };

            if !tuples.is_empty() {
                return tuples;
            }
        }
        Vec::new()
    }
}

/// Normalize one result object: its own shape when it is a field
/// collection, else the first recognizable field container member.
fn normalize_result_object(object: &Value) -> Vec<FieldTuple> {
    let own = shape::normalize(object).into_tuples();
    if !own.is_empty() {
        return own;
    }
    if let Value::Object(map) = object {
        for container in RESULT_FIELD_CONTAINERS {
            if let Some(member) = map.get(*container) {
                let tuples = shape::normalize(member).into_tuples();
                if !tuples.is_empty() {
                    return tuples;
                }
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
