//! # Adversus-Bridge Core
//!
//! Core business logic for the Adversus webhook intake and field-discovery
//! service.
//!
//! This crate contains the domain logic for normalizing the heterogeneous
//! JSON payloads returned by the Adversus dialer API: extracting
//! label/value pairs from arbitrarily shaped entries, flattening list
//! envelopes, aggregating field coverage across records, probing multiple
//! upstream sub-resources for result fields, and joining contacts onto
//! leads.
//!
//! ## Architecture
//!
//! The core follows clean architecture principles:
//! - Business logic depends only on trait abstractions
//! - Infrastructure implementations (the HTTP client, the event sink) are
//!   injected at runtime
//! - All normalization functions are total over arbitrary JSON input: they
//!   return empty results rather than erroring, because the upstream API
//!   has no fixed schema
//!
//! ## Usage
//!
//! ```rust
//! use adversus_bridge_core::{shape, aggregate::FieldAggregator};
//! use serde_json::json;
//!
//! let container = json!([{"label": "Phone", "value": "555-0100"}]);
//! let mut agg = FieldAggregator::new();
//! for tuple in shape::normalize(&container).into_tuples() {
//!     agg.hit(&format!("result.{}", tuple.key_part()), &tuple.value);
//! }
//! let summary = agg.summarize(Some(1));
//! assert_eq!(summary[0].count, 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use uuid::Uuid;

/// Standard result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Identifier for an upstream record (lead, contact, or result).
///
/// The Adversus API uses numeric identifiers but delivers them sometimes as
/// JSON numbers and sometimes as strings, so the canonical form here is a
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Create a record ID from any displayable value.
    pub fn new(value: impl fmt::Display) -> Self {
        Self(value.to_string())
    }

    /// Extract a record ID from a JSON value, accepting numbers and strings.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            serde_json::Value::String(s) if !s.trim().is_empty() => {
                Some(Self(s.trim().to_string()))
            }
            _ => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Identifier for tracing requests across system boundaries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Time Types
// ============================================================================

/// UTC timestamp with microsecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc)))
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization for retry and alerting decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failures that should be retried
    Transient,
    /// Permanent failures that won't succeed on retry
    Permanent,
    /// Security-related failures requiring immediate attention
    Security,
    /// Configuration errors preventing startup
    Configuration,
}

/// Top-level error type for bridge operations
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Upstream error: {0}")]
    Upstream(#[from] upstream::UpstreamError),

    #[error("Event sink error: {0}")]
    Sink(#[from] events::SinkError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BridgeError {
    /// Check if error is transient and the operation may be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Auth { .. } => false,
            Self::Upstream(e) => e.is_transient(),
            Self::Sink(_) => true,
            Self::Configuration { .. } => false,
            Self::Internal { .. } => true,
        }
    }

    /// Get error category for monitoring and alerting
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Auth { .. } => ErrorCategory::Security,
            Self::Upstream(e) => {
                if e.is_transient() {
                    ErrorCategory::Transient
                } else {
                    ErrorCategory::Permanent
                }
            }
            Self::Sink(_) => ErrorCategory::Transient,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Transient,
        }
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Field-tuple extraction from single entries of unknown shape
pub mod value;

/// Container-shape normalization (array / structured object / bare numeric)
pub mod shape;

/// Field frequency and coverage aggregation
pub mod aggregate;

/// List-envelope resolution for upstream collection responses
pub mod envelope;

/// Lead list fetching over the upstream fetcher trait
pub mod fetch;

/// Field-inventory scanning across fetched records
pub mod inventory;

/// Multi-source probing for per-record result fields
pub mod probe;

/// Pacing abstraction for upstream politeness delays
pub mod pacing;

/// Contact enrichment joining with bounded concurrency
pub mod join;

/// Webhook event types, debug ring buffer, and event sink trait
pub mod events;

/// Upstream fetcher trait and error taxonomy
pub mod upstream;

// Re-export key types for convenience
pub use aggregate::{FieldAggregator, FieldSummary};
pub use envelope::resolve_envelope;
pub use events::{DebugEventBuffer, EventSink, MemoryEventSink, SinkError, WebhookEvent};
pub use fetch::{fetch_list, ListPage};
pub use inventory::scan_record_fields;
pub use join::{join_records, JoinedRecord};
pub use pacing::{FixedDelayPacer, NoopPacer, Pacer};
pub use probe::{
    ProbeAttempt, RecordProbeOutcome, RecordProber, SourceDescriptor, SuccessFilter,
};
pub use shape::{normalize, NormalizedShape};
pub use upstream::{UpstreamError, UpstreamFetcher};
pub use value::{extract, value_at_path, FieldTuple};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
