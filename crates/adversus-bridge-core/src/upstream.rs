//! Upstream fetcher trait and error taxonomy.
//!
//! All outbound traffic to the Adversus REST API goes through
//! [`UpstreamFetcher`], so the fetch/probe/join logic in this crate never
//! touches a concrete HTTP client. The production implementation lives in
//! `adversus-bridge-client`; tests inject canned fetchers.

use async_trait::async_trait;
use serde_json::Value;

/// Maximum number of characters of a textual upstream body carried inside a
/// status error.
pub const BODY_EXCERPT_LIMIT: usize = 2000;

/// Abstract GET-and-parse-JSON collaborator for the upstream API.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    /// Fetch `path` (relative to the upstream base URL) with the given query
    /// parameters and parse the response body as JSON.
    ///
    /// Implementations must enforce a fixed request timeout and surface
    /// non-2xx statuses as [`UpstreamError::Status`] carrying a truncated
    /// body excerpt.
    async fn fetch_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamError>;
}

/// Failure modes for upstream fetches.
///
/// A failed fetch is never silently retried within a request; the
/// multi-source prober's "try the next source" is a fallback to a different
/// sub-resource, not a retry of the same one.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream returned a non-2xx status.
    #[error("Upstream returned {status} for {url}: {body_excerpt}")]
    Status {
        status: u16,
        url: String,
        body_excerpt: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Upstream request to {url} aborted after {timeout_seconds}s")]
    Timeout { url: String, timeout_seconds: u64 },

    /// Connection-level failure before any response arrived.
    #[error("Upstream request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The response body was not parseable as JSON.
    #[error("Upstream response from {url} was not valid JSON: {message}")]
    InvalidBody { url: String, message: String },
}

impl UpstreamError {
    /// Check if the failure is transient and a later request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout { .. } => true,
            Self::Network { .. } => true,
            Self::InvalidBody { .. } => false,
        }
    }

    /// The HTTP status carried by this error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Truncate a textual body to the excerpt limit for error reporting.
pub fn body_excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LIMIT).collect()
}

#[cfg(test)]
#[path = "upstream_tests.rs"]
mod tests;
