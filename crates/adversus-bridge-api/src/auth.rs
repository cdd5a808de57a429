//! Shared-secret authentication for webhook and read endpoints.
//!
//! The Adversus platform supplies the secret either in the
//! `x-adversus-secret` header or, for endpoints configured through their
//! dashboard UI, as a `secret` or `key` query parameter. The comparison is
//! constant-time and the secret value itself is never logged.

use axum::http::HeaderMap;
use std::collections::HashMap;
use subtle::ConstantTimeEq;

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "x-adversus-secret";

/// Query parameters that may carry the shared secret, in priority order.
pub const SECRET_QUERY_KEYS: &[&str] = &["secret", "key"];

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized,
    /// No secret was supplied on the request.
    MissingSecret,
    /// A secret was supplied but did not match.
    InvalidSecret,
}

impl AuthOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Check the request's secret against the configured one.
///
/// An empty configured secret authorizes nothing: the endpoint is closed
/// until a secret is configured.
pub fn authorize(
    expected: &str,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> AuthOutcome {
    let Some(provided) = supplied_secret(headers, query) else {
        return AuthOutcome::MissingSecret;
    };

    if expected.is_empty() {
        return AuthOutcome::InvalidSecret;
    }

    if secrets_match(expected, &provided) {
        AuthOutcome::Authorized
    } else {
        AuthOutcome::InvalidSecret
    }
}

/// The secret supplied on the request, header first, then query.
fn supplied_secret(headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
    if let Some(value) = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()) {
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    SECRET_QUERY_KEYS
        .iter()
        .find_map(|key| query.get(*key))
        .filter(|value| !value.is_empty())
        .cloned()
}

/// Constant-time equality over the secret bytes.
///
/// `ct_eq` requires equal lengths; differing lengths are an immediate
/// mismatch, which leaks only the length, not the content.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        return false;
    }
    expected.ct_eq(provided).into()
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
