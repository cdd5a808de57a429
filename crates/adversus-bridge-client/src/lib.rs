//! # Adversus-Bridge Client
//!
//! Reqwest-based implementation of the core's [`UpstreamFetcher`] trait for
//! the Adversus REST API: Basic Auth, a fixed per-request timeout, and
//! truncated body excerpts on non-2xx responses.
//!
//! The bridge only ever reads from the upstream API, so the client is
//! GET-only.

use adversus_bridge_core::upstream::{body_excerpt, UpstreamError, UpstreamFetcher};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Configuration for the Adversus API client.
///
/// # Examples
///
/// ```
/// use adversus_bridge_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://api.adversus.dk/v1", "apiuser", "s3cret")
///     .with_timeout(Duration::from_secs(20));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the upstream API, e.g. `https://api.adversus.dk/v1`.
    pub base_url: String,
    /// Basic Auth username.
    pub username: String,
    /// Basic Auth password.
    pub password: String,
    /// Per-request timeout. Timeouts surface as [`UpstreamError::Timeout`],
    /// never as a hanging request.
    pub timeout: Duration,
    /// User agent string for API requests.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with the default timeout (15 seconds).
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(15),
            user_agent: concat!("adversus-bridge/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// GET-only client for the Adversus REST API.
#[derive(Clone)]
pub struct AdversusClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl AdversusClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the base URL does not parse or the
    /// underlying HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ClientBuildError> {
        Url::parse(&config.base_url).map_err(|e| ClientBuildError::InvalidBaseUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ClientBuildError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url_for(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl std::fmt::Debug for AdversusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdversusClient")
            .field("base_url", &self.config.base_url)
            .field("username", &self.config.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl UpstreamFetcher for AdversusClient {
    #[instrument(skip(self, query), fields(path = path))]
    async fn fetch_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamError> {
        let url = self.url_for(path);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout {
                        url: url.clone(),
                        timeout_seconds: self.config.timeout.as_secs(),
                    }
                } else {
                    UpstreamError::Network {
                        url: url.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url,
                body_excerpt: body_excerpt(&body),
            });
        }

        let body = response.text().await.map_err(|e| UpstreamError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;

        debug!(status = status.as_u16(), bytes = body.len(), "Upstream fetch complete");

        serde_json::from_str(&body).map_err(|e| UpstreamError::InvalidBody {
            url,
            message: e.to_string(),
        })
    }
}

/// Errors constructing the client at startup.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("Invalid upstream base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("Failed to create HTTP client: {message}")]
    HttpClient { message: String },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
