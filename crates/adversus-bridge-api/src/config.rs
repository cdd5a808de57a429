//! Service configuration types.
//!
//! Defaults here are development-friendly; production deployments override
//! them through the configuration file and `ADVERSUS_BRIDGE__*` environment
//! variables loaded by the service binary.

use serde::{Deserialize, Serialize};

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Upstream Adversus API settings
    pub upstream: UpstreamConfig,

    /// Webhook intake settings
    pub webhook: WebhookConfig,

    /// Scan and enrichment settings
    pub scan: ScanConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Validate operator-supplied configuration before startup.
    ///
    /// Absent configuration falls back to usable defaults, but values that
    /// are present and nonsensical abort startup instead of producing a
    /// half-working service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }
        if self.upstream.base_url.is_empty() {
            return Err(ConfigError::Invalid {
                message: "upstream.base_url must not be empty".to_string(),
            });
        }
        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                message: format!(
                    "upstream.base_url must be an http(s) URL, got '{}'",
                    self.upstream.base_url
                ),
            });
        }
        if self.upstream.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "upstream.timeout_seconds must be non-zero".to_string(),
            });
        }
        if self.webhook.buffer_capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "webhook.buffer_capacity must be non-zero".to_string(),
            });
        }
        if self.scan.batch_size == 0 {
            return Err(ConfigError::Invalid {
                message: "scan.batch_size must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Enable CORS for the dashboard
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            enable_cors: true,
        }
    }
}

/// Upstream Adversus API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the Adversus REST API
    pub base_url: String,

    /// Basic Auth username
    pub username: String,

    /// Basic Auth password
    pub password: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.adversus.dk/v1".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: 15,
        }
    }
}

/// Webhook intake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret expected in `x-adversus-secret` or the `secret`/`key`
    /// query parameters. Empty means the webhook rejects everything.
    pub secret: String,

    /// Capacity of the in-memory debug event buffer
    pub buffer_capacity: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            buffer_capacity: 200,
        }
    }
}

/// Scan and enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Inter-record pacing delay for deep scans, in milliseconds
    pub pacing_ms: u64,

    /// Default number of leads fetched when the caller gives no limit
    pub default_limit: usize,

    /// Contact-lookup batch size for the enriched list endpoint
    pub batch_size: usize,

    /// Success vocabulary for result-status filtering. Case-insensitive
    /// exact matches; known to be incomplete across accounts, so this is
    /// deployment configuration rather than code.
    pub success_terms: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pacing_ms: 250,
            default_limit: 25,
            batch_size: 5,
            success_terms: vec![
                "success".to_string(),
                "sale".to_string(),
                "won".to_string(),
                "interested".to_string(),
                "completed".to_string(),
                "yes".to_string(),
            ],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
