//! # Adversus-Bridge Service
//!
//! Binary entry point for the Adversus bridge HTTP service.
//!
//! This executable:
//! - Loads configuration from environment and files
//! - Initializes logging
//! - Wires the upstream client, event sink, and scan pacer
//! - Starts the HTTP server from adversus-bridge-api

use adversus_bridge_api::{config::BridgeConfig, start_server, AppState, ServiceError};
use adversus_bridge_client::{AdversusClient, ClientConfig};
use adversus_bridge_core::{events::MemoryEventSink, pacing::FixedDelayPacer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "adversus_bridge_service=info,adversus_bridge_api=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Adversus-Bridge Service");

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order, later sources override earlier ones):
    //  1. /etc/adversus-bridge/service.toml          system-wide defaults
    //  2. ./config/service.toml                      deployment-local override
    //  3. Path given by ADVERSUS_BRIDGE_CONFIG_FILE  operator-specified file
    //  4. Environment variables prefixed ADVERSUS_BRIDGE__ (double-underscore
    //     separator), e.g. ADVERSUS_BRIDGE__SERVER__PORT=9090
    //
    // Every field carries a serde default, so an entirely unconfigured
    // environment yields a valid development config. A malformed file or an
    // uncoercible environment variable is a hard error: that is deliberate
    // but broken operator configuration.
    // -------------------------------------------------------------------------
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/adversus-bridge/service")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Toml),
        );

    // Optional explicit path supplied by the operator.
    if let Ok(explicit_path) = std::env::var("ADVERSUS_BRIDGE_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Toml),
            );
            info!(path = %explicit_path, "Loading configuration from explicit path");
        }
    }

    let raw_config = match config_builder
        .add_source(config::Environment::with_prefix("ADVERSUS_BRIDGE").separator("__"))
        .build()
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(3);
        }
    };

    let bridge_config: BridgeConfig = match raw_config.try_deserialize() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(
                error = %e,
                "Could not deserialize service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = bridge_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    if bridge_config.webhook.secret.is_empty() {
        // Intake stays closed until a secret is configured; boot anyway so
        // the health endpoint comes up.
        tracing::warn!("No webhook secret configured; all intake requests will be rejected");
    }

    // -------------------------------------------------------------------------
    // Wire dependencies
    // -------------------------------------------------------------------------
    let client_config = ClientConfig::new(
        &bridge_config.upstream.base_url,
        &bridge_config.upstream.username,
        &bridge_config.upstream.password,
    )
    .with_timeout(Duration::from_secs(bridge_config.upstream.timeout_seconds));

    let upstream = match AdversusClient::new(client_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to construct upstream client; aborting");
            std::process::exit(3);
        }
    };

    let events = Arc::new(MemoryEventSink::new(bridge_config.webhook.buffer_capacity));
    let pacer = Arc::new(FixedDelayPacer::from_millis(bridge_config.scan.pacing_ms));

    info!(
        host = %bridge_config.server.host,
        port = bridge_config.server.port,
        upstream = %bridge_config.upstream.base_url,
        "Starting HTTP server"
    );

    let state = AppState::new(bridge_config, upstream, events, pacer);

    // Start the server
    if let Err(e) = start_server(state).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}
