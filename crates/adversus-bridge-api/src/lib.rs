//! # Adversus-Bridge HTTP Service
//!
//! HTTP layer for the Adversus bridge: receives webhook callbacks from the
//! Adversus dialer platform and serves normalized read endpoints for the
//! downstream dashboard.
//!
//! This service provides:
//! - Webhook endpoint with shared-secret validation
//! - A debug view of recently received webhook events
//! - Field-inventory endpoints built on the core normalization engine
//! - A contact-enriched lead list endpoint

// Public modules
pub mod auth;
pub mod config;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod lib_tests;

use adversus_bridge_core::{
    aggregate::FieldAggregator,
    events::{record_best_effort, EventSink, WebhookEvent},
    fetch::{fetch_list, ListPage},
    inventory::aggregate_records,
    join::join_records,
    pacing::Pacer,
    probe::{ProbeAttempt, RecordProber, SourceDescriptor, SuccessFilter},
    upstream::{UpstreamError, UpstreamFetcher},
    value::FieldTuple,
    FieldSummary, RecordId,
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use crate::config::BridgeConfig;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

pub use auth::{authorize, AuthOutcome};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: BridgeConfig,

    /// Upstream Adversus API fetcher
    pub upstream: Arc<dyn UpstreamFetcher>,

    /// Sink for received webhook events
    pub events: Arc<dyn EventSink>,

    /// Pacer inserted between records during deep scans
    pub pacer: Arc<dyn Pacer>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: BridgeConfig,
        upstream: Arc<dyn UpstreamFetcher>,
        events: Arc<dyn EventSink>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            config,
            upstream,
            events,
            pacer,
        }
    }

    fn success_filter(&self) -> SuccessFilter {
        SuccessFilter::new(self.config.scan.success_terms.iter().cloned())
    }
}

// ============================================================================
// HTTP Router
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route("/webhook/adversus", post(handle_webhook))
        .route("/webhook/adversus/events", get(handle_debug_events));

    let api_routes = Router::new()
        .route("/api/leads/fields", get(handle_lead_fields))
        .route("/api/leads/result-fields", get(handle_result_fields))
        .route("/api/leads/enriched", get(handle_enriched_leads));

    let health_routes = Router::new().route("/health", get(handle_health_check));

    Router::new()
        .merge(webhook_routes)
        .merge(api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start the HTTP server with graceful shutdown on SIGINT/SIGTERM.
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let shutdown_timeout =
        std::time::Duration::from_secs(state.config.server.shutdown_timeout_seconds);

    let app = create_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: addr.clone(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {addr}");

    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C signal handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
        }
    };

    // In-flight requests complete before the server exits; new connections
    // stop being accepted as soon as the signal arrives.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle Adversus webhook callbacks.
///
/// The caller retries on slow or failed responses, so the handler does only
/// fast in-process work before acknowledging: secret check, JSON parse,
/// event capture. A sink failure is logged and swallowed — the 200
/// acknowledgment never depends on persistence.
#[instrument(skip_all)]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, HandlerError> {
    require_secret(&state, &headers, &query)?;

    let payload: Value = serde_json::from_slice(&body).map_err(|e| HandlerError::InvalidPayload {
        message: format!("Body is not valid JSON: {e}"),
    })?;

    let event = WebhookEvent::capture(payload);
    info!(event_type = ?event.event_type, "Received webhook event");

    record_best_effort(state.events.as_ref(), event).await;

    Ok(Json(Ack { ok: true }))
}

/// Read the debug buffer of recently received webhook events, newest first.
#[instrument(skip_all)]
pub async fn handle_debug_events(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<DebugEventsResponse>, HandlerError> {
    require_secret(&state, &headers, &query)?;

    let limit = parse_limit(&query).unwrap_or(state.config.webhook.buffer_capacity);
    let events = state
        .events
        .recent(limit)
        .await
        .unwrap_or_else(|error| {
            warn!(%error, "Failed to read event sink");
            Vec::new()
        });

    Ok(Json(DebugEventsResponse {
        ok: true,
        count: events.len(),
        events,
    }))
}

// ============================================================================
// Inventory Handlers
// ============================================================================

/// Field-coverage inventory over a fetched lead list.
#[instrument(skip_all)]
pub async fn handle_lead_fields(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<FieldInventoryResponse>, HandlerError> {
    require_secret(&state, &headers, &query)?;

    let limit = parse_limit(&query).unwrap_or(state.config.scan.default_limit);
    let page = fetch_list(state.upstream.as_ref(), "leads", &[], Some(limit)).await?;

    let total_rows = page.records.len();
    let aggregator = aggregate_records(&page.records);
    let fields = aggregator.summarize(Some(total_rows as u64));

    Ok(Json(FieldInventoryResponse {
        ok: true,
        total_rows,
        truncated: page.truncated,
        fields,
    }))
}

/// Deep result-field discovery: probe each lead's candidate sources in
/// order, aggregating the winning tuples by numeric ID and by label.
///
/// Probe failures never fail the request: the response is best-effort
/// partial data plus the verbatim attempt trail under `diag`.
#[instrument(skip_all)]
pub async fn handle_result_fields(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<ResultFieldsResponse>, HandlerError> {
    require_secret(&state, &headers, &query)?;

    let limit = parse_limit(&query).unwrap_or(state.config.scan.default_limit);
    let page = fetch_list(state.upstream.as_ref(), "leads", &[], Some(limit)).await?;
    let ids: Vec<RecordId> = page
        .records
        .iter()
        .filter_map(|record| record.get("id").and_then(RecordId::from_json))
        .collect();

    let sources = default_result_sources();
    let prober = RecordProber::new(state.upstream.as_ref(), state.pacer.as_ref())
        .with_success_filter(state.success_filter());
    let outcomes = prober.probe_records(&ids, &sources).await;

    let scanned = outcomes.len();
    let mut by_id = FieldAggregator::new();
    let mut by_label = FieldAggregator::new();
    let mut sample: Vec<FieldTuple> = Vec::new();
    let mut diag: Vec<ProbeAttempt> = Vec::new();

    for outcome in outcomes {
        // One hit per key per record, so coverage stays a fraction of
        // scanned records even when a source repeats a field.
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut seen_labels: HashSet<String> = HashSet::new();
        for tuple in &outcome.tuples {
            if let Some(id) = tuple.id {
                let key = id.to_string();
                if seen_ids.insert(key.clone()) {
                    by_id.hit(&key, &tuple.value);
                }
            }
            if let Some(label) = &tuple.label {
                if seen_labels.insert(label.clone()) {
                    by_label.hit(label, &tuple.value);
                }
            }
        }
        if sample.is_empty() && !outcome.tuples.is_empty() {
            sample = outcome.tuples.clone();
        }
        diag.extend(outcome.attempts);
    }

    Ok(Json(ResultFieldsResponse {
        ok: true,
        scanned,
        ids: ids.iter().map(|id| id.as_str().to_string()).collect(),
        by_id: by_id.summarize(Some(scanned as u64)),
        by_label: by_label.summarize(Some(scanned as u64)),
        sample,
        diag,
    }))
}

/// Lead list with contacts joined on via `contactId`.
#[instrument(skip_all)]
pub async fn handle_enriched_leads(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<EnrichedListResponse>, HandlerError> {
    require_secret(&state, &headers, &query)?;

    let limit = parse_limit(&query).unwrap_or(state.config.scan.default_limit);
    let page: ListPage = fetch_list(state.upstream.as_ref(), "leads", &[], Some(limit)).await?;
    let total_count = page.total_count;

    let upstream = state.upstream.clone();
    let joined = join_records(
        page.records,
        "contactId",
        |contact_id| {
            let upstream = upstream.clone();
            async move {
                upstream
                    .fetch_json(&format!("contacts/{contact_id}"), &[])
                    .await
                    .map(Some)
            }
        },
        state.config.scan.batch_size,
    )
    .await;

    let data: Vec<Value> = joined
        .into_iter()
        .map(|record| record.merged("contact"))
        .collect();

    Ok(Json(EnrichedListResponse {
        ok: true,
        url: "leads".to_string(),
        total_count,
        returned: data.len(),
        data,
    }))
}

// ============================================================================
// Health Handler
// ============================================================================

/// Basic liveness check.
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Probe sources
// ============================================================================

/// The ordered candidate sources for a lead's result fields.
///
/// None of these shapes is authoritative: which one answers depends on the
/// account's configuration, which is why all of them are tried in order.
pub fn default_result_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            name: "lead".to_string(),
            path: "leads/{id}".to_string(),
            query: Vec::new(),
            extract_paths: vec![
                "resultFields".to_string(),
                "resultData".to_string(),
                "data.resultFields".to_string(),
                "data.leads.0.resultFields".to_string(),
            ],
            filter_results: false,
        },
        SourceDescriptor {
            name: "lead-results".to_string(),
            path: "leads/{id}/results".to_string(),
            query: Vec::new(),
            extract_paths: vec![String::new(), "results".to_string(), "data".to_string()],
            filter_results: true,
        },
        SourceDescriptor {
            name: "results-query".to_string(),
            path: "results".to_string(),
            query: vec![("leadId".to_string(), "{id}".to_string())],
            extract_paths: vec![String::new(), "results".to_string(), "data".to_string()],
            filter_results: true,
        },
    ]
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| adversus_bridge_core::CorrelationId::new().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();
    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// ============================================================================
// Helpers
// ============================================================================

fn require_secret(
    state: &AppState,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Result<(), HandlerError> {
    match authorize(&state.config.webhook.secret, headers, query) {
        AuthOutcome::Authorized => Ok(()),
        AuthOutcome::MissingSecret => Err(HandlerError::Unauthorized {
            message: "Missing secret".to_string(),
        }),
        AuthOutcome::InvalidSecret => Err(HandlerError::Unauthorized {
            message: "Invalid secret".to_string(),
        }),
    }
}

fn parse_limit(query: &HashMap<String, String>) -> Option<usize> {
    query.get("limit").and_then(|v| v.parse::<usize>().ok())
}

// ============================================================================
// Response Types
// ============================================================================

/// Plain acknowledgment
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

/// Debug event listing response
#[derive(Debug, Serialize)]
pub struct DebugEventsResponse {
    pub ok: bool,
    pub count: usize,
    pub events: Vec<WebhookEvent>,
}

/// Field-coverage inventory response
#[derive(Debug, Serialize)]
pub struct FieldInventoryResponse {
    pub ok: bool,
    pub total_rows: usize,
    pub truncated: bool,
    pub fields: Vec<FieldSummary>,
}

/// Deep result-field discovery response
#[derive(Debug, Serialize)]
pub struct ResultFieldsResponse {
    pub ok: bool,
    pub scanned: usize,
    pub ids: Vec<String>,
    #[serde(rename = "byId")]
    pub by_id: Vec<FieldSummary>,
    #[serde(rename = "byLabel")]
    pub by_label: Vec<FieldSummary>,
    pub sample: Vec<FieldTuple>,
    pub diag: Vec<ProbeAttempt>,
}

/// Contact-enriched lead list response
#[derive(Debug, Serialize)]
pub struct EnrichedListResponse {
    pub ok: bool,
    pub url: String,
    pub total_count: u64,
    pub returned: usize,
    pub data: Vec<Value>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Error Types
// ============================================================================

/// Handler errors with HTTP status code mapping.
///
/// - `401 Unauthorized`: missing or mismatched shared secret. The secret
///   value is never echoed or logged.
/// - `400 Bad Request`: malformed request payloads.
/// - `502 Bad Gateway` / `504 Gateway Timeout`: the upstream Adversus API
///   failed; the response carries the upstream status and a body excerpt.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    #[error("Upstream failure: {0}")]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message.clone()),
            Self::InvalidPayload { message } => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Upstream(error) => {
                let status = match error {
                    UpstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, error.to_string())
            }
        };

        let body = serde_json::json!({
            "ok": false,
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
