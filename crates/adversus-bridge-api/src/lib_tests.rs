use super::*;
use adversus_bridge_core::{
    events::MemoryEventSink,
    pacing::NoopPacer,
    upstream::{UpstreamError, UpstreamFetcher},
};
use async_trait::async_trait;
use axum::http::HeaderValue;
use serde_json::json;
use std::sync::Mutex;

const TEST_SECRET: &str = "test-secret";

/// Canned upstream keyed by path; unknown paths return 404. Requested
/// paths are recorded for assertions.
struct ScriptedFetcher {
    responses: HashMap<String, Value>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<(&str, Value)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(path, body)| (path.to_string(), body))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl UpstreamFetcher for ScriptedFetcher {
    async fn fetch_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamError> {
        let mut key = path.to_string();
        if !query.is_empty() {
            let params: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            key = format!("{key}?{}", params.join("&"));
        }
        self.requested
            .lock()
            .expect("request log lock")
            .push(key.clone());
        match self.responses.get(&key) {
            Some(body) => Ok(body.clone()),
            None => Err(UpstreamError::Status {
                status: 404,
                url: key,
                body_excerpt: "not found".to_string(),
            }),
        }
    }
}

fn test_state(fetcher: ScriptedFetcher) -> AppState {
    let mut config = config::BridgeConfig::default();
    config.webhook.secret = TEST_SECRET.to_string();
    AppState::new(
        config,
        Arc::new(fetcher),
        Arc::new(MemoryEventSink::default()),
        Arc::new(NoopPacer),
    )
}

fn secret_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        auth::SECRET_HEADER,
        HeaderValue::from_static(TEST_SECRET),
    );
    headers
}

mod webhook {
    use super::*;

    /// Verify a valid webhook is acknowledged and lands at the front of
    /// the debug buffer.
    #[tokio::test]
    async fn test_valid_webhook_acknowledged_and_buffered() {
        let state = test_state(ScriptedFetcher::empty());

        let body = Bytes::from(r#"{"event":"lead.updated","leadId":42}"#);
        let ack = handle_webhook(
            State(state.clone()),
            Query(HashMap::new()),
            secret_headers(),
            body,
        )
        .await
        .expect("webhook should succeed");
        assert!(ack.0.ok);

        let events = handle_debug_events(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
        )
        .await
        .expect("events should succeed");
        assert_eq!(events.0.count, 1);
        assert_eq!(
            events.0.events[0].event_type.as_deref(),
            Some("lead.updated")
        );
    }

    /// Verify a wrong secret is rejected and the payload is not buffered.
    #[tokio::test]
    async fn test_invalid_secret_rejected_and_not_buffered() {
        let state = test_state(ScriptedFetcher::empty());

        let mut headers = HeaderMap::new();
        headers.insert(auth::SECRET_HEADER, HeaderValue::from_static("wrong"));
        let result = handle_webhook(
            State(state.clone()),
            Query(HashMap::new()),
            headers,
            Bytes::from("{}"),
        )
        .await;
        assert!(matches!(result, Err(HandlerError::Unauthorized { .. })));

        let events = handle_debug_events(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
        )
        .await
        .expect("events should succeed");
        assert_eq!(events.0.count, 0);
    }

    /// Verify the secret is also accepted as a query parameter.
    #[tokio::test]
    async fn test_secret_accepted_via_query() {
        let state = test_state(ScriptedFetcher::empty());

        let mut query = HashMap::new();
        query.insert("secret".to_string(), TEST_SECRET.to_string());
        let ack = handle_webhook(
            State(state),
            Query(query),
            HeaderMap::new(),
            Bytes::from("{}"),
        )
        .await
        .expect("query secret should authorize");
        assert!(ack.0.ok);
    }

    /// Verify a non-JSON body is rejected with a payload error.
    #[tokio::test]
    async fn test_non_json_body_rejected() {
        let state = test_state(ScriptedFetcher::empty());

        let result = handle_webhook(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
            Bytes::from("not json"),
        )
        .await;
        assert!(matches!(result, Err(HandlerError::InvalidPayload { .. })));
    }
}

mod inventory {
    use super::*;

    /// Verify the field inventory is computed over the fetched lead list.
    #[tokio::test]
    async fn test_lead_fields_inventory() {
        let fetcher = ScriptedFetcher::new(vec![(
            "leads",
            json!({
                "total": 2,
                "leads": [
                    { "id": 1, "phone": "555-0001", "status": "new" },
                    { "id": 2, "status": "closed" }
                ]
            }),
        )]);
        let state = test_state(fetcher);

        let response = handle_lead_fields(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
        )
        .await
        .expect("inventory should succeed");

        assert!(response.0.ok);
        assert_eq!(response.0.total_rows, 2);
        let phone = response
            .0
            .fields
            .iter()
            .find(|f| f.field == "lead.phone")
            .expect("phone field present");
        assert_eq!(phone.count, 1);
        assert_eq!(phone.coverage_pct, Some(50));
    }

    /// Verify an upstream failure on the primary list surfaces as a
    /// gateway error.
    #[tokio::test]
    async fn test_upstream_failure_maps_to_error() {
        let state = test_state(ScriptedFetcher::empty());

        let result = handle_lead_fields(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
        )
        .await;
        assert!(matches!(result, Err(HandlerError::Upstream(_))));
    }

    /// Verify the limit query parameter truncates the scanned list.
    #[tokio::test]
    async fn test_limit_parameter_truncates() {
        let fetcher = ScriptedFetcher::new(vec![(
            "leads",
            json!([
                { "id": 1, "phone": "a" },
                { "id": 2, "phone": "b" },
                { "id": 3, "phone": "c" }
            ]),
        )]);
        let state = test_state(fetcher);

        let mut query = HashMap::new();
        query.insert("limit".to_string(), "2".to_string());
        let response = handle_lead_fields(State(state), Query(query), secret_headers())
            .await
            .expect("inventory should succeed");

        assert_eq!(response.0.total_rows, 2);
        assert!(response.0.truncated);
    }
}

mod result_fields {
    use super::*;

    /// Verify the deep scan probes per-lead sources and aggregates by ID
    /// and by label, carrying the attempt trail in `diag`.
    #[tokio::test]
    async fn test_deep_scan_aggregates_and_reports_diag() {
        let fetcher = ScriptedFetcher::new(vec![
            (
                "leads",
                json!({ "leads": [{ "id": 7 }, { "id": 8 }] }),
            ),
            // ID-keyed field map for lead 7, labeled descriptors for lead 8.
            ("leads/7", json!({ "resultFields": { "101": "sale" } })),
            (
                "leads/8",
                json!({
                    "resultFields": [
                        { "label": "Outcome", "value": "sale" }
                    ]
                }),
            ),
        ]);
        let state = test_state(fetcher);

        let response = handle_result_fields(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
        )
        .await
        .expect("deep scan should succeed");

        assert!(response.0.ok);
        assert_eq!(response.0.scanned, 2);
        assert_eq!(response.0.ids, vec!["7".to_string(), "8".to_string()]);
        assert_eq!(response.0.by_id.len(), 1);
        assert_eq!(response.0.by_id[0].field, "101");
        assert_eq!(response.0.by_id[0].count, 1);
        assert_eq!(response.0.by_label.len(), 1);
        assert_eq!(response.0.by_label[0].field, "Outcome");
        // Sample comes from the first lead that yielded tuples.
        assert_eq!(response.0.sample.len(), 1);
        assert_eq!(response.0.sample[0].id, Some(101));
        assert_eq!(response.0.diag.len(), 2);
        assert!(response.0.diag.iter().all(|a| a.succeeded));
    }

    /// Verify per-record probe failures keep the response best-effort.
    #[tokio::test]
    async fn test_probe_failures_do_not_fail_request() {
        let fetcher = ScriptedFetcher::new(vec![(
            "leads",
            json!({ "leads": [{ "id": 7 }] }),
        )]);
        let state = test_state(fetcher);

        let response = handle_result_fields(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
        )
        .await
        .expect("deep scan stays best-effort");

        assert!(response.0.ok);
        assert_eq!(response.0.scanned, 1);
        assert!(response.0.by_id.is_empty());
        assert!(response.0.sample.is_empty());
        // Every candidate source was attempted and reported.
        assert_eq!(
            response.0.diag.len(),
            default_result_sources().len()
        );
        assert!(response.0.diag.iter().all(|a| !a.succeeded));
    }
}

mod enriched {
    use super::*;

    /// Verify contacts are joined onto leads under the `contact` field.
    #[tokio::test]
    async fn test_enriched_leads_join() {
        let fetcher = ScriptedFetcher::new(vec![
            (
                "leads",
                json!({
                    "total": 2,
                    "leads": [
                        { "id": 1, "contactId": 10 },
                        { "id": 2 }
                    ]
                }),
            ),
            ("contacts/10", json!({ "name": "Ada" })),
        ]);
        let state = test_state(fetcher);

        let response = handle_enriched_leads(
            State(state),
            Query(HashMap::new()),
            secret_headers(),
        )
        .await
        .expect("enrichment should succeed");

        assert!(response.0.ok);
        assert_eq!(response.0.total_count, 2);
        assert_eq!(response.0.returned, 2);
        assert_eq!(response.0.data[0]["contact"]["name"], "Ada");
        assert_eq!(response.0.data[1]["contact"], Value::Null);
    }
}

mod sources {
    use super::*;

    /// Verify the ID template substitutes into both path and query.
    #[test]
    fn test_source_templates() {
        let sources = default_result_sources();
        let id = RecordId::new(42);

        assert_eq!(sources[0].path_for(&id), "leads/42");
        assert_eq!(sources[1].path_for(&id), "leads/42/results");
        assert_eq!(
            sources[2].query_for(&id),
            vec![("leadId".to_string(), "42".to_string())]
        );
    }
}

mod errors {
    use super::*;

    /// Verify the error-to-status mapping and the envelope shape.
    #[tokio::test]
    async fn test_error_status_mapping() {
        let unauthorized = HandlerError::Unauthorized {
            message: "Missing secret".to_string(),
        }
        .into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let bad_request = HandlerError::InvalidPayload {
            message: "nope".to_string(),
        }
        .into_response();
        assert_eq!(bad_request.status(), StatusCode::BAD_REQUEST);

        let gateway = HandlerError::Upstream(UpstreamError::Status {
            status: 500,
            url: "leads".to_string(),
            body_excerpt: String::new(),
        })
        .into_response();
        assert_eq!(gateway.status(), StatusCode::BAD_GATEWAY);

        let timeout = HandlerError::Upstream(UpstreamError::Timeout {
            url: "leads".to_string(),
            timeout_seconds: 15,
        })
        .into_response();
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
