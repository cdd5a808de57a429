//! Integration tests for deep result-field discovery: multi-source probing,
//! short-circuiting, success filtering, and the diagnostic trail.

mod common;

use axum::http::StatusCode;
use common::{app_with_upstream, authorized_get, send};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The first source yields nothing, the second yields fields, and the third
/// is never fetched. The attempt trail records exactly what happened.
#[tokio::test]
async fn test_probe_short_circuits_and_reports_trail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "leads": [ { "id": 5 } ]
        })))
        .mount(&server)
        .await;
    // First source answers but carries no recognizable fields.
    Mock::given(method("GET"))
        .and(path("/leads/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leads/5/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "status": "Sale", "resultData": { "101": "yes" } }
        ])))
        .mount(&server)
        .await;
    // The third source must never be fetched once the second matched.
    Mock::given(method("GET"))
        .and(path("/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_with_upstream(&server.uri());
    let (status, body) = send(&app, authorized_get("/api/leads/result-fields")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["scanned"], 1);
    assert_eq!(body["ids"][0], "5");

    assert_eq!(body["byId"][0]["field"], "101");
    assert_eq!(body["byId"][0]["count"], 1);
    assert_eq!(body["sample"][0]["id"], 101);
    assert_eq!(body["sample"][0]["value"], "yes");

    let diag = body["diag"].as_array().expect("diag array");
    assert_eq!(diag.len(), 2);
    assert_eq!(diag[0]["source"], "lead");
    assert_eq!(diag[0]["succeeded"], false);
    assert_eq!(diag[1]["source"], "lead-results");
    assert_eq!(diag[1]["succeeded"], true);
    assert_eq!(diag[1]["item_count"], 1);
}

/// Result records outside the success vocabulary contribute nothing.
#[tokio::test]
async fn test_success_filter_excludes_non_matching_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "leads": [ { "id": 9 } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leads/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leads/9/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "status": "no-answer", "resultData": { "101": "ignored" } },
            { "status": "won", "resultData": [ { "label": "Deal", "value": "big" } ] }
        ])))
        .mount(&server)
        .await;

    let app = app_with_upstream(&server.uri());
    let (_, body) = send(&app, authorized_get("/api/leads/result-fields")).await;

    assert_eq!(body["byLabel"][0]["field"], "Deal");
    assert_eq!(body["byLabel"][0]["example"], "big");
    assert!(body["byId"].as_array().expect("byId array").is_empty());
}

/// A record that carries the same field in several successful results still
/// counts once, so coverage stays a fraction of scanned records.
#[tokio::test]
async fn test_repeated_field_counts_once_per_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "leads": [ { "id": 7 } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leads/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    // Two winning results both carry field 101.
    Mock::given(method("GET"))
        .and(path("/leads/7/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "status": "won", "resultData": { "101": "first" } },
            { "status": "sale", "resultData": { "101": "second" } }
        ])))
        .mount(&server)
        .await;

    let app = app_with_upstream(&server.uri());
    let (status, body) = send(&app, authorized_get("/api/leads/result-fields")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scanned"], 1);
    assert_eq!(body["byId"][0]["field"], "101");
    assert_eq!(body["byId"][0]["count"], 1);
    assert_eq!(body["byId"][0]["coverage_pct"], 100);
    // First occurrence within the record supplies the example.
    assert_eq!(body["byId"][0]["example"], "first");
}

/// A lead whose every source fails still appears in the trail, and the
/// request stays a 200 with partial data.
#[tokio::test]
async fn test_probe_failures_stay_best_effort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "leads": [ { "id": 1 }, { "id": 2 } ]
        })))
        .mount(&server)
        .await;
    // Only lead 2 has any source answering.
    Mock::given(method("GET"))
        .and(path("/leads/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultFields": [ { "label": "Phone", "value": "555" } ]
        })))
        .mount(&server)
        .await;

    let app = app_with_upstream(&server.uri());
    let (status, body) = send(&app, authorized_get("/api/leads/result-fields")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["scanned"], 2);
    assert_eq!(body["byLabel"][0]["field"], "Phone");

    let diag = body["diag"].as_array().expect("diag array");
    // Lead 1 exhausted all three sources, lead 2 matched its first.
    assert_eq!(diag.len(), 4);
    assert!(diag.iter().take(3).all(|a| a["succeeded"] == false));
    assert_eq!(diag[3]["record_id"], "2");
    assert_eq!(diag[3]["succeeded"], true);
}
