mod common;

use std::sync::Arc;

use axum::{Router, routing::post};
use axum_test::TestServer;
use chrono::Utc;
use common::{FaultyAdapter, MemoryAdapter, UnreachableAdapter, link_by};
use serde_json::json;
use shortstack::api::handlers::track_handler;
use shortstack::prelude::*;

fn server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/api/track", post(track_handler))
        .with_state(state);
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_track_logs_event_and_increments_clicks() {
    let adapter = Arc::new(MemoryAdapter::new());
    adapter.seed_link(link_by("abc123", "203.0.113.7", Utc::now()));

    let server = server(common::test_state(vec![adapter.clone()]));

    let response = server
        .post("/api/track")
        .add_header("user-agent", "Firefox/140.0")
        .add_header("x-forwarded-for", "198.51.100.2")
        .json(&json!({ "short_code": "abc123", "city": "Berlin", "country": "DE" }))
        .await;

    response.assert_status(axum::http::StatusCode::ACCEPTED);
    assert_eq!(response.json::<serde_json::Value>()["success"], true);

    assert_eq!(adapter.event_count(), 1);
    assert_eq!(adapter.link("abc123").unwrap().clicks, 1);
}

#[tokio::test]
async fn test_track_stores_precise_coordinates() {
    let adapter = Arc::new(MemoryAdapter::new());
    let server = server(common::test_state(vec![adapter.clone()]));

    let response = server
        .post("/api/track")
        .json(&json!({
            "short_code": "abc123",
            "latitude": 52.52,
            "longitude": 13.405
        }))
        .await;

    response.assert_status(axum::http::StatusCode::ACCEPTED);
    assert_eq!(adapter.event_count(), 1);
}

#[tokio::test]
async fn test_track_rejects_out_of_range_coordinates() {
    let server = server(common::test_state(vec![Arc::new(MemoryAdapter::new())]));

    let response = server
        .post("/api/track")
        .json(&json!({ "short_code": "abc123", "latitude": 123.0, "longitude": 13.4 }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_track_unknown_code_is_accepted() {
    // The event reference is not enforced; the increment is a no-op.
    let adapter = Arc::new(MemoryAdapter::new());
    let server = server(common::test_state(vec![adapter.clone()]));

    let response = server
        .post("/api/track")
        .json(&json!({ "short_code": "zzz999" }))
        .await;

    response.assert_status(axum::http::StatusCode::ACCEPTED);
    assert_eq!(adapter.event_count(), 1);
    assert!(!adapter.has_link("zzz999"));
}

#[tokio::test]
async fn test_track_hides_a_single_broken_backend() {
    let healthy = Arc::new(MemoryAdapter::new());
    let server = server(common::test_state(vec![
        Arc::new(FaultyAdapter) as Arc<dyn StorageAdapter>,
        healthy.clone(),
    ]));

    let response = server
        .post("/api/track")
        .json(&json!({ "short_code": "abc123" }))
        .await;

    response.assert_status(axum::http::StatusCode::ACCEPTED);
    assert_eq!(healthy.event_count(), 1);
}

#[tokio::test]
async fn test_track_surfaces_total_outage() {
    // A total write outage is the only tracking failure the caller sees.
    let server = server(common::test_state(vec![
        Arc::new(FaultyAdapter) as Arc<dyn StorageAdapter>,
        Arc::new(UnreachableAdapter),
    ]));

    let response = server
        .post("/api/track")
        .json(&json!({ "short_code": "abc123" }))
        .await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
}
