//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::TimeZone;
use cns_api::outbox::BroadcastOutbox;
use cns_api::routes;
use cns_api::state::AppState;
use cns_core::clock::Clock;
use cns_session::application::command_handlers::NavigationEngine;
use cns_session::application::registry::SessionRegistry;
use cns_structure::application::loader::FileStructureLoader;
use cns_test_support::FixedClock;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Writes `proc/42` as the three-node chain A, B, C and `proc/7` as X, Y
/// into `dir`.
pub fn write_definitions(dir: &Path) {
    std::fs::write(
        dir.join("42.json"),
        r#"{
            "title": "Pump maintenance",
            "nodes": [
                { "id": "A", "title": "Alpha" },
                { "id": "B", "title": "Beta" },
                { "id": "C", "title": "Gamma" }
            ]
        }"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("7.yaml"),
        "nodes:\n  - id: X\n    title: Ex\n  - id: Y\n    title: Why\n",
    )
    .unwrap();
    std::fs::write(dir.join("empty.json"), r#"{ "nodes": [] }"#).unwrap();
}

/// Application state wired the way `main.rs` wires it, with a file loader
/// rooted at `dir` and a deterministic clock.
pub fn build_test_state(dir: &Path, outbox: &BroadcastOutbox) -> AppState {
    let engine = NavigationEngine::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(FileStructureLoader::new(dir)),
        Arc::new(outbox.clone()),
        Arc::new(outbox.clone()),
        fixed_clock(),
    )
    .with_load_timeout(Duration::from_secs(5));
    AppState::new(Arc::new(engine))
}

/// Build the full app router.
pub fn build_test_app(state: &AppState) -> Router {
    routes::router(state.clone())
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
