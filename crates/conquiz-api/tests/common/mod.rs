//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use conquiz_game::domain::settings::GameSettings;
use conquiz_store::StaticTriviaCatalog;
use conquiz_test_support::{FixedClock, MockRng};
use http_body_util::BodyExt;
use tower::ServiceExt;

use conquiz_api::routes;
use conquiz_api::state::AppState;

/// Build the in-memory state with the built-in catalog and a fixed clock.
pub fn build_test_state() -> AppState {
    let trivia = Arc::new(StaticTriviaCatalog::sample(Box::new(MockRng)).unwrap());
    AppState::in_memory(GameSettings::default(), trivia, Arc::new(FixedClock::default()))
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app(state: AppState) -> Router {
    routes::router().with_state(state)
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
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
