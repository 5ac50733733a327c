// Health endpoints against the real built-in provider.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use cloudcv_backend::config::Config;
use cloudcv_backend::native::NativeProvider;
use cloudcv_backend::state::AppState;

fn test_app() -> axum::Router {
    let state = AppState::new(Config::default(), Arc::new(NativeProvider::new())).unwrap();
    state.mark_ready();
    cloudcv_backend::create_router(state)
}

/// Collect a response body into a `serde_json::Value`.
async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let response = test_app().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_endpoint_returns_json_with_status_field() {
    let json = body_json(test_app().oneshot(get("/api/health")).await.unwrap()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["capabilities"][0], "dominantColors");
}

#[tokio::test]
async fn readiness_endpoint_returns_ok() {
    let response = test_app().oneshot(get("/api/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ready"], true);
}

#[tokio::test]
async fn build_information_invokes_without_input() {
    let request = Request::builder()
        .method("POST")
        .uri("/buildInformation")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
