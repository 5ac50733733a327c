// ---------------------------------------------------------------------------
// handlers/system.rs — Health and readiness probes
// ---------------------------------------------------------------------------

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::{HealthResponse, ReadinessResponse};
use crate::openapi::API_TITLE;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.is_ready() { "ok" } else { "starting" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        app: API_TITLE.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        capabilities: state.registry.list().map(|d| d.name.clone()).collect(),
    })
}

/// GET /api/health/ready — lightweight readiness probe.
pub async fn readiness(State(state): State<AppState>) -> Response {
    let ready = state.is_ready();
    let body = ReadinessResponse {
        ready,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        capabilities: state.registry.len(),
    };

    if ready {
        (StatusCode::OK, Json(body)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}
