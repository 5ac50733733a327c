// ---------------------------------------------------------------------------
// handlers/analyze.rs — Fixed-name routes for dominant color analysis
// ---------------------------------------------------------------------------
//
// `GET ?image=<url>` and `POST` with an upload both go through the same
// dispatch path as `POST /dominantColors`.

use axum::extract::{Query, Request, State};
use axum::Json;
use serde_json::Value;

use crate::dispatch::{DispatchError, RawRequest};
use crate::native::dominant_colors;
use crate::state::AppState;

use super::capabilities::dispatch_request;

/// GET /v1/image/analyze/dominantColors?image=<url>
pub async fn dominant_colors_by_url(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, DispatchError> {
    let raw = RawRequest {
        params,
        ..RawRequest::default()
    };
    state
        .dispatcher
        .dispatch(dominant_colors::NAME, raw)
        .await
        .map(Json)
}

/// POST /v1/image/analyze/dominantColors
pub async fn dominant_colors_upload(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    request: Request,
) -> Result<Json<Value>, DispatchError> {
    dispatch_request(&state, dominant_colors::NAME, params, request).await
}
