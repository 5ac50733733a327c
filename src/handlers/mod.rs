// ---------------------------------------------------------------------------
// handlers/ — HTTP surface
// Sub-modules group routes by concern; mod.rs re-exports the handlers used
// by `create_router` and maps dispatch errors onto HTTP responses.
// ---------------------------------------------------------------------------

pub(crate) mod analyze;
pub(crate) mod capabilities;
pub(crate) mod docs;
pub(crate) mod system;

pub use analyze::{dominant_colors_by_url, dominant_colors_upload};
pub use capabilities::{describe_capability, invoke_capability};
pub use docs::{docs_capability, docs_index, spec_json};
pub use system::{health, readiness};

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::dispatch::DispatchError;

// ---------------------------------------------------------------------------
// Error → response mapping
// ---------------------------------------------------------------------------

impl DispatchError {
    /// Machine-readable error code for each variant.
    pub fn error_code(&self) -> &'static str {
        match self {
            DispatchError::UnknownCapability(_) => "UNKNOWN_CAPABILITY",
            DispatchError::MissingParameter(_) => "MISSING_PARAMETER",
            DispatchError::InvalidUrl { .. } => "INVALID_URL",
            DispatchError::MalformedBody(_) => "MALFORMED_BODY",
            DispatchError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            DispatchError::Provider(_) => "PROVIDER_INVOCATION_FAILURE",
            DispatchError::Transport(_) => "TRANSPORT_FAILURE",
        }
    }

    /// HTTP status code for each variant. Missing input is always 400.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::UnknownCapability(_) => StatusCode::NOT_FOUND,
            DispatchError::MissingParameter(_)
            | DispatchError::InvalidUrl { .. }
            | DispatchError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            DispatchError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DispatchError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Router fallback: unmatched paths still get a JSON body.
pub async fn not_found(uri: Uri) -> Response {
    let body = json!({
        "code": "NOT_FOUND",
        "message": format!("No route for {}", uri.path()),
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
