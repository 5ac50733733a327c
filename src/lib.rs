pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod handlers;
pub mod models;
pub mod native;
pub mod openapi;
pub mod provider;
pub mod registry;
pub mod state;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router with the given state.
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a network port.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    // Any origin may call the API; browsers send these two headers with uploads.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([HeaderName::from_static("x-requested-with"), header::CONTENT_TYPE]);

    Router::new()
        // Health
        .route("/api/health", get(handlers::health))
        .route("/api/health/ready", get(handlers::readiness))
        // Docs
        .route("/docs", get(handlers::docs_index))
        .route("/docs/{name}", get(handlers::docs_capability))
        .route("/spec.json", get(handlers::spec_json))
        // Fixed-name fast path
        .route(
            "/v1/image/analyze/dominantColors",
            get(handlers::dominant_colors_by_url).post(handlers::dominant_colors_upload),
        )
        // One route per registered capability
        .route(
            "/{name}",
            get(handlers::describe_capability).post(handlers::invoke_capability),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id))
        .layer(cors)
        .with_state(state)
}

/// The router plus the outer layers `main` serves. Size limits live inside
/// the router so an oversized body still gets a JSON 413 with CORS headers.
pub fn build_app(state: AppState) -> Router {
    let nosniff: SetResponseHeaderLayer<HeaderValue> = SetResponseHeaderLayer::overriding(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    create_router(state).layer(nosniff).layer(
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        }),
    )
}

/// Tag each request with an id, echo it back, and scope its logs to it.
async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&id) {
        req.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let span = tracing::info_span!("request", request_id = %id);
    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
