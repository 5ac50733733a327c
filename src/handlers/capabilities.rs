// ---------------------------------------------------------------------------
// handlers/capabilities.rs — Generic describe / invoke per capability
// ---------------------------------------------------------------------------

use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::Json;
use serde_json::Value;

use crate::dispatch::{DispatchError, RawRequest};
use crate::fetch::DownloadSession;
use crate::provider::Descriptor;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// GET /{name} — descriptor of one capability.
pub async fn describe_capability(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Descriptor>, DispatchError> {
    state
        .registry
        .lookup(&name)
        .map(|c| Json(c.descriptor().clone()))
        .ok_or(DispatchError::UnknownCapability(name))
}

/// POST /{name} — query params plus a multipart or JSON body.
pub async fn invoke_capability(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    request: Request,
) -> Result<Json<Value>, DispatchError> {
    dispatch_request(&state, &name, params, request).await
}

/// Shared by the generic route and the fixed-name fast paths.
pub(crate) async fn dispatch_request(
    state: &AppState,
    name: &str,
    params: Vec<(String, String)>,
    request: Request,
) -> Result<Json<Value>, DispatchError> {
    // Resolve before touching the body.
    if state.registry.lookup(name).is_none() {
        tracing::warn!(capability = %name, outcome = "rejected", "dispatch rejected: unknown capability");
        return Err(DispatchError::UnknownCapability(name.to_string()));
    }

    let mut raw = RawRequest {
        params,
        ..RawRequest::default()
    };
    read_body(request, &mut raw, state.config.max_payload_bytes).await?;

    state.dispatcher.dispatch(name, raw).await.map(Json)
}

// ---------------------------------------------------------------------------
// Body marshalling
// ---------------------------------------------------------------------------

async fn read_body(request: Request, raw: &mut RawRequest, field_limit: u64) -> Result<(), DispatchError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| DispatchError::MalformedBody(e.body_text()))?;
        return read_multipart(multipart, raw, field_limit).await;
    }

    if content_type.starts_with("application/json") {
        let bytes = Bytes::from_request(request, &()).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                DispatchError::PayloadTooLarge { limit: field_limit }
            } else {
                DispatchError::MalformedBody(e.body_text())
            }
        })?;
        if bytes.is_empty() {
            return Ok(());
        }
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => raw.body.extend(map),
            Ok(Value::Null) => {}
            Ok(_) => return Err(DispatchError::MalformedBody("JSON body must be an object".into())),
            Err(e) => return Err(DispatchError::MalformedBody(e.to_string())),
        }
    }

    Ok(())
}

/// Fields with a filename are uploads; the rest are text params.
async fn read_multipart(mut multipart: Multipart, raw: &mut RawRequest, field_limit: u64) -> Result<(), DispatchError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, field_limit))? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let data = read_field(field, field_limit).await?;

        // An empty file input is sent as `filename=""` with no content.
        if file_name.as_deref() == Some("") && data.is_empty() {
            tracing::debug!(field = %name, "multipart: empty file input skipped");
            continue;
        }

        if file_name.is_some() {
            tracing::debug!(field = %name, bytes = data.len(), "multipart: file received");
            raw.files.push((name, data));
        } else {
            let text = String::from_utf8(data.to_vec())
                .map_err(|_| DispatchError::MalformedBody(format!("field {name} is not valid UTF-8")))?;
            raw.params.push((name, text));
        }
    }
    Ok(())
}

/// Stream a field into memory, failing as soon as it passes `limit`.
async fn read_field(mut field: Field<'_>, limit: u64) -> Result<Bytes, DispatchError> {
    let mut session = DownloadSession::new(limit);
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
        session.push(&chunk)?;
    }
    Ok(session.finish())
}

fn multipart_error(e: MultipartError, limit: u64) -> DispatchError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DispatchError::PayloadTooLarge { limit }
    } else {
        DispatchError::MalformedBody(e.body_text())
    }
}
