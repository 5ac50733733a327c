// ---------------------------------------------------------------------------
// dispatch.rs — Request marshalling and capability dispatch
// ---------------------------------------------------------------------------
//
// Per request: resolve the capability, assemble an ArgumentMap from scalar
// params, JSON body entries and uploaded files, resolve a URL primary input
// through the bounded fetcher, then invoke the provider exactly once.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::fetch::{BoundedFetcher, FetchError};
use crate::provider::{ArgValue, ArgumentMap, ParamSpec, ProviderError};
use crate::registry::Registry;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Maximum payload size exceeded ({limit} bytes)")]
    PayloadTooLarge { limit: u64 },

    #[error("{0}")]
    Provider(ProviderError),

    #[error("Failed to download input: {0}")]
    Transport(String),
}

impl DispatchError {
    /// Errors caused by the caller; detected before the provider is called.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DispatchError::Provider(_) | DispatchError::Transport(_))
    }
}

impl From<FetchError> for DispatchError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::TooLarge { limit } => DispatchError::PayloadTooLarge { limit },
            other => DispatchError::Transport(other.to_string()),
        }
    }
}

/// Raw inbound inputs, before they are merged into an ArgumentMap.
#[derive(Debug, Default)]
pub struct RawRequest {
    /// Path/query params first, then text form fields; later entries win.
    pub params: Vec<(String, String)>,
    /// Entries of a JSON object body.
    pub body: Vec<(String, Value)>,
    /// Uploaded file fields.
    pub files: Vec<(String, Bytes)>,
}

impl RawRequest {
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn file(mut self, name: &str, data: impl Into<Bytes>) -> Self {
        self.files.push((name.to_string(), data.into()));
        self
    }

    pub fn json(mut self, name: &str, value: Value) -> Self {
        self.body.push((name.to_string(), value));
        self
    }
}

/// Merge raw inputs. Files overwrite same-named scalars since a file-or-URL
/// parameter may arrive in either form.
pub fn assemble(raw: RawRequest) -> ArgumentMap {
    let mut args = ArgumentMap::new();
    for (name, value) in raw.params {
        args.insert(name, ArgValue::Scalar(value));
    }
    for (name, value) in raw.body {
        let value = match value {
            Value::Null => continue,
            Value::String(s) => ArgValue::Scalar(s),
            Value::Bool(b) => ArgValue::Scalar(b.to_string()),
            Value::Number(n) => ArgValue::Scalar(n.to_string()),
            structured @ (Value::Array(_) | Value::Object(_)) => ArgValue::Structured(structured),
        };
        args.insert(name, value);
    }
    for (name, data) in raw.files {
        args.insert(name, ArgValue::Bytes(data));
    }
    args
}

/// Accepts only absolute http(s) URLs.
pub fn parse_absolute_url(raw: &str) -> Result<Url, DispatchError> {
    let invalid = |reason: String| DispatchError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    fetcher: BoundedFetcher,
    max_payload_bytes: u64,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, fetcher: BoundedFetcher, config: &Config) -> Self {
        Self {
            registry,
            fetcher,
            max_payload_bytes: config.max_payload_bytes,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn max_payload_bytes(&self) -> u64 {
        self.max_payload_bytes
    }

    pub async fn dispatch(&self, name: &str, raw: RawRequest) -> Result<Value, DispatchError> {
        let started = Instant::now();
        let outcome = self.run(name, raw).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => tracing::info!(capability = %name, outcome = "ok", elapsed_ms, "dispatch complete"),
            Err(e) if e.is_client_error() => {
                tracing::warn!(capability = %name, outcome = "rejected", elapsed_ms, "dispatch rejected: {}", e)
            }
            Err(e) => {
                tracing::error!(capability = %name, outcome = "failed", elapsed_ms, "dispatch failed: {}", e)
            }
        }
        outcome
    }

    async fn run(&self, name: &str, raw: RawRequest) -> Result<Value, DispatchError> {
        let capability = self
            .registry
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownCapability(name.to_string()))?;

        let mut args = assemble(raw);
        if let Some(primary) = capability.descriptor().primary_input() {
            self.resolve_primary(primary, &mut args).await?;
        }

        capability.invoke(args).await.map_err(DispatchError::Provider)
    }

    /// Ensure the primary input is present and, when given as a URL, replace
    /// it with the downloaded bytes.
    async fn resolve_primary(&self, primary: &ParamSpec, args: &mut ArgumentMap) -> Result<(), DispatchError> {
        let missing = || DispatchError::MissingParameter(primary.name.clone());

        let url = match args.get(&primary.name) {
            Some(ArgValue::Bytes(data)) if data.is_empty() => return Err(missing()),
            Some(ArgValue::Bytes(_)) => return Ok(()),
            Some(ArgValue::Scalar(s)) if s.trim().is_empty() => return Err(missing()),
            Some(ArgValue::Scalar(s)) => parse_absolute_url(s.trim())?,
            Some(ArgValue::Structured(_)) => {
                return Err(DispatchError::InvalidUrl {
                    url: String::new(),
                    reason: format!("{} must be a file upload or a URL", primary.name),
                });
            }
            None if primary.required => return Err(missing()),
            None => return Ok(()),
        };

        let data = self.fetcher.fetch(&url, self.max_payload_bytes).await?;
        args.insert(primary.name.clone(), ArgValue::Bytes(data));
        Ok(())
    }
}
