// ---------------------------------------------------------------------------
// provider.rs — Capability provider interface, descriptors, argument maps
// ---------------------------------------------------------------------------
//
// The gateway never looks inside a provider. It only lists capability names,
// asks for their descriptors once at startup, and forwards assembled argument
// maps to `invoke`.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use async_trait::async_trait;
use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Missing argument {0}")]
    MissingArgument(String),

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Invalid descriptor for {name}: {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

// ── Descriptor ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Raw bytes, either uploaded or fetched from a URL.
    File,
    Scalar,
    Structured,
}

/// Inclusive numeric range with a default, for ranged scalar arguments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub default: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<ParamRange>,
}

impl ParamSpec {
    pub fn file(name: &str) -> Self {
        Self::new(name, ParamKind::File, true)
    }

    pub fn scalar(name: &str, required: bool) -> Self {
        Self::new(name, ParamKind::Scalar, required)
    }

    pub fn structured(name: &str, required: bool) -> Self {
        Self::new(name, ParamKind::Structured, required)
    }

    /// Optional scalar constrained to `[min, max]`, defaulting to `default`.
    pub fn ranged(name: &str, min: f64, default: f64, max: f64) -> Self {
        let mut spec = Self::new(name, ParamKind::Scalar, false);
        spec.range = Some(ParamRange { min, default, max });
        spec
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    fn new(name: &str, kind: ParamKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required,
            description: None,
            range: None,
        }
    }

    /// Check a value against the declared range, if any.
    pub fn check_range(&self, value: f64) -> Result<f64, ProviderError> {
        if !value.is_finite() {
            return Err(ProviderError::InvalidArgument {
                name: self.name.clone(),
                reason: "value must be a finite number".to_string(),
            });
        }
        let Some(range) = self.range else {
            return Ok(value);
        };
        if value < range.min {
            return Err(ProviderError::InvalidArgument {
                name: self.name.clone(),
                reason: format!("value cannot be less than {}", range.min),
            });
        }
        if value > range.max {
            return Err(ProviderError::InvalidArgument {
                name: self.name.clone(),
                reason: format!("value cannot be greater than {}", range.max),
            });
        }
        Ok(value)
    }
}

/// Static metadata for one capability. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub inputs: Vec<ParamSpec>,
    /// Opaque to the gateway. Rendered into the API document when it parses
    /// as a JSON schema.
    pub output_schema: Value,
}

impl Descriptor {
    /// Validates parameter names and ranges before handing out a descriptor.
    pub fn new(
        name: &str,
        summary: Option<&str>,
        inputs: Vec<ParamSpec>,
        output_schema: Value,
    ) -> Result<Self, ProviderError> {
        let mut seen = HashSet::new();
        for input in &inputs {
            if !seen.insert(input.name.as_str()) {
                return Err(ProviderError::InvalidDescriptor {
                    name: name.to_string(),
                    reason: format!("duplicate argument name {}", input.name),
                });
            }
            if let Some(r) = input.range {
                if r.min > r.default || r.max < r.default {
                    return Err(ProviderError::InvalidDescriptor {
                        name: name.to_string(),
                        reason: format!("default of {} is outside its range", input.name),
                    });
                }
            }
        }
        Ok(Self {
            name: name.to_string(),
            summary: summary.map(str::to_string),
            inputs,
            output_schema,
        })
    }

    /// First file-kind parameter; arrives either as an upload or as a URL.
    pub fn primary_input(&self) -> Option<&ParamSpec> {
        self.inputs.iter().find(|p| p.kind == ParamKind::File)
    }

    pub fn input(&self, name: &str) -> Option<&ParamSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }
}

// ── ArgumentMap ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bytes(Bytes),
    Scalar(String),
    Structured(Value),
}

/// Per-request input to a capability invocation. Built fresh for every
/// request and dropped once the response is produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentMap {
    values: BTreeMap<String, ArgValue>,
}

impl ArgumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Returns the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) -> Option<ArgValue> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn bytes(&self, name: &str) -> Result<&Bytes, ProviderError> {
        match self.values.get(name) {
            Some(ArgValue::Bytes(b)) => Ok(b),
            Some(_) => Err(ProviderError::InvalidArgument {
                name: name.to_string(),
                reason: "expected binary data".to_string(),
            }),
            None => Err(ProviderError::MissingArgument(name.to_string())),
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Parse a scalar argument, `Ok(None)` when absent.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>, ProviderError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.values.get(name) {
            None => Ok(None),
            Some(ArgValue::Scalar(s)) => s.trim().parse::<T>().map(Some).map_err(|e| {
                ProviderError::InvalidArgument {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            }),
            Some(_) => Err(ProviderError::InvalidArgument {
                name: name.to_string(),
                reason: "expected a scalar value".to_string(),
            }),
        }
    }
}

// ── Provider interface ──────────────────────────────────────────────────────

/// An opaque source of capabilities. `invoke` may take arbitrary wall-clock
/// time and must yield exactly one of result or error.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn list_capabilities(&self) -> Result<Vec<String>, ProviderError>;

    fn describe(&self, name: &str) -> Result<Descriptor, ProviderError>;

    async fn invoke(&self, name: &str, args: ArgumentMap) -> Result<Value, ProviderError>;
}
