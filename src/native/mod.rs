// ---------------------------------------------------------------------------
// native/ — Built-in capability provider shipped with the server
// ---------------------------------------------------------------------------

pub mod dominant_colors;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::provider::{ArgumentMap, CapabilityProvider, Descriptor, ProviderError};

pub const BUILD_INFORMATION: &str = "buildInformation";

const CAPABILITIES: &[&str] = &[dominant_colors::NAME, BUILD_INFORMATION];

/// In-process provider backed by the `image` crate.
#[derive(Debug, Default)]
pub struct NativeProvider;

impl NativeProvider {
    pub fn new() -> Self {
        Self
    }
}

fn build_information_descriptor() -> Result<Descriptor, ProviderError> {
    Descriptor::new(
        BUILD_INFORMATION,
        Some("Reports the server build and its built-in algorithms"),
        vec![],
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "version": { "type": "string" },
                "algorithms": { "type": "array" }
            }
        }),
    )
}

#[async_trait]
impl CapabilityProvider for NativeProvider {
    fn list_capabilities(&self) -> Result<Vec<String>, ProviderError> {
        Ok(CAPABILITIES.iter().map(|s| s.to_string()).collect())
    }

    fn describe(&self, name: &str) -> Result<Descriptor, ProviderError> {
        match name {
            dominant_colors::NAME => dominant_colors::descriptor(),
            BUILD_INFORMATION => build_information_descriptor(),
            other => Err(ProviderError::UnknownCapability(other.to_string())),
        }
    }

    async fn invoke(&self, name: &str, args: ArgumentMap) -> Result<Value, ProviderError> {
        match name {
            dominant_colors::NAME => {
                let descriptor = dominant_colors::descriptor()?;
                let count = match (args.parse::<f64>("count")?, descriptor.input("count")) {
                    (Some(v), Some(spec)) => spec.check_range(v)?,
                    (None, Some(spec)) => spec.range.map_or(4.0, |r| r.default),
                    (v, None) => v.unwrap_or(4.0),
                };
                if count.fract() != 0.0 {
                    return Err(ProviderError::InvalidArgument {
                        name: "count".to_string(),
                        reason: "value must be an integer".to_string(),
                    });
                }
                let data = args.bytes("image")?.clone();

                tokio::task::spawn_blocking(move || dominant_colors::analyze(&data, count as usize))
                    .await
                    .map_err(|e| ProviderError::Failed(format!("analysis task failed: {e}")))?
            }
            BUILD_INFORMATION => Ok(json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "algorithms": CAPABILITIES,
                "imageFormats": ["png", "jpeg"],
            })),
            other => Err(ProviderError::UnknownCapability(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    use crate::provider::ArgValue;

    fn image_args(count: Option<&str>) -> ArgumentMap {
        let mut args = ArgumentMap::new();
        args.insert(
            "image",
            ArgValue::Bytes(Bytes::from(dominant_colors::tests::red_blue_png())),
        );
        if let Some(c) = count {
            args.insert("count", ArgValue::Scalar(c.to_string()));
        }
        args
    }

    #[test]
    fn every_listed_capability_describes() {
        let provider = NativeProvider::new();
        for name in provider.list_capabilities().unwrap() {
            assert_eq!(provider.describe(&name).unwrap().name, name);
        }
        assert!(provider.describe("houghLines").is_err());
    }

    #[tokio::test]
    async fn dominant_colors_uses_default_count() {
        let result = NativeProvider::new()
            .invoke(dominant_colors::NAME, image_args(None))
            .await
            .unwrap();
        assert_eq!(result["dominantColors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn dominant_colors_rejects_out_of_range_count() {
        let err = NativeProvider::new()
            .invoke(dominant_colors::NAME, image_args(Some("17")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("greater than 16"));
    }

    #[tokio::test]
    async fn dominant_colors_rejects_non_numeric_counts() {
        for count in ["NaN", "inf", "-inf", "2.5"] {
            let err = NativeProvider::new()
                .invoke(dominant_colors::NAME, image_args(Some(count)))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ProviderError::InvalidArgument { ref name, .. } if name == "count"),
                "count={count} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn dominant_colors_accepts_integral_float_count() {
        let result = NativeProvider::new()
            .invoke(dominant_colors::NAME, image_args(Some("1.0")))
            .await
            .unwrap();
        assert_eq!(result["dominantColors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dominant_colors_requires_bytes() {
        let err = NativeProvider::new()
            .invoke(dominant_colors::NAME, ArgumentMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingArgument(ref n) if n == "image"));
    }

    #[tokio::test]
    async fn build_information_reports_version() {
        let result = NativeProvider::new()
            .invoke(BUILD_INFORMATION, ArgumentMap::new())
            .await
            .unwrap();
        assert_eq!(result["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(result["algorithms"], json!(["dominantColors", "buildInformation"]));
    }
}
