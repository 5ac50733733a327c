// ---------------------------------------------------------------------------
// config.rs — Process-wide configuration, read once at startup
// ---------------------------------------------------------------------------

use std::time::Duration;

use anyhow::{bail, Context};

/// 1 MiB should be enough for an input image.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 1_048_576;

/// Headroom for multipart framing and text fields on top of the file limit.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Upper bound for fetched remote payloads and for each uploaded file.
    pub max_payload_bytes: u64,
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            fetch_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load from the environment (and `.env` if present).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.trim().parse::<u16>().with_context(|| format!("invalid PORT '{v}'"))?,
            None => defaults.port,
        };

        let max_payload_bytes = match lookup("MAX_PAYLOAD_BYTES") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid MAX_PAYLOAD_BYTES '{v}'"))?,
            None => defaults.max_payload_bytes,
        };
        if max_payload_bytes == 0 {
            bail!("MAX_PAYLOAD_BYTES must be greater than zero");
        }

        let fetch_timeout = secs(&lookup, "FETCH_TIMEOUT_SECS")?.unwrap_or(defaults.fetch_timeout);
        let connect_timeout =
            secs(&lookup, "FETCH_CONNECT_TIMEOUT_SECS")?.unwrap_or(defaults.connect_timeout);

        Ok(Self {
            port,
            max_payload_bytes,
            fetch_timeout,
            connect_timeout,
        })
    }

    /// Whole-request body limit for uploads.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_payload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX)
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<Duration>> {
    lookup(key)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("invalid {key} '{v}'"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_payload_bytes, 1_048_576);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = load(&[("PORT", "8088"), ("MAX_PAYLOAD_BYTES", "2048"), ("FETCH_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(cfg.port, 8088);
        assert_eq!(cfg.max_payload_bytes, 2048);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));
        assert_eq!(cfg.body_limit(), 2048 + 64 * 1024);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(load(&[("MAX_PAYLOAD_BYTES", "0")]).is_err());
        assert!(load(&[("MAX_PAYLOAD_BYTES", "lots")]).is_err());
        assert!(load(&[("PORT", "99999")]).is_err());
    }
}
