// ---------------------------------------------------------------------------
// fetch.rs — Bounded stream fetcher for remote payloads
// ---------------------------------------------------------------------------

use axum::body::Bytes;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Maximum payload size exceeded ({limit} bytes)")]
    TooLarge { limit: u64 },

    #[error("Remote server responded with {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Accounting for one fetch. Lives only for the duration of a `fetch` call.
#[derive(Debug)]
pub struct DownloadSession {
    bytes_received: u64,
    limit: u64,
    aborted: bool,
    buffer: Vec<u8>,
}

impl DownloadSession {
    pub fn new(limit: u64) -> Self {
        Self {
            bytes_received: 0,
            limit,
            aborted: false,
            buffer: Vec::new(),
        }
    }

    /// Append a chunk. Returns `TooLarge` the moment the running total passes
    /// the limit; once aborted, nothing further is accepted.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), FetchError> {
        if self.aborted {
            return Err(FetchError::TooLarge { limit: self.limit });
        }
        self.bytes_received += chunk.len() as u64;
        if self.bytes_received > self.limit {
            self.aborted = true;
            self.buffer = Vec::new();
            return Err(FetchError::TooLarge { limit: self.limit });
        }
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn finish(self) -> Bytes {
        Bytes::from(self.buffer)
    }
}

/// Single-attempt HTTP GET that never materializes more than `limit` bytes.
#[derive(Debug, Clone)]
pub struct BoundedFetcher {
    client: Client,
}

impl BoundedFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .user_agent(concat!("cloudcv-backend/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &Url, limit: u64) -> Result<Bytes, FetchError> {
        tracing::info!(url = %url, limit, "fetch: downloading remote payload");

        let resp = self.client.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        if let Some(declared) = resp.content_length() {
            if declared > limit {
                tracing::warn!(url = %url, declared, limit, "fetch: declared size exceeds limit");
                return Err(FetchError::TooLarge { limit });
            }
        }

        let mut session = DownloadSession::new(limit);
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Err(e) = session.push(&chunk) {
                // Dropping the stream tears the connection down instead of
                // returning it to the pool half-read.
                drop(stream);
                tracing::warn!(
                    url = %url,
                    received = session.bytes_received(),
                    limit,
                    "fetch: maximum payload size exceeded, download aborted"
                );
                return Err(e);
            }
        }

        tracing::debug!(url = %url, bytes = session.bytes_received(), "fetch: complete");
        Ok(session.finish())
    }
}
