// Application state shared by every handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::fetch::BoundedFetcher;
use crate::provider::CapabilityProvider;
use crate::registry::Registry;

/// Cloned into every handler. The registry is immutable after startup, so no
/// locks are needed anywhere on the request path.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<Config>,
    pub start_time: Instant,
    /// `true` once the listener is bound and the server accepts traffic.
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    /// Enumerate the provider and wire up the dispatcher. A provider that
    /// cannot be enumerated is fatal.
    pub fn new(config: Config, provider: Arc<dyn CapabilityProvider>) -> anyhow::Result<Self> {
        let registry = Arc::new(Registry::build(provider).context("capability registry")?);
        let fetcher = BoundedFetcher::new(&config).context("HTTP client")?;
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), fetcher, &config));

        tracing::info!(
            capabilities = registry.len(),
            max_payload_bytes = config.max_payload_bytes,
            "registry built"
        );

        Ok(Self {
            registry,
            dispatcher,
            config: Arc::new(config),
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
        tracing::info!("Backend marked as READY");
    }
}
