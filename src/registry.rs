// ---------------------------------------------------------------------------
// registry.rs — Capability registry, built once at startup
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::provider::{ArgumentMap, CapabilityProvider, Descriptor, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("capability provider failed to list capabilities: {0}")]
    List(#[source] ProviderError),

    #[error("capability provider exposes no capabilities")]
    Empty,
}

/// A registered capability: its descriptor plus the handle used to invoke it.
#[derive(Clone)]
pub struct Capability {
    descriptor: Descriptor,
    provider: Arc<dyn CapabilityProvider>,
}

impl Capability {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub async fn invoke(&self, args: ArgumentMap) -> Result<Value, ProviderError> {
        self.provider.invoke(&self.descriptor.name, args).await
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.descriptor.name)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of capabilities. Never mutated after `build`, so it is
/// shared across request tasks behind an `Arc` with no locking.
#[derive(Debug)]
pub struct Registry {
    capabilities: Vec<Capability>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Discover capabilities from `provider`. Listing failures are fatal,
    /// per-capability `describe` failures are logged and skipped.
    pub fn build(provider: Arc<dyn CapabilityProvider>) -> Result<Self, RegistryError> {
        let names = provider.list_capabilities().map_err(RegistryError::List)?;
        if names.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut capabilities = Vec::with_capacity(names.len());
        let mut index = HashMap::with_capacity(names.len());

        for name in names {
            if index.contains_key(&name) {
                tracing::warn!(capability = %name, "registry: duplicate capability name, skipping");
                continue;
            }
            let descriptor = match provider.describe(&name) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(capability = %name, "registry: describe failed, skipping: {}", e);
                    continue;
                }
            };
            if descriptor.name != name {
                tracing::warn!(
                    capability = %name,
                    "registry: descriptor reports name '{}', skipping",
                    descriptor.name
                );
                continue;
            }
            tracing::info!(
                capability = %name,
                inputs = descriptor.inputs.len(),
                "registry: capability registered"
            );
            index.insert(name, capabilities.len());
            capabilities.push(Capability {
                descriptor,
                provider: Arc::clone(&provider),
            });
        }

        if capabilities.is_empty() {
            return Err(RegistryError::Empty);
        }

        Ok(Self {
            capabilities,
            index,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&Capability> {
        self.index.get(name).map(|&i| &self.capabilities[i])
    }

    /// Capabilities in provider order.
    pub fn list(&self) -> impl Iterator<Item = &Descriptor> {
        self.capabilities.iter().map(Capability::descriptor)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
