use eventhive_catalog::{CatalogStore, InMemoryCatalog};
use eventhive_core::{AdmissionEngine, IdentityProvider, InMemoryIdentityProvider, InMemoryJournal};
use std::sync::Arc;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AdmissionEngine>,
    pub catalog: Arc<dyn CatalogStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub metrics: Arc<Metrics>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Everything held in process memory; nothing survives a restart.
    pub fn in_memory(auth: AuthConfig) -> Result<Self, prometheus::Error> {
        let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalog::new());
        let engine = AdmissionEngine::new(catalog.clone(), Arc::new(InMemoryJournal::new()));
        Ok(Self {
            engine: Arc::new(engine),
            catalog,
            identity: Arc::new(InMemoryIdentityProvider::new()),
            metrics: Arc::new(Metrics::new()?),
            auth,
        })
    }
}
