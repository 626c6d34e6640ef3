use std::sync::Arc;

use debridarr_core::{Config, JobRegistry, SanitizedConfig, StreamCacheStore, StreamChecker};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn StreamCacheStore>,
    registry: Arc<JobRegistry>,
    checker: Arc<StreamChecker>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn StreamCacheStore>,
        registry: Arc<JobRegistry>,
        checker: Arc<StreamChecker>,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            checker,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn StreamCacheStore {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn checker(&self) -> &StreamChecker {
        &self.checker
    }
}
