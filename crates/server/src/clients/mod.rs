//! HTTP implementations of the core provider and debrid traits.

mod realdebrid;
mod stremio;

use std::sync::Arc;

use debridarr_core::config::{DebridBackend, DebridConfig};
use debridarr_core::{DebridError, DebridService};

pub use realdebrid::RealDebridClient;
pub use stremio::StremioProvider;

/// Build the debrid client for the configured backend.
pub fn create_debrid_service(config: &DebridConfig) -> Result<Arc<dyn DebridService>, DebridError> {
    match config.backend {
        DebridBackend::RealDebrid => Ok(Arc::new(RealDebridClient::new(config.clone())?)),
    }
}
