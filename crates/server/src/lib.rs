//! Debridarr worker: HTTP collaborators, status API and metrics.

pub mod api;
pub mod clients;
pub mod metrics;
pub mod state;
