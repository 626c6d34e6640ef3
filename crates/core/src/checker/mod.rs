//! Cached-stream health check and upgrade job.

mod config;
mod runner;
mod types;

pub use config::CheckerConfig;
pub use runner::StreamChecker;
pub use types::{CheckOutcome, CheckReport, CheckerStats};
