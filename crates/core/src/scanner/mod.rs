//! Library backfill job.

mod config;
mod runner;
mod types;

pub use config::ScannerConfig;
pub use runner::LibraryScanner;
pub use types::{BackfillReport, ItemOutcome, ScanCounts};
