//! Library backfill configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the library backfill scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Enable/disable the periodic backfill loop.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hours between full passes.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Delay before the first pass after startup (seconds).
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Catalog items fetched per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause between pages (milliseconds).
    #[serde(default = "default_page_pause_ms")]
    pub page_pause_ms: u64,

    /// Report progress every N items.
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,

    /// Pause after a failed item (milliseconds).
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,

    /// Pause after a rate-limited item (milliseconds).
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    /// Also scan series (one sample episode each).
    #[serde(default = "default_true")]
    pub scan_series: bool,
}

fn default_true() -> bool {
    true
}

fn default_interval_hours() -> u64 {
    24
}

fn default_initial_delay_secs() -> u64 {
    300 // 5 minutes
}

fn default_page_size() -> u32 {
    5000
}

fn default_page_pause_ms() -> u64 {
    2000
}

fn default_progress_every() -> u64 {
    100
}

fn default_error_backoff_ms() -> u64 {
    5000
}

fn default_rate_limit_backoff_ms() -> u64 {
    30_000
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: default_interval_hours(),
            initial_delay_secs: default_initial_delay_secs(),
            page_size: default_page_size(),
            page_pause_ms: default_page_pause_ms(),
            progress_every: default_progress_every(),
            error_backoff_ms: default_error_backoff_ms(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            scan_series: true,
        }
    }
}

impl ScannerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 3600)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }

    /// Pause after a failed item; rate limits wait longer.
    pub fn backoff(&self, rate_limited: bool) -> Duration {
        if rate_limited {
            Duration::from_millis(self.rate_limit_backoff_ms)
        } else {
            Duration::from_millis(self.error_backoff_ms)
        }
    }
}
