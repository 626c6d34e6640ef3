//! Job status types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the cached-stream checker job.
pub const CHECKER_JOB: &str = "stream_checker";
/// Name of the library backfill job.
pub const BACKFILL_JOB: &str = "library_backfill";

/// Observable state of one background job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub running: bool,
    /// Human-readable interval, e.g. `1 hour`.
    pub interval: String,
    pub interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub run_count: u64,
    /// 0-100.
    pub progress: u8,
    pub progress_message: String,
    pub items_processed: u64,
    pub items_total: u64,
}

/// Format an interval the way operators read it.
pub fn format_interval(interval: Duration) -> String {
    fn plural(n: u64, unit: &str) -> String {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    }

    let secs = interval.as_secs();
    if secs >= 86_400 && secs % 86_400 == 0 {
        plural(secs / 86_400, "day")
    } else if secs >= 3_600 && secs % 3_600 == 0 {
        plural(secs / 3_600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        plural(secs / 60, "minute")
    } else {
        plural(secs, "second")
    }
}
