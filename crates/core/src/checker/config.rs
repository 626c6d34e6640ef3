//! Stream checker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::selector::UpgradePolicy;

/// Configuration for the cached-stream checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Enable/disable the periodic check loop.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minutes between check ticks.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Due records pulled per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Apply upgrades automatically. When off, upgrades are only flagged.
    #[serde(default = "default_true")]
    pub auto_upgrade: bool,

    /// Minimum score gain before an upgrade is applied.
    #[serde(default = "default_min_upgrade_points")]
    pub min_upgrade_points: i32,

    /// Score gain above which a non-applied upgrade is still flagged.
    #[serde(default = "default_advisory_upgrade_points")]
    pub advisory_upgrade_points: i32,

    /// Largest size growth (GB) an automatic upgrade may bring.
    #[serde(default = "default_max_upgrade_size_gb")]
    pub max_upgrade_size_gb: f64,

    /// Days until a still-cached stream is checked again.
    #[serde(default = "default_recheck_after_days")]
    pub recheck_after_days: i64,

    /// Days until an unavailable stream is retried.
    #[serde(default = "default_unavailable_retry_days")]
    pub unavailable_retry_days: i64,

    /// Run a tick immediately at startup instead of waiting one interval.
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

fn default_true() -> bool {
    true
}

fn default_interval_minutes() -> u64 {
    60
}

fn default_batch_size() -> u32 {
    100
}

fn default_min_upgrade_points() -> i32 {
    20
}

fn default_advisory_upgrade_points() -> i32 {
    10
}

fn default_max_upgrade_size_gb() -> f64 {
    30.0
}

fn default_recheck_after_days() -> i64 {
    7
}

fn default_unavailable_retry_days() -> i64 {
    1
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: default_interval_minutes(),
            batch_size: default_batch_size(),
            auto_upgrade: true,
            min_upgrade_points: default_min_upgrade_points(),
            advisory_upgrade_points: default_advisory_upgrade_points(),
            max_upgrade_size_gb: default_max_upgrade_size_gb(),
            recheck_after_days: default_recheck_after_days(),
            unavailable_retry_days: default_unavailable_retry_days(),
            run_on_start: true,
        }
    }
}

impl CheckerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub fn recheck_after(&self) -> chrono::Duration {
        chrono::Duration::days(self.recheck_after_days)
    }

    pub fn unavailable_retry(&self) -> chrono::Duration {
        chrono::Duration::days(self.unavailable_retry_days)
    }

    pub fn upgrade_policy(&self) -> UpgradePolicy {
        UpgradePolicy {
            min_upgrade_points: self.min_upgrade_points,
            advisory_upgrade_points: self.advisory_upgrade_points,
            max_upgrade_size_gb: self.max_upgrade_size_gb,
        }
    }
}
