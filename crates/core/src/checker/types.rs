//! Checker report and outcome types.

use serde::{Deserialize, Serialize};

use super::CheckerConfig;
use crate::stream_cache::StreamCacheStats;

/// What a single record check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Still cached, nothing better found. Rescheduled.
    StillCached,
    /// Still cached and replaced by a better stream.
    Upgraded,
    /// Still cached; a better stream exists but was only flagged.
    UpgradeFlagged,
    /// Still cached; the best candidate broke a guard rule.
    GuardRejected,
    /// Expired and replaced by another cached stream.
    Replaced,
    /// Expired with no cached replacement.
    Unavailable,
}

impl CheckOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOutcome::StillCached => "still_cached",
            CheckOutcome::Upgraded => "upgraded",
            CheckOutcome::UpgradeFlagged => "upgrade_flagged",
            CheckOutcome::GuardRejected => "guard_rejected",
            CheckOutcome::Replaced => "replaced",
            CheckOutcome::Unavailable => "unavailable",
        }
    }
}

/// Summary of one check tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub checked: u32,
    pub still_cached: u32,
    pub expired: u32,
    pub replaced: u32,
    pub unavailable: u32,
    pub upgraded: u32,
    pub upgrade_flagged: u32,
    pub guard_rejected: u32,
    pub errors: u32,
    /// The tick found a previous one still running and did nothing.
    pub skipped_in_flight: bool,
}

impl CheckReport {
    pub(crate) fn skipped() -> Self {
        Self {
            skipped_in_flight: true,
            ..Default::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::StillCached => {}
            CheckOutcome::Upgraded => self.upgraded += 1,
            CheckOutcome::UpgradeFlagged => self.upgrade_flagged += 1,
            CheckOutcome::GuardRejected => self.guard_rejected += 1,
            CheckOutcome::Replaced => self.replaced += 1,
            CheckOutcome::Unavailable => self.unavailable += 1,
        }
    }
}

/// Store statistics plus the checker's policy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerStats {
    #[serde(flatten)]
    pub cache: StreamCacheStats,
    pub checker_config: CheckerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_outcomes() {
        let mut report = CheckReport::default();
        report.record(CheckOutcome::StillCached);
        report.record(CheckOutcome::Upgraded);
        report.record(CheckOutcome::Unavailable);
        report.record(CheckOutcome::Unavailable);

        assert_eq!(report.upgraded, 1);
        assert_eq!(report.unavailable, 2);
        assert_eq!(report.replaced, 0);
        assert!(!report.skipped_in_flight);
        assert!(CheckReport::skipped().skipped_in_flight);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&CheckOutcome::GuardRejected).unwrap();
        assert_eq!(json, "\"guard_rejected\"");
        assert_eq!(CheckOutcome::GuardRejected.as_str(), "guard_rejected");
    }
}
