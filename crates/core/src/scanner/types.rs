//! Backfill report types.

use serde::{Deserialize, Serialize};

use crate::catalog::ContentKind;

/// What the scanner did with one library item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// First stream written for the item (or it was unavailable before).
    Cached,
    /// Replaced an available stream with a strictly better one.
    Upgraded,
    /// Nothing better than the current state.
    Unchanged,
    /// No usable external id.
    Skipped,
}

impl ItemOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemOutcome::Cached => "cached",
            ItemOutcome::Upgraded => "upgraded",
            ItemOutcome::Unchanged => "unchanged",
            ItemOutcome::Skipped => "skipped",
        }
    }
}

/// Counters for one kind of library item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCounts {
    pub processed: u64,
    pub cached: u64,
    pub upgraded: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl ScanCounts {
    pub(crate) fn record(&mut self, outcome: ItemOutcome) {
        self.processed += 1;
        match outcome {
            ItemOutcome::Cached => self.cached += 1,
            ItemOutcome::Upgraded => self.upgraded += 1,
            ItemOutcome::Unchanged => self.unchanged += 1,
            ItemOutcome::Skipped => self.skipped += 1,
        }
    }

    pub(crate) fn record_error(&mut self) {
        self.processed += 1;
        self.errors += 1;
    }
}

/// Summary of one backfill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    pub movies: ScanCounts,
    pub series: ScanCounts,
    /// The pass found a previous one still running and did nothing.
    pub skipped_in_flight: bool,
}

impl BackfillReport {
    pub(crate) fn counts_mut(&mut self, kind: ContentKind) -> &mut ScanCounts {
        match kind {
            ContentKind::Movie => &mut self.movies,
            ContentKind::Series => &mut self.series,
        }
    }

    pub fn processed(&self) -> u64 {
        self.movies.processed + self.series.processed
    }

    pub fn errors(&self) -> u64 {
        self.movies.errors + self.series.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut report = BackfillReport::default();
        report.counts_mut(ContentKind::Movie).record(ItemOutcome::Cached);
        report.counts_mut(ContentKind::Movie).record(ItemOutcome::Skipped);
        report.counts_mut(ContentKind::Series).record_error();

        assert_eq!(report.movies.processed, 2);
        assert_eq!(report.movies.cached, 1);
        assert_eq!(report.movies.skipped, 1);
        assert_eq!(report.series.errors, 1);
        assert_eq!(report.processed(), 3);
        assert_eq!(report.errors(), 1);
    }
}
