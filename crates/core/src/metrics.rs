//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Stream checker (per-record outcomes)
//! - Library backfill (per-item outcomes)
//! - Debrid availability batches
//! - Job run durations

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Checker
// =============================================================================

/// Record checks by outcome.
pub static CHECKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("debridarr_checks_total", "Cached stream checks by outcome"),
        // "still_cached", "expired", "replaced", "unavailable", "upgraded",
        // "upgrade_flagged", "guard_rejected", "error"
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Backfill
// =============================================================================

/// Backfill items by kind and outcome.
pub static BACKFILL_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "debridarr_backfill_items_total",
            "Library items visited by the backfill scanner",
        ),
        &["kind", "outcome"], // "cached", "upgraded", "unchanged", "skipped", "error"
    )
    .unwrap()
});

// =============================================================================
// External services
// =============================================================================

/// Debrid availability batch calls by result.
pub static DEBRID_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "debridarr_debrid_batches_total",
            "Debrid instant-availability batch calls",
        ),
        &["result"], // "ok", "error", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Jobs
// =============================================================================

/// Job run duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("debridarr_job_duration_seconds", "Duration of job runs").buckets(
            vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0, 14400.0],
        ),
        &["job", "result"], // result: "success", "failed", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CHECKS_TOTAL.clone()),
        Box::new(BACKFILL_ITEMS.clone()),
        Box::new(DEBRID_BATCHES.clone()),
        Box::new(JOB_DURATION.clone()),
    ]
}
