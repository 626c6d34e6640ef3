//! Prometheus metrics for observability.
//!
//! HTTP request metrics are recorded by middleware. Cache and job gauges
//! are collected from the store and the job registry on every scrape.
//! The job counters themselves live in the core crate and are registered
//! here.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

static UUID_SEGMENT: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap()
});
static HASH_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"[0-9a-fA-F]{40}").unwrap());
static NUMERIC_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "debridarr_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("debridarr_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "debridarr_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Cache and job gauges (collected dynamically)
// =============================================================================

/// Cached stream records by state.
pub static CACHED_STREAMS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("debridarr_cached_streams", "Cached stream records by state"),
        // "available", "unavailable", "upgrade_flagged", "due"
        &["state"],
    )
    .unwrap()
});

/// Average quality score of available streams.
pub static AVERAGE_SCORE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "debridarr_cached_streams_average_score",
        "Average quality score of available cached streams",
    )
    .unwrap()
});

/// Whether a job is running (1) or idle (0).
pub static JOB_RUNNING: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("debridarr_job_running", "Whether a background job is running"),
        &["job"],
    )
    .unwrap()
});

/// Completed runs per job.
pub static JOB_RUNS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("debridarr_job_runs", "Completed runs per background job"),
        &["job"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Cache and jobs
    registry
        .register(Box::new(CACHED_STREAMS.clone()))
        .unwrap();
    registry.register(Box::new(AVERAGE_SCORE.clone())).unwrap();
    registry.register(Box::new(JOB_RUNNING.clone())).unwrap();
    registry.register(Box::new(JOB_RUNS.clone())).unwrap();

    // Core metrics (checks, backfill, debrid batches, job durations)
    for metric in debridarr_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &AppState) {
    if let Ok(stats) = state.store().stats() {
        CACHED_STREAMS
            .with_label_values(&["available"])
            .set(stats.available as i64);
        CACHED_STREAMS
            .with_label_values(&["unavailable"])
            .set(stats.unavailable as i64);
        CACHED_STREAMS
            .with_label_values(&["upgrade_flagged"])
            .set(stats.upgrades_available as i64);
        CACHED_STREAMS
            .with_label_values(&["due"])
            .set(stats.due_for_check as i64);
        AVERAGE_SCORE.set(stats.average_score.round() as i64);
    }

    for job in state.registry().all().await {
        JOB_RUNNING
            .with_label_values(&[&job.name])
            .set(if job.running { 1 } else { 0 });
        JOB_RUNS
            .with_label_values(&[&job.name])
            .set(job.run_count as i64);
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = HASH_SEGMENT.replace_all(&result, "{hash}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
