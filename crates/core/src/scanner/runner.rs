//! Library backfill scanner implementation.
//!
//! Walks the catalog page by page (movies, then series) and runs every item
//! with an external id through the candidate pipeline. An item that already
//! has an available stream is only replaced by a strictly better,
//! guard-compliant candidate, so a full rescan never downgrades anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::ScannerConfig;
use super::types::{BackfillReport, ItemOutcome};
use crate::catalog::{CatalogStore, ContentKind, ContentRef};
use crate::metrics::{BACKFILL_ITEMS, JOB_DURATION};
use crate::pipeline::{JobError, StreamPipeline};
use crate::provider::StreamRequest;
use crate::scheduler::{JobRegistry, RunGuard, BACKFILL_JOB};
use crate::stream_cache::{ContentKey, StreamCacheStore};

/// Only this episode of each series is scanned per pass.
const SAMPLE_SEASON: u32 = 1;
const SAMPLE_EPISODE: u32 = 1;

/// Populates and upgrades cached streams for the whole library.
pub struct LibraryScanner {
    config: ScannerConfig,
    store: Arc<dyn StreamCacheStore>,
    catalog: Arc<dyn CatalogStore>,
    pipeline: Arc<StreamPipeline>,
    registry: Arc<JobRegistry>,

    // Runtime state
    running: AtomicBool,
}

impl LibraryScanner {
    pub fn new(
        config: ScannerConfig,
        store: Arc<dyn StreamCacheStore>,
        catalog: Arc<dyn CatalogStore>,
        pipeline: Arc<StreamPipeline>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            catalog,
            pipeline,
            registry,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn register(&self) {
        self.registry
            .register(
                BACKFILL_JOB,
                "Backfills and upgrades cached streams for the whole library",
                self.config.interval(),
                self.config.enabled,
            )
            .await;
    }

    /// Spawn the periodic backfill loop. It stops when `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_loop(cancel).await })
    }

    async fn run_loop(&self, cancel: CancellationToken) {
        self.register().await;

        if !self.config.enabled {
            info!("Library scanner disabled");
            return;
        }

        info!(
            interval_hours = self.config.interval_hours,
            initial_delay_secs = self.config.initial_delay_secs,
            page_size = self.config.page_size,
            "Library scanner started"
        );

        let mut delay = self.config.initial_delay();
        loop {
            if !pause(&cancel, delay).await {
                break;
            }
            delay = self.config.interval();

            match self.run_once(&cancel).await {
                Ok(report) if report.skipped_in_flight => {}
                Ok(report) => info!(
                    movies_processed = report.movies.processed,
                    movies_cached = report.movies.cached,
                    movies_upgraded = report.movies.upgraded,
                    series_processed = report.series.processed,
                    series_cached = report.series.cached,
                    series_upgraded = report.series.upgraded,
                    errors = report.errors(),
                    "Library backfill completed"
                ),
                Err(JobError::Cancelled) => break,
                Err(e) => error!(error = %e, "Library backfill failed"),
            }
        }

        info!("Library scanner stopped");
    }

    /// Run one full pass over the catalog.
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<BackfillReport, JobError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("Previous library backfill still running, skipping pass");
            return Ok(BackfillReport {
                skipped_in_flight: true,
                ..Default::default()
            });
        };

        let started = Instant::now();
        self.registry.mark_running(BACKFILL_JOB).await;

        let result = self.scan_library(cancel).await;

        let label = match &result {
            Ok(_) => "ok",
            Err(JobError::Cancelled) => "cancelled",
            Err(_) => "error",
        };
        JOB_DURATION
            .with_label_values(&[BACKFILL_JOB, label])
            .observe(started.elapsed().as_secs_f64());
        self.registry
            .mark_complete(
                BACKFILL_JOB,
                result.as_ref().map(|_| ()).map_err(|e| e.to_string()),
                self.config.interval(),
            )
            .await;

        result
    }

    async fn scan_library(&self, cancel: &CancellationToken) -> Result<BackfillReport, JobError> {
        let mut kinds = vec![ContentKind::Movie];
        if self.config.scan_series {
            kinds.push(ContentKind::Series);
        }

        let mut total = 0;
        for kind in &kinds {
            total += self.catalog.count_content(*kind)?;
        }
        info!(total, "Starting library backfill");

        let mut report = BackfillReport::default();
        let mut processed = 0u64;
        for kind in kinds {
            self.scan_kind(kind, cancel, &mut report, &mut processed, total)
                .await?;
        }

        self.registry
            .update_progress(BACKFILL_JOB, processed, total, "Backfill complete")
            .await;
        Ok(report)
    }

    async fn scan_kind(
        &self,
        kind: ContentKind,
        cancel: &CancellationToken,
        report: &mut BackfillReport,
        processed: &mut u64,
        total: u64,
    ) -> Result<(), JobError> {
        let page_size = self.config.page_size.max(1);
        let progress_every = self.config.progress_every.max(1);
        let mut offset = 0u64;

        loop {
            let page = self.catalog.list_content(kind, offset, page_size)?;
            if page.is_empty() {
                break;
            }
            debug!(kind = kind.as_str(), offset, count = page.len(), "Scanning catalog page");

            for item in &page {
                if cancel.is_cancelled() {
                    return Err(JobError::Cancelled);
                }

                match self.scan_item(item).await {
                    Ok(outcome) => {
                        BACKFILL_ITEMS
                            .with_label_values(&[kind.as_str(), outcome.as_str()])
                            .inc();
                        report.counts_mut(kind).record(outcome);
                    }
                    Err(e) => {
                        BACKFILL_ITEMS.with_label_values(&[kind.as_str(), "error"]).inc();
                        report.counts_mut(kind).record_error();
                        let rate_limited = e.is_rate_limited();
                        warn!(
                            kind = kind.as_str(),
                            id = item.id,
                            title = %item.title,
                            rate_limited,
                            error = %e,
                            "Backfill item failed"
                        );
                        if !pause(cancel, self.config.backoff(rate_limited)).await {
                            return Err(JobError::Cancelled);
                        }
                    }
                }

                *processed += 1;
                if *processed % progress_every == 0 {
                    let counts = report.counts_mut(kind);
                    let message = format!(
                        "{}: {} cached, {} upgraded, {} skipped, {} errors",
                        kind.as_str(),
                        counts.cached,
                        counts.upgraded,
                        counts.skipped,
                        counts.errors
                    );
                    info!(processed = *processed, total, "{}", message);
                    self.registry
                        .update_progress(BACKFILL_JOB, *processed, total, &message)
                        .await;
                }
            }

            if (page.len() as u32) < page_size {
                break;
            }
            offset += page.len() as u64;

            if !pause(cancel, self.config.page_pause()).await {
                return Err(JobError::Cancelled);
            }
        }

        Ok(())
    }

    /// Run one library item through the pipeline.
    pub async fn scan_item(&self, item: &ContentRef) -> Result<ItemOutcome, JobError> {
        let Some(imdb_id) = item.usable_imdb_id() else {
            debug!(
                kind = item.kind.as_str(),
                id = item.id,
                title = %item.title,
                "No external id, skipping"
            );
            return Ok(ItemOutcome::Skipped);
        };

        let (key, request) = match item.kind {
            ContentKind::Movie => (ContentKey::movie(item.id), StreamRequest::movie(imdb_id)),
            ContentKind::Series => (
                ContentKey::episode(item.id, SAMPLE_SEASON, SAMPLE_EPISODE),
                StreamRequest::episode(imdb_id, SAMPLE_SEASON, SAMPLE_EPISODE),
            ),
        };

        let incumbent = self
            .store
            .get_cached_stream(&key)?
            .filter(|record| record.is_available);

        let cached = self.pipeline.cached_candidates(&request).await?;
        let Some(winner) = self
            .pipeline
            .selector()
            .select_best(cached, incumbent.as_ref())
        else {
            return Ok(ItemOutcome::Unchanged);
        };

        // Same torrent scored higher (seeders moved): keep the record as is.
        if let (Some(current), Some(hash)) = (
            incumbent.as_ref().and_then(|r| r.hash()),
            winner.candidate.effective_hash(),
        ) {
            if current.eq_ignore_ascii_case(&hash) {
                debug!(key = %key, "Best candidate is the cached torrent, keeping it");
                return Ok(ItemOutcome::Unchanged);
            }
        }

        let written = self
            .pipeline
            .store_winner(self.store.as_ref(), &key, &winner)
            .await?;
        if !written.is_written() {
            return Ok(ItemOutcome::Unchanged);
        }

        info!(
            key = %key,
            title = %item.title,
            resolution = winner.quality.resolution.as_label(),
            score = winner.total(),
            previous_score = incumbent.as_ref().map(|r| r.quality_score),
            "Cached stream"
        );

        Ok(if incumbent.is_some() {
            ItemOutcome::Upgraded
        } else {
            ItemOutcome::Cached
        })
    }
}

/// Sleep unless cancelled first. Returns false when cancelled.
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pause_returns_false_when_cancelled() {
        let cancel = CancellationToken::new();
        assert!(pause(&cancel, Duration::ZERO).await);
        assert!(pause(&cancel, Duration::from_millis(1)).await);

        cancel.cancel();
        assert!(!pause(&cancel, Duration::ZERO).await);
        assert!(!pause(&cancel, Duration::from_secs(60)).await);
    }
}
