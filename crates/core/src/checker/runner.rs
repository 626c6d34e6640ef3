//! Cached-stream checker implementation.
//!
//! Each tick pulls a bounded batch of due records, asks the debrid service
//! about all their hashes in one batched call, then walks the records one
//! by one:
//! - still cached: look for an upgrade, apply or flag it, reschedule
//! - expired: find any cached replacement, otherwise mark unavailable

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::CheckerConfig;
use super::types::{CheckOutcome, CheckReport, CheckerStats};
use crate::catalog::{CatalogStore, ContentKind};
use crate::metrics::{CHECKS_TOTAL, JOB_DURATION};
use crate::pipeline::{JobError, StreamPipeline};
use crate::provider::StreamRequest;
use crate::scheduler::{JobRegistry, RunGuard, CHECKER_JOB};
use crate::selector::{evaluate_upgrade, UpgradeDecision};
use crate::stream_cache::{CachedStreamRecord, ContentKey, StreamCacheError, StreamCacheStore};

/// Re-validates cached streams against the debrid service and keeps them at
/// the best guard-compliant quality.
pub struct StreamChecker {
    config: CheckerConfig,
    store: Arc<dyn StreamCacheStore>,
    catalog: Arc<dyn CatalogStore>,
    pipeline: Arc<StreamPipeline>,
    registry: Arc<JobRegistry>,

    // Runtime state
    running: AtomicBool,
}

impl StreamChecker {
    pub fn new(
        config: CheckerConfig,
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

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Whether a tick is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Register the job with the status registry.
    pub async fn register(&self) {
        self.registry
            .register(
                CHECKER_JOB,
                "Re-validates cached streams and applies quality upgrades",
                self.config.interval(),
                self.config.enabled,
            )
            .await;
    }

    /// Spawn the periodic check loop. It stops when `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_loop(cancel).await })
    }

    async fn run_loop(&self, cancel: CancellationToken) {
        self.register().await;

        if !self.config.enabled {
            info!("Stream checker disabled");
            return;
        }

        info!(
            interval_minutes = self.config.interval_minutes,
            batch_size = self.config.batch_size,
            auto_upgrade = self.config.auto_upgrade,
            "Stream checker started"
        );

        let mut wait = !self.config.run_on_start;
        loop {
            if wait {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.config.interval()) => {}
                }
            }
            wait = true;

            match self.run_once(&cancel).await {
                Ok(report) if report.skipped_in_flight => {}
                Ok(report) => info!(
                    checked = report.checked,
                    still_cached = report.still_cached,
                    expired = report.expired,
                    replaced = report.replaced,
                    unavailable = report.unavailable,
                    upgraded = report.upgraded,
                    upgrade_flagged = report.upgrade_flagged,
                    guard_rejected = report.guard_rejected,
                    errors = report.errors,
                    "Stream check completed"
                ),
                Err(JobError::Cancelled) => break,
                Err(e) => error!(error = %e, "Stream check failed"),
            }
        }

        info!("Stream checker stopped");
    }

    /// Run one check tick.
    ///
    /// A tick that finds another one in flight does nothing and reports
    /// `skipped_in_flight`. A failed debrid batch fails the tick before any
    /// record is touched, so every record in it is retried next tick.
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<CheckReport, JobError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("Previous stream check still running, skipping tick");
            return Ok(CheckReport::skipped());
        };

        let started = Instant::now();
        self.registry.mark_running(CHECKER_JOB).await;

        let result = self.check_due(cancel).await;

        let label = match &result {
            Ok(_) => "ok",
            Err(JobError::Cancelled) => "cancelled",
            Err(_) => "error",
        };
        JOB_DURATION
            .with_label_values(&[CHECKER_JOB, label])
            .observe(started.elapsed().as_secs_f64());
        self.registry
            .mark_complete(
                CHECKER_JOB,
                result.as_ref().map(|_| ()).map_err(|e| e.to_string()),
                self.config.interval(),
            )
            .await;

        result
    }

    async fn check_due(&self, cancel: &CancellationToken) -> Result<CheckReport, JobError> {
        let mut report = CheckReport::default();

        let due = self.store.due_for_check(self.config.batch_size)?;
        if due.is_empty() {
            debug!("No streams due for checking");
            return Ok(report);
        }

        info!(count = due.len(), "Checking stream availability");

        let hashes: Vec<String> = due
            .iter()
            .filter_map(|r| r.hash().map(str::to_string))
            .collect();
        let availability = if hashes.is_empty() {
            HashMap::new()
        } else {
            self.pipeline.filter().check_hashes(&hashes).await?
        };

        let total = due.len() as u64;
        for (index, record) in due.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(checked = report.checked, "Stream check cancelled");
                return Err(JobError::Cancelled);
            }

            let cached = is_still_cached(record, &availability);
            report.checked += 1;
            if cached {
                report.still_cached += 1;
                CHECKS_TOTAL.with_label_values(&["still_cached"]).inc();
            } else {
                report.expired += 1;
                CHECKS_TOTAL.with_label_values(&["expired"]).inc();
            }

            match self.check_record(record, cached).await {
                Ok(outcome) => {
                    if outcome != CheckOutcome::StillCached {
                        CHECKS_TOTAL.with_label_values(&[outcome.as_str()]).inc();
                    }
                    report.record(outcome);
                }
                Err(e) => {
                    report.errors += 1;
                    CHECKS_TOTAL.with_label_values(&["error"]).inc();
                    warn!(key = %record.key, error = %e, "Stream check failed for record");
                }
            }

            self.registry
                .update_progress(
                    CHECKER_JOB,
                    index as u64 + 1,
                    total,
                    "Checking cached streams",
                )
                .await;
        }

        Ok(report)
    }

    /// Check one record now, regardless of its schedule.
    ///
    /// This does not take the tick guard, so it may run while a tick is in
    /// flight. Both paths write through the same upsert guard, and when they
    /// touch the same key the last write wins.
    pub async fn check_item(&self, key: &ContentKey) -> Result<CheckOutcome, JobError> {
        let record = self
            .store
            .get_cached_stream(key)?
            .ok_or(StreamCacheError::NotFound(*key))?;

        let availability = match record.hash() {
            Some(hash) => self.pipeline.filter().check_hashes(&[hash.to_string()]).await?,
            None => HashMap::new(),
        };
        let cached = record.is_available && is_still_cached(&record, &availability);

        self.check_record(&record, cached).await
    }

    /// Store statistics plus the checker's policy.
    pub fn stats(&self) -> Result<CheckerStats, JobError> {
        Ok(CheckerStats {
            cache: self.store.stats()?,
            checker_config: self.config.clone(),
        })
    }

    async fn check_record(
        &self,
        record: &CachedStreamRecord,
        cached: bool,
    ) -> Result<CheckOutcome, JobError> {
        let request = self.request_for(&record.key)?;
        if cached {
            self.check_available(record, request).await
        } else {
            self.replace_expired(record, request).await
        }
    }

    async fn check_available(
        &self,
        record: &CachedStreamRecord,
        request: Option<StreamRequest>,
    ) -> Result<CheckOutcome, JobError> {
        let key = &record.key;
        let Some(request) = request else {
            debug!(key = %key, "No external id for record, rescheduling only");
            self.store.record_check(key, self.config.recheck_after())?;
            return Ok(CheckOutcome::StillCached);
        };

        let cached = self.pipeline.cached_candidates(&request).await?;
        let ranked = self.pipeline.selector().rank(cached);
        let decision = evaluate_upgrade(record, ranked, &self.config.upgrade_policy());

        let outcome = match decision {
            UpgradeDecision::Apply(best) if self.config.auto_upgrade => {
                let written = self.pipeline.store_winner(self.store.as_ref(), key, &best).await?;
                if written.is_written() {
                    info!(
                        key = %key,
                        old_score = record.quality_score,
                        new_score = best.total(),
                        old_resolution = record.resolution.as_label(),
                        new_resolution = best.quality.resolution.as_label(),
                        "Upgraded stream"
                    );
                    return Ok(CheckOutcome::Upgraded);
                }
                CheckOutcome::StillCached
            }
            UpgradeDecision::Apply(best) | UpgradeDecision::AdvisoryOnly(best) => {
                info!(
                    key = %key,
                    current_score = record.quality_score,
                    candidate_score = best.total(),
                    current_size_gb = record.file_size_gb,
                    candidate_size_gb = best.quality.size_gb,
                    "Upgrade available, flagging only"
                );
                self.store.mark_upgrade_available(key, true)?;
                CheckOutcome::UpgradeFlagged
            }
            UpgradeDecision::Reject(guard) => {
                info!(key = %key, guard = guard.as_str(), "Upgrade rejected by guard rule");
                CheckOutcome::GuardRejected
            }
            UpgradeDecision::NoImprovement => CheckOutcome::StillCached,
        };

        self.store.record_check(key, self.config.recheck_after())?;
        Ok(outcome)
    }

    async fn replace_expired(
        &self,
        record: &CachedStreamRecord,
        request: Option<StreamRequest>,
    ) -> Result<CheckOutcome, JobError> {
        let key = &record.key;
        warn!(key = %key, hash = %record.stream_hash, "Stream expired from debrid cache");

        let Some(request) = request else {
            self.store.mark_unavailable(key)?;
            return Ok(CheckOutcome::Unavailable);
        };

        let cached = self.pipeline.cached_candidates(&request).await?;
        if let Some(best) = self.pipeline.selector().select_best(cached, None) {
            let written = self.pipeline.store_winner(self.store.as_ref(), key, &best).await?;
            if written.is_written() {
                info!(
                    key = %key,
                    old_score = record.quality_score,
                    new_score = best.total(),
                    resolution = best.quality.resolution.as_label(),
                    "Cached replacement stream"
                );
                return Ok(CheckOutcome::Replaced);
            }
        } else {
            warn!(key = %key, "No cached replacement available");
        }

        self.store.mark_unavailable(key)?;
        Ok(CheckOutcome::Unavailable)
    }

    /// Provider request for a record, or `None` when its catalog item is gone
    /// or has no external id.
    fn request_for(&self, key: &ContentKey) -> Result<Option<StreamRequest>, JobError> {
        let (kind, id) = match key {
            ContentKey::Movie(id) => (ContentKind::Movie, *id),
            ContentKey::Episode { series_id, .. } => (ContentKind::Series, *series_id),
        };
        let Some(item) = self.catalog.get_content(kind, id)? else {
            return Ok(None);
        };
        let Some(imdb_id) = item.usable_imdb_id() else {
            return Ok(None);
        };

        Ok(Some(match key {
            ContentKey::Movie(_) => StreamRequest::movie(imdb_id),
            ContentKey::Episode {
                season, episode, ..
            } => StreamRequest::episode(imdb_id, *season, *episode),
        }))
    }
}

/// Records without a hash point at a direct URL and have nothing to re-validate.
fn is_still_cached(record: &CachedStreamRecord, availability: &HashMap<String, bool>) -> bool {
    match record.hash() {
        Some(hash) => availability
            .get(&hash.to_ascii_lowercase())
            .copied()
            .unwrap_or(false),
        None => true,
    }
}
