//! In-process registry of background job status.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use super::types::{format_interval, JobStatus};

/// Status of every registered job. Each job updates only its own entry;
/// readers get snapshots.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

fn to_chrono(interval: Duration) -> chrono::Duration {
    chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::days(365))
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a job.
    pub async fn register(&self, name: &str, description: &str, interval: Duration, enabled: bool) {
        let status = JobStatus {
            name: name.to_string(),
            description: description.to_string(),
            enabled,
            running: false,
            interval: format_interval(interval),
            interval_secs: interval.as_secs(),
            last_run: None,
            next_run: Some(Utc::now() + to_chrono(interval)),
            last_error: None,
            run_count: 0,
            progress: 0,
            progress_message: String::new(),
            items_processed: 0,
            items_total: 0,
        };
        self.jobs.write().await.insert(name.to_string(), status);
    }

    pub async fn mark_running(&self, name: &str) {
        if let Some(job) = self.jobs.write().await.get_mut(name) {
            job.running = true;
        }
    }

    /// Finish a run: record the outcome, schedule the next run and reset progress.
    pub async fn mark_complete(&self, name: &str, outcome: Result<(), String>, interval: Duration) {
        if let Some(job) = self.jobs.write().await.get_mut(name) {
            let now = Utc::now();
            job.running = false;
            job.last_run = Some(now);
            job.next_run = Some(now + to_chrono(interval));
            job.run_count += 1;
            job.progress = 0;
            job.progress_message.clear();
            job.items_processed = 0;
            job.items_total = 0;
            job.last_error = outcome.err();
        }
    }

    /// Update progress counters. Progress is `processed * 100 / total`, capped at 100.
    pub async fn update_progress(&self, name: &str, processed: u64, total: u64, message: &str) {
        if let Some(job) = self.jobs.write().await.get_mut(name) {
            job.items_processed = processed;
            job.items_total = total;
            job.progress_message = message.to_string();
            if total > 0 {
                job.progress = (processed.saturating_mul(100) / total).min(100) as u8;
            }
        }
    }

    pub async fn set_enabled(&self, name: &str, enabled: bool) {
        if let Some(job) = self.jobs.write().await.get_mut(name) {
            job.enabled = enabled;
        }
    }

    pub async fn status(&self, name: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(name).cloned()
    }

    /// All jobs, ordered by name.
    pub async fn all(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<JobStatus> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        jobs
    }
}
