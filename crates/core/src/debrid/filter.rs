//! Batched availability checks and candidate filtering.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use super::{DebridError, DebridService};
use crate::metrics::DEBRID_BATCHES;
use crate::provider::StreamCandidate;

/// Splits hash lists into provider-sized batches and merges the answers.
///
/// A failing or timed-out batch fails the whole call; hashes the service
/// does not mention are reported as not cached.
pub struct AvailabilityFilter {
    debrid: Arc<dyn DebridService>,
    batch_size: usize,
    call_timeout: Duration,
}

impl AvailabilityFilter {
    pub fn new(debrid: Arc<dyn DebridService>, batch_size: usize, call_timeout: Duration) -> Self {
        Self {
            debrid,
            batch_size,
            call_timeout,
        }
    }

    /// The underlying service.
    pub fn service(&self) -> &Arc<dyn DebridService> {
        &self.debrid
    }

    fn effective_batch_size(&self) -> usize {
        self.batch_size.min(self.debrid.max_batch_size()).max(1)
    }

    /// Check many hashes. The result has one lowercase entry per distinct input hash.
    pub async fn check_hashes(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, bool>, DebridError> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = hashes
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty() && seen.insert(h.clone()))
            .collect();

        let mut availability = HashMap::with_capacity(unique.len());
        for batch in unique.chunks(self.effective_batch_size()) {
            let call = self.debrid.check_cache(batch);
            let response = match tokio::time::timeout(self.call_timeout, call).await {
                Ok(Ok(response)) => {
                    DEBRID_BATCHES.with_label_values(&["ok"]).inc();
                    response
                }
                Ok(Err(e)) => {
                    DEBRID_BATCHES.with_label_values(&["error"]).inc();
                    warn!(
                        service = %self.debrid.name(),
                        batch = batch.len(),
                        error = %e,
                        "Availability batch failed"
                    );
                    return Err(e);
                }
                Err(_) => {
                    DEBRID_BATCHES.with_label_values(&["timeout"]).inc();
                    warn!(
                        service = %self.debrid.name(),
                        batch = batch.len(),
                        "Availability batch timed out"
                    );
                    return Err(DebridError::Timeout);
                }
            };

            let response: HashMap<String, bool> = response
                .into_iter()
                .map(|(hash, cached)| (hash.to_ascii_lowercase(), cached))
                .collect();
            for hash in batch {
                availability.insert(hash.clone(), response.get(hash).copied().unwrap_or(false));
            }
            debug!(
                service = %self.debrid.name(),
                batch = batch.len(),
                cached = batch.iter().filter(|h| availability.get(*h) == Some(&true)).count(),
                "Availability batch checked"
            );
        }

        Ok(availability)
    }

    /// Keep only candidates the debrid service has cached, plus URL-only
    /// candidates with a playable scheme when `allow_url_only` is set.
    pub async fn filter_to_cached(
        &self,
        candidates: Vec<StreamCandidate>,
        allow_url_only: bool,
    ) -> Result<Vec<StreamCandidate>, DebridError> {
        let hashes: Vec<String> = candidates
            .iter()
            .filter_map(StreamCandidate::effective_hash)
            .collect();
        let availability = if hashes.is_empty() {
            HashMap::new()
        } else {
            self.check_hashes(&hashes).await?
        };
        Ok(retain_cached(candidates, &availability, allow_url_only))
    }

    /// Playable URL for a chosen candidate: resolved through the debrid
    /// service when it has a hash, otherwise its own URL.
    pub async fn resolve_url(&self, candidate: &StreamCandidate) -> Result<String, DebridError> {
        let Some(hash) = candidate.effective_hash() else {
            return Ok(candidate.url.clone());
        };
        match tokio::time::timeout(
            self.call_timeout,
            self.debrid.stream_url(&hash, candidate.file_index),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DebridError::Timeout),
        }
    }
}

/// Apply an availability map to a candidate list, preserving order.
pub fn retain_cached(
    candidates: Vec<StreamCandidate>,
    availability: &HashMap<String, bool>,
    allow_url_only: bool,
) -> Vec<StreamCandidate> {
    candidates
        .into_iter()
        .filter(|c| match c.effective_hash() {
            Some(hash) => availability.get(&hash).copied().unwrap_or(false),
            None => allow_url_only && has_playable_scheme(&c.url),
        })
        .collect()
}

/// True for `http`, `https` and `magnet` URLs.
pub fn has_playable_scheme(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => parsed.host_str().is_some(),
            "magnet" => true,
            _ => false,
        },
        Err(_) => false,
    }
}
