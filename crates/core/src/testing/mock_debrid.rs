//! Mock debrid service for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::debrid::{DebridError, DebridService, DEFAULT_MAX_BATCH_SIZE};

/// Mock implementation of the DebridService trait.
///
/// Provides controllable behavior for testing:
/// - Configure which hashes are cached
/// - Record every availability batch and resolved hash
/// - Fail individual batches, delay responses
///
/// Resolved URLs have the form `https://debrid.example/dl/{hash}`.
#[derive(Debug)]
pub struct MockDebrid {
    /// Hashes reported as cached.
    cached: Arc<RwLock<HashSet<String>>>,
    /// Recorded availability batches, in call order.
    batches: Arc<RwLock<Vec<Vec<String>>>>,
    /// Hashes passed to `stream_url`, in call order.
    resolved: Arc<RwLock<Vec<String>>>,
    /// Batch index -> error returned for that batch.
    batch_errors: Arc<RwLock<HashMap<usize, DebridError>>>,
    /// If set, the next `stream_url` call fails with this error.
    next_url_error: Arc<RwLock<Option<DebridError>>>,
    /// Leave uncached hashes out of responses instead of answering `false`.
    omit_unknown: Arc<RwLock<bool>>,
    /// Delay before answering.
    delay: Arc<RwLock<Option<Duration>>>,
    max_batch_size: AtomicUsize,
}

impl Default for MockDebrid {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDebrid {
    pub fn new() -> Self {
        Self {
            cached: Arc::new(RwLock::new(HashSet::new())),
            batches: Arc::new(RwLock::new(Vec::new())),
            resolved: Arc::new(RwLock::new(Vec::new())),
            batch_errors: Arc::new(RwLock::new(HashMap::new())),
            next_url_error: Arc::new(RwLock::new(None)),
            omit_unknown: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(None)),
            max_batch_size: AtomicUsize::new(DEFAULT_MAX_BATCH_SIZE),
        }
    }

    /// Replace the set of cached hashes.
    pub async fn set_cached(&self, hashes: &[String]) {
        *self.cached.write().await = hashes.iter().map(|h| h.to_ascii_lowercase()).collect();
    }

    /// Add hashes to the cached set.
    pub async fn add_cached(&self, hashes: &[String]) {
        self.cached
            .write()
            .await
            .extend(hashes.iter().map(|h| h.to_ascii_lowercase()));
    }

    /// Remove hashes from the cached set.
    pub async fn evict(&self, hashes: &[String]) {
        let mut cached = self.cached.write().await;
        for hash in hashes {
            cached.remove(&hash.to_ascii_lowercase());
        }
    }

    pub async fn set_max_batch_size(&self, size: usize) {
        self.max_batch_size.store(size, Ordering::SeqCst);
    }

    pub async fn set_omit_unknown(&self, omit: bool) {
        *self.omit_unknown.write().await = omit;
    }

    /// Make the batch with this zero-based call index fail.
    pub async fn fail_batch(&self, index: usize, error: DebridError) {
        self.batch_errors.write().await.insert(index, error);
    }

    /// Configure the next `stream_url` call to fail.
    pub async fn fail_next_url(&self, error: DebridError) {
        *self.next_url_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn recorded_batches(&self) -> Vec<Vec<String>> {
        self.batches.read().await.clone()
    }

    pub async fn resolved_hashes(&self) -> Vec<String> {
        self.resolved.read().await.clone()
    }
}

#[async_trait]
impl DebridService for MockDebrid {
    fn name(&self) -> &str {
        "mock"
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size.load(Ordering::SeqCst)
    }

    async fn check_cache(&self, hashes: &[String]) -> Result<HashMap<String, bool>, DebridError> {
        let index = {
            let mut batches = self.batches.write().await;
            batches.push(hashes.to_vec());
            batches.len() - 1
        };

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.batch_errors.write().await.remove(&index) {
            return Err(error);
        }

        let cached = self.cached.read().await;
        let omit_unknown = *self.omit_unknown.read().await;
        Ok(hashes
            .iter()
            .map(|h| (h.clone(), cached.contains(&h.to_ascii_lowercase())))
            .filter(|(_, is_cached)| *is_cached || !omit_unknown)
            .collect())
    }

    async fn stream_url(
        &self,
        hash: &str,
        _file_index: Option<u32>,
    ) -> Result<String, DebridError> {
        self.resolved.write().await.push(hash.to_string());
        if let Some(error) = self.next_url_error.write().await.take() {
            return Err(error);
        }
        Ok(format!("https://debrid.example/dl/{}", hash))
    }
}
