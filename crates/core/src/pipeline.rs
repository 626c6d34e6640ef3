//! Provider -> debrid filter -> store, shared by the background jobs.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::CatalogError;
use crate::debrid::{AvailabilityFilter, DebridError};
use crate::provider::{ProviderError, StreamCandidate, StreamProvider, StreamRequest};
use crate::selector::{ScoredCandidate, StreamSelector};
use crate::stream_cache::{ContentKey, StreamCacheError, StreamCacheStore, UpsertOutcome};

/// Errors that abort a job step.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Store error: {0}")]
    Store(#[from] StreamCacheError),

    #[error("Debrid error: {0}")]
    Debrid(#[from] DebridError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Job cancelled")]
    Cancelled,
}

impl JobError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            JobError::Provider(ProviderError::RateLimited)
                | JobError::Debrid(DebridError::RateLimited)
        )
    }
}

/// The candidate pipeline every job runs for a single library item.
pub struct StreamPipeline {
    provider: Arc<dyn StreamProvider>,
    filter: AvailabilityFilter,
    selector: StreamSelector,
    allow_url_only: bool,
}

impl StreamPipeline {
    pub fn new(
        provider: Arc<dyn StreamProvider>,
        filter: AvailabilityFilter,
        selector: StreamSelector,
        allow_url_only: bool,
    ) -> Self {
        Self {
            provider,
            filter,
            selector,
            allow_url_only,
        }
    }

    pub fn filter(&self) -> &AvailabilityFilter {
        &self.filter
    }

    pub fn selector(&self) -> &StreamSelector {
        &self.selector
    }

    /// Fetch candidates for an item and keep the ones the debrid service has cached.
    ///
    /// An empty provider answer is not an error.
    pub async fn cached_candidates(
        &self,
        request: &StreamRequest,
    ) -> Result<Vec<StreamCandidate>, JobError> {
        let candidates = self.provider.streams_for_item(request).await?;
        let fetched = candidates.len();
        if fetched == 0 {
            return Ok(Vec::new());
        }

        let cached = self
            .filter
            .filter_to_cached(candidates, self.allow_url_only)
            .await?;
        debug!(
            provider = %self.provider.name(),
            imdb_id = %request.imdb_id,
            fetched,
            cached = cached.len(),
            "Candidates filtered"
        );

        Ok(cached)
    }

    /// Resolve the winner's playable URL and write it as the item's stream.
    pub async fn store_winner(
        &self,
        store: &dyn StreamCacheStore,
        key: &ContentKey,
        winner: &ScoredCandidate,
    ) -> Result<UpsertOutcome, JobError> {
        let url = self.filter.resolve_url(&winner.candidate).await?;
        let outcome = store.cache_stream(key, &winner.to_new_stream(url))?;
        if let UpsertOutcome::Rejected(reason) = outcome {
            warn!(key = %key, title = %winner.candidate.title, ?reason, "Stream write rejected");
        }
        Ok(outcome)
    }
}
