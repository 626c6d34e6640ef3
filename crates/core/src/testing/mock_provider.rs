//! Mock stream provider for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::provider::{ProviderError, StreamCandidate, StreamProvider, StreamRequest};

/// Mock implementation of the StreamProvider trait.
///
/// Answers are configured per external id; unknown ids return no
/// candidates. Every request is recorded for assertions.
///
/// # Example
///
/// ```rust,ignore
/// use debridarr_core::testing::{MockProvider, fixtures};
///
/// let provider = MockProvider::new();
/// let release = fixtures::candidate("The.Matrix.1080p.BluRay", &hash);
/// provider.set_streams("tt0133093", vec![release]).await;
///
/// let found = provider.streams_for_item(&StreamRequest::movie("tt0133093")).await?;
/// assert_eq!(found.len(), 1);
/// assert_eq!(provider.request_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockProvider {
    /// Candidates to return, by external id.
    streams: Arc<RwLock<HashMap<String, Vec<StreamCandidate>>>>,
    /// Recorded requests.
    requests: Arc<RwLock<Vec<StreamRequest>>>,
    /// If set, the next request will fail with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
    /// Ids that always fail.
    failing: Arc<RwLock<HashMap<String, ProviderError>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidates returned for an external id.
    pub async fn set_streams(&self, imdb_id: &str, streams: Vec<StreamCandidate>) {
        self.streams
            .write()
            .await
            .insert(imdb_id.to_string(), streams);
    }

    /// Remove the candidates for an external id.
    pub async fn clear_streams(&self, imdb_id: &str) {
        self.streams.write().await.remove(imdb_id);
    }

    /// Configure the next request to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every request for an external id fail.
    pub async fn fail_for(&self, imdb_id: &str, error: ProviderError) {
        self.failing
            .write()
            .await
            .insert(imdb_id.to_string(), error);
    }

    pub async fn recorded_requests(&self) -> Vec<StreamRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl StreamProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn streams_for_item(
        &self,
        request: &StreamRequest,
    ) -> Result<Vec<StreamCandidate>, ProviderError> {
        self.requests.write().await.push(request.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(error) = self.failing.read().await.get(&request.imdb_id) {
            return Err(error.clone());
        }

        Ok(self
            .streams
            .read()
            .await
            .get(&request.imdb_id)
            .cloned()
            .unwrap_or_default())
    }
}
