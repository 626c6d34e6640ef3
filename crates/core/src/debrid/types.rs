//! Types for debrid services.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Default upper bound on hashes per availability request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Errors from a debrid service.
#[derive(Debug, Clone, Error)]
pub enum DebridError {
    #[error("Debrid authentication failed")]
    Unauthorized,

    #[error("Debrid connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Debrid API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Debrid rate limited")]
    RateLimited,

    #[error("Invalid debrid response: {0}")]
    InvalidResponse(String),

    #[error("Debrid request timed out")]
    Timeout,

    #[error("Torrent not cached: {0}")]
    NotCached(String),
}

/// A debrid cache: answers whether torrents are instantly available and
/// resolves a playable link for a chosen torrent.
#[async_trait]
pub trait DebridService: Send + Sync {
    /// Service name for logging.
    fn name(&self) -> &str;

    /// Largest batch `check_cache` accepts.
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Check one batch of (lowercase) hashes. Hashes missing from the result
    /// are treated as not cached by callers.
    async fn check_cache(&self, hashes: &[String]) -> Result<HashMap<String, bool>, DebridError>;

    /// Resolve a playable URL for a cached torrent.
    async fn stream_url(&self, hash: &str, file_index: Option<u32>) -> Result<String, DebridError>;
}
