//! Types for stream providers.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ContentKind;
use crate::quality::{parse_quality, ParsedQuality};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

static MAGNET_BTIH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)btih:([0-9a-f]{40})(?:$|[^0-9a-f])").expect("invalid btih pattern")
});
static HEX_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^0-9a-f])([0-9a-f]{40})(?:$|[^0-9a-f])").expect("invalid hash pattern")
});

/// What to look up on a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub imdb_id: String,
    pub kind: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl StreamRequest {
    pub fn movie(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            kind: ContentKind::Movie,
            season: None,
            episode: None,
        }
    }

    pub fn episode(imdb_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            kind: ContentKind::Series,
            season: Some(season),
            episode: Some(episode),
        }
    }
}

/// A raw stream candidate as returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamCandidate {
    /// Raw release name.
    pub title: String,
    /// Info hash (lowercase hex). Empty when only a direct URL is known.
    #[serde(default)]
    pub info_hash: String,
    /// Direct or magnet URL. May be empty for hash-only candidates.
    #[serde(default)]
    pub url: String,
    /// Size in bytes, 0 if unknown.
    #[serde(default)]
    pub size_bytes: u64,
    /// Provider or indexer name.
    #[serde(default)]
    pub source_tag: String,
    #[serde(default)]
    pub seeders: u32,
    /// File index within the torrent, when the provider knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_index: Option<u32>,
}

impl StreamCandidate {
    /// The hash used for debrid lookups.
    ///
    /// Falls back to a btih in a magnet URI, then to any 40-hex run in the URL.
    pub fn effective_hash(&self) -> Option<String> {
        let hash = self.info_hash.trim();
        if !hash.is_empty() {
            return Some(hash.to_ascii_lowercase());
        }
        MAGNET_BTIH
            .captures(&self.url)
            .or_else(|| HEX_RUN.captures(&self.url))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
    }

    /// Size in GB from the byte count, or parsed from the title.
    pub fn size_gb(&self) -> f64 {
        if self.size_bytes > 0 {
            self.size_bytes as f64 / BYTES_PER_GB
        } else {
            crate::quality::parse_size_gb(&self.title).unwrap_or(0.0)
        }
    }

    /// Parse the title and carry size and seeders through.
    pub fn parsed_quality(&self) -> ParsedQuality {
        let mut quality = parse_quality(&self.title);
        quality.size_gb = self.size_gb();
        quality.seeders = self.seeders;
        quality
    }
}

/// Errors that can occur when fetching candidates.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Provider rate limited")]
    RateLimited,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Source of stream candidates for a library item.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Fetch candidates. An empty list is not an error.
    async fn streams_for_item(
        &self,
        request: &StreamRequest,
    ) -> Result<Vec<StreamCandidate>, ProviderError>;
}
