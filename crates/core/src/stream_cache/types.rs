//! Types for the cached-stream store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quality::{HdrType, ParsedQuality, Resolution, VideoCodec, VideoSource};

/// Identity of a library item that owns at most one cached stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKey {
    Movie(i64),
    Episode {
        series_id: i64,
        season: u32,
        episode: u32,
    },
}

impl ContentKey {
    pub fn movie(id: i64) -> Self {
        ContentKey::Movie(id)
    }

    pub fn episode(series_id: i64, season: u32, episode: u32) -> Self {
        ContentKey::Episode {
            series_id,
            season,
            episode,
        }
    }

    /// Episodes are numbered from 1.
    pub fn is_valid(&self) -> bool {
        match self {
            ContentKey::Movie(_) => true,
            ContentKey::Episode {
                season, episode, ..
            } => *season > 0 && *episode > 0,
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKey::Movie(id) => write!(f, "movie:{}", id),
            ContentKey::Episode {
                series_id,
                season,
                episode,
            } => write!(f, "series:{}:S{:02}E{:02}", series_id, season, episode),
        }
    }
}

/// The current best stream of one library item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedStreamRecord {
    pub id: i64,
    pub key: ContentKey,
    pub stream_url: String,
    /// Lowercase info hash; empty for URL-only streams.
    pub stream_hash: String,
    pub quality_score: i32,
    pub resolution: Resolution,
    pub hdr_type: HdrType,
    pub audio_format: String,
    pub source: VideoSource,
    pub codec: VideoCodec,
    pub file_size_gb: f64,
    pub indexer: String,
    pub cached_at: DateTime<Utc>,
    pub last_checked_at: DateTime<Utc>,
    pub check_count: u32,
    pub is_available: bool,
    /// Advisory only: a better stream exists but was not applied.
    pub upgrade_available: bool,
    pub next_check_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CachedStreamRecord {
    /// The stored quality attributes.
    pub fn quality(&self) -> ParsedQuality {
        ParsedQuality {
            resolution: self.resolution,
            hdr_type: self.hdr_type,
            audio_format: self.audio_format.clone(),
            source: self.source,
            codec: self.codec,
            size_gb: self.file_size_gb,
            seeders: 0,
        }
    }

    /// Hash to re-validate against the debrid cache, if any.
    pub fn hash(&self) -> Option<&str> {
        Some(self.stream_hash.as_str()).filter(|h| !h.is_empty())
    }
}

/// Everything written when a stream becomes the item's active stream.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCachedStream {
    pub url: String,
    pub hash: String,
    pub quality: ParsedQuality,
    pub score: i32,
    pub indexer: String,
}

/// Why an upsert was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    EmptyUrl,
    InvalidKey,
}

/// Result of [`cache_stream`](super::StreamCacheStore::cache_stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
    Rejected(RejectReason),
}

impl UpsertOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, UpsertOutcome::Created | UpsertOutcome::Updated)
    }
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamCacheStats {
    pub total: u64,
    pub available: u64,
    pub unavailable: u64,
    pub upgrades_available: u64,
    pub due_for_check: u64,
    pub average_score: f64,
    pub count_4k: u64,
    pub count_1080p: u64,
    pub count_720p: u64,
    pub dolby_vision: u64,
    pub remux: u64,
}

/// Errors for stream cache operations.
#[derive(Debug, Error)]
pub enum StreamCacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("No cached stream for {0}")]
    NotFound(ContentKey),

    #[error("Invalid content key: {0}")]
    InvalidKey(ContentKey),
}
