//! Testing utilities and mock implementations.
//!
//! Mocks for every external collaborator of the jobs (stream provider,
//! debrid service, library catalog), so checker and backfill runs can be
//! exercised end to end against an in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use debridarr_core::testing::{fixtures, MockCatalog, MockDebrid, MockProvider};
//!
//! let provider = MockProvider::new();
//! let debrid = MockDebrid::new();
//! let catalog = MockCatalog::new();
//!
//! catalog.add_movie(1, "The Matrix", Some("tt0133093"));
//! let release = fixtures::candidate("The.Matrix.1080p.BluRay", &hash);
//! provider.set_streams("tt0133093", vec![release]).await;
//! debrid.set_cached(&[hash]).await;
//! ```

mod mock_catalog;
mod mock_debrid;
mod mock_provider;

pub use mock_catalog::MockCatalog;
pub use mock_debrid::MockDebrid;
pub use mock_provider::MockProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::provider::StreamCandidate;
    use crate::quality::{parse_quality, score_quality};
    use crate::stream_cache::{CachedStreamRecord, ContentKey, NewCachedStream};

    /// A 40-hex info hash derived from a number.
    pub fn hash(n: u32) -> String {
        format!("{:040x}", n)
    }

    /// A hash-carrying candidate with no size, seeders or URL.
    pub fn candidate(title: &str, info_hash: &str) -> StreamCandidate {
        StreamCandidate {
            title: title.to_string(),
            info_hash: info_hash.to_string(),
            url: String::new(),
            size_bytes: 0,
            source_tag: "mock".to_string(),
            seeders: 0,
            file_index: None,
        }
    }

    /// A URL-only candidate (no hash).
    pub fn url_candidate(title: &str, url: &str) -> StreamCandidate {
        StreamCandidate {
            url: url.to_string(),
            ..candidate(title, "")
        }
    }

    /// A candidate with a byte size.
    pub fn sized_candidate(title: &str, info_hash: &str, size_gb: u64) -> StreamCandidate {
        StreamCandidate {
            size_bytes: size_gb * 1024 * 1024 * 1024,
            ..candidate(title, info_hash)
        }
    }

    /// Payload for writing a stream parsed from `title`.
    pub fn new_stream(title: &str, info_hash: &str) -> NewCachedStream {
        let quality = parse_quality(title);
        NewCachedStream {
            url: format!("https://debrid.example/dl/{}", info_hash),
            hash: info_hash.to_string(),
            score: score_quality(&quality).total_score,
            quality,
            indexer: "mock".to_string(),
        }
    }

    /// An available record parsed from `title`, scored with the default policy.
    pub fn record(key: ContentKey, title: &str, info_hash: &str) -> CachedStreamRecord {
        let stream = new_stream(title, info_hash);
        let now = Utc::now();
        CachedStreamRecord {
            id: 1,
            key,
            stream_url: stream.url,
            stream_hash: stream.hash,
            quality_score: stream.score,
            resolution: stream.quality.resolution,
            hdr_type: stream.quality.hdr_type,
            audio_format: stream.quality.audio_format,
            source: stream.quality.source,
            codec: stream.quality.codec,
            file_size_gb: stream.quality.size_gb,
            indexer: stream.indexer,
            cached_at: now,
            last_checked_at: now,
            check_count: 0,
            is_available: true,
            upgrade_available: false,
            next_check_at: now + chrono::Duration::days(7),
            created_at: now,
            updated_at: now,
        }
    }
}
