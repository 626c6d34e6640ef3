//! Cached-stream storage trait.

use chrono::Duration;

use super::{
    CachedStreamRecord, ContentKey, NewCachedStream, StreamCacheError, StreamCacheStats,
    UpsertOutcome,
};

/// Durable store of the current best stream per library item.
///
/// Every mutation is a single atomic statement or transaction, so a job
/// cancelled between calls never leaves a half-written record.
pub trait StreamCacheStore: Send + Sync {
    /// Get the record for a key. Absence is `Ok(None)`, not an error.
    fn get_cached_stream(
        &self,
        key: &ContentKey,
    ) -> Result<Option<CachedStreamRecord>, StreamCacheError>;

    /// Insert or fully overwrite the record for a key.
    ///
    /// Resets `check_count` to 0, marks the record available, clears the
    /// upgrade flag and schedules the next check one recheck interval out.
    fn cache_stream(
        &self,
        key: &ContentKey,
        stream: &NewCachedStream,
    ) -> Result<UpsertOutcome, StreamCacheError>;

    /// Mark the stream gone from the debrid cache and back off before retrying.
    fn mark_unavailable(&self, key: &ContentKey) -> Result<(), StreamCacheError>;

    /// Set or clear the advisory upgrade flag. Never touches the active stream.
    fn mark_upgrade_available(
        &self,
        key: &ContentKey,
        available: bool,
    ) -> Result<(), StreamCacheError>;

    /// Record a check that changed nothing and schedule the next one.
    fn record_check(&self, key: &ContentKey, next_in: Duration) -> Result<(), StreamCacheError>;

    /// Available records whose next check is due, least recently checked first.
    fn due_for_check(&self, limit: u32) -> Result<Vec<CachedStreamRecord>, StreamCacheError>;

    /// Unavailable records, least recently checked first.
    fn unavailable(&self, limit: u32) -> Result<Vec<CachedStreamRecord>, StreamCacheError>;

    /// Available records flagged with an advisory upgrade, lowest score first.
    fn with_upgrades_available(
        &self,
        limit: u32,
    ) -> Result<Vec<CachedStreamRecord>, StreamCacheError>;

    /// Available records scoring at most `max_score`, lowest score first.
    fn by_quality_score(
        &self,
        max_score: i32,
        limit: u32,
    ) -> Result<Vec<CachedStreamRecord>, StreamCacheError>;

    fn stats(&self) -> Result<StreamCacheStats, StreamCacheError>;

    /// Remove a record. Returns whether one existed.
    fn delete(&self, key: &ContentKey) -> Result<bool, StreamCacheError>;
}
