//! SQLite-backed cached-stream store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, error};

use super::{
    CachedStreamRecord, ContentKey, NewCachedStream, RejectReason, StreamCacheError,
    StreamCacheStats, StreamCacheStore, UpsertOutcome,
};
use crate::quality::{HdrType, Resolution, VideoCodec, VideoSource};

const COLUMNS: &str = "id, movie_id, series_id, season, episode, stream_url, stream_hash, \
     quality_score, resolution, hdr_type, audio_format, source_type, codec, file_size_gb, \
     indexer, cached_at, last_checked_at, check_count, is_available, upgrade_available, \
     next_check_at, created_at, updated_at";

/// Fixed-width RFC 3339 so text comparison in SQL orders chronologically.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads an RFC 3339 text column. A corrupt value fails the row read.
fn parse_ts(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// SQL predicate and parameters selecting one key's row.
fn key_filter(key: &ContentKey) -> (&'static str, Vec<i64>) {
    match *key {
        ContentKey::Movie(id) => ("movie_id = ?", vec![id]),
        ContentKey::Episode {
            series_id,
            season,
            episode,
        } => (
            "series_id = ? AND season = ? AND episode = ?",
            vec![series_id, season as i64, episode as i64],
        ),
    }
}

/// SQLite-backed stream cache.
pub struct SqliteStreamCacheStore {
    conn: Mutex<Connection>,
    recheck_after: Duration,
    unavailable_retry: Duration,
}

impl SqliteStreamCacheStore {
    /// Open or create the store at `path`.
    pub fn new(path: &Path) -> Result<Self, StreamCacheError> {
        let conn = Connection::open(path).map_err(|e| StreamCacheError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StreamCacheError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StreamCacheError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StreamCacheError> {
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            recheck_after: Duration::days(7),
            unavailable_retry: Duration::days(1),
        })
    }

    /// Override the recheck interval after a successful cache and the retry
    /// backoff after a stream goes unavailable.
    pub fn with_schedule(mut self, recheck_after: Duration, unavailable_retry: Duration) -> Self {
        self.recheck_after = recheck_after;
        self.unavailable_retry = unavailable_retry;
        self
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StreamCacheError> {
        conn.execute_batch(
            r#"
            -- One active stream per movie or per episode
            CREATE TABLE IF NOT EXISTS media_streams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id INTEGER,
                series_id INTEGER,
                season INTEGER,
                episode INTEGER,
                stream_url TEXT NOT NULL,
                stream_hash TEXT NOT NULL DEFAULT '',
                quality_score INTEGER NOT NULL,
                resolution TEXT NOT NULL,
                hdr_type TEXT NOT NULL,
                audio_format TEXT NOT NULL DEFAULT '',
                source_type TEXT NOT NULL,
                codec TEXT NOT NULL,
                file_size_gb REAL NOT NULL DEFAULT 0,
                indexer TEXT NOT NULL DEFAULT '',
                cached_at TEXT NOT NULL,
                last_checked_at TEXT NOT NULL,
                check_count INTEGER NOT NULL DEFAULT 0,
                is_available INTEGER NOT NULL DEFAULT 1,
                upgrade_available INTEGER NOT NULL DEFAULT 0,
                next_check_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (
                    (movie_id IS NOT NULL
                        AND series_id IS NULL AND season IS NULL AND episode IS NULL)
                    OR
                    (movie_id IS NULL
                        AND series_id IS NOT NULL AND season IS NOT NULL AND episode IS NOT NULL)
                )
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_media_streams_movie
                ON media_streams(movie_id) WHERE movie_id IS NOT NULL;
            CREATE UNIQUE INDEX IF NOT EXISTS idx_media_streams_episode
                ON media_streams(series_id, season, episode) WHERE series_id IS NOT NULL;
            CREATE INDEX IF NOT EXISTS idx_media_streams_due
                ON media_streams(is_available, next_check_at);
            CREATE INDEX IF NOT EXISTS idx_media_streams_score
                ON media_streams(quality_score);
            "#,
        )
        .map_err(|e| StreamCacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CachedStreamRecord> {
        let movie_id: Option<i64> = row.get(1)?;
        let series_id: Option<i64> = row.get(2)?;
        let season: Option<u32> = row.get(3)?;
        let episode: Option<u32> = row.get(4)?;

        let key = match (movie_id, series_id, season, episode) {
            (Some(id), _, _, _) => ContentKey::Movie(id),
            (None, Some(series_id), Some(season), Some(episode)) => ContentKey::Episode {
                series_id,
                season,
                episode,
            },
            _ => {
                return Err(rusqlite::Error::InvalidColumnType(
                    2,
                    "series_id".to_string(),
                    Type::Null,
                ))
            }
        };

        let resolution: String = row.get(8)?;
        let hdr_type: String = row.get(9)?;
        let source: String = row.get(11)?;
        let codec: String = row.get(12)?;

        Ok(CachedStreamRecord {
            id: row.get(0)?,
            key,
            stream_url: row.get(5)?,
            stream_hash: row.get(6)?,
            quality_score: row.get(7)?,
            resolution: Resolution::from_label(&resolution),
            hdr_type: HdrType::from_label(&hdr_type),
            audio_format: row.get(10)?,
            source: VideoSource::from_label(&source),
            codec: VideoCodec::from_label(&codec),
            file_size_gb: row.get(13)?,
            indexer: row.get(14)?,
            cached_at: parse_ts(row, 15)?,
            last_checked_at: parse_ts(row, 16)?,
            check_count: row.get(17)?,
            is_available: row.get(18)?,
            upgrade_available: row.get(19)?,
            next_check_at: parse_ts(row, 20)?,
            created_at: parse_ts(row, 21)?,
            updated_at: parse_ts(row, 22)?,
        })
    }

    fn query_records(
        &self,
        where_clause: &str,
        order_by: &str,
        params: Vec<rusqlite::types::Value>,
    ) -> Result<Vec<CachedStreamRecord>, StreamCacheError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM media_streams WHERE {} ORDER BY {} LIMIT ?",
            COLUMNS, where_clause, order_by
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StreamCacheError::Database(e.to_string()))?;

        let records = stmt
            .query_map(params_from_iter(params), Self::row_to_record)
            .map_err(|e| StreamCacheError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StreamCacheError::Database(e.to_string()))?;

        Ok(records)
    }

    /// Run an UPDATE against one key's row; `NotFound` when no row matched.
    fn update_key(
        &self,
        key: &ContentKey,
        set_clause: &str,
        mut values: Vec<rusqlite::types::Value>,
    ) -> Result<(), StreamCacheError> {
        let conn = self.conn.lock().unwrap();
        let (filter, key_params) = key_filter(key);
        values.extend(key_params.into_iter().map(rusqlite::types::Value::from));

        let rows = conn
            .execute(
                &format!("UPDATE media_streams SET {} WHERE {}", set_clause, filter),
                params_from_iter(values),
            )
            .map_err(|e| {
                error!(key = %key, error = %e, "Failed to update cached stream");
                StreamCacheError::Database(e.to_string())
            })?;

        if rows == 0 {
            return Err(StreamCacheError::NotFound(*key));
        }
        Ok(())
    }
}

impl StreamCacheStore for SqliteStreamCacheStore {
    fn get_cached_stream(
        &self,
        key: &ContentKey,
    ) -> Result<Option<CachedStreamRecord>, StreamCacheError> {
        let conn = self.conn.lock().unwrap();
        let (filter, key_params) = key_filter(key);

        conn.query_row(
            &format!("SELECT {} FROM media_streams WHERE {}", COLUMNS, filter),
            params_from_iter(key_params),
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| StreamCacheError::Database(e.to_string()))
    }

    fn cache_stream(
        &self,
        key: &ContentKey,
        stream: &NewCachedStream,
    ) -> Result<UpsertOutcome, StreamCacheError> {
        if !key.is_valid() {
            return Ok(UpsertOutcome::Rejected(RejectReason::InvalidKey));
        }
        if stream.url.trim().is_empty() {
            return Ok(UpsertOutcome::Rejected(RejectReason::EmptyUrl));
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StreamCacheError::Database(e.to_string()))?;

        let (filter, key_params) = key_filter(key);
        let existing: Option<i64> = tx
            .query_row(
                &format!("SELECT id FROM media_streams WHERE {}", filter),
                params_from_iter(key_params),
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StreamCacheError::Database(e.to_string()))?;

        let now = Utc::now();
        let now_s = fmt_ts(now);
        let next_s = fmt_ts(now + self.recheck_after);
        let q = &stream.quality;

        let outcome = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE media_streams SET stream_url = ?, stream_hash = ?, quality_score = ?, \
                     resolution = ?, hdr_type = ?, audio_format = ?, source_type = ?, codec = ?, \
                     file_size_gb = ?, indexer = ?, cached_at = ?, last_checked_at = ?, \
                     check_count = 0, is_available = 1, upgrade_available = 0, next_check_at = ?, \
                     updated_at = ? WHERE id = ?",
                    params![
                        stream.url,
                        stream.hash.to_ascii_lowercase(),
                        stream.score,
                        q.resolution.as_label(),
                        q.hdr_type.as_label(),
                        q.audio_format,
                        q.source.as_label(),
                        q.codec.as_label(),
                        q.size_gb,
                        stream.indexer,
                        now_s,
                        now_s,
                        next_s,
                        now_s,
                        id,
                    ],
                )
                .map_err(|e| StreamCacheError::Database(e.to_string()))?;
                UpsertOutcome::Updated
            }
            None => {
                let (movie_id, series_id, season, episode) = match *key {
                    ContentKey::Movie(id) => (Some(id), None, None, None),
                    ContentKey::Episode {
                        series_id,
                        season,
                        episode,
                    } => (None, Some(series_id), Some(season), Some(episode)),
                };
                tx.execute(
                    "INSERT INTO media_streams (movie_id, series_id, season, episode, stream_url, \
                     stream_hash, quality_score, resolution, hdr_type, audio_format, source_type, \
                     codec, file_size_gb, indexer, cached_at, last_checked_at, check_count, \
                     is_available, upgrade_available, next_check_at, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 1, 0, ?, ?, ?)",
                    params![
                        movie_id,
                        series_id,
                        season,
                        episode,
                        stream.url,
                        stream.hash.to_ascii_lowercase(),
                        stream.score,
                        q.resolution.as_label(),
                        q.hdr_type.as_label(),
                        q.audio_format,
                        q.source.as_label(),
                        q.codec.as_label(),
                        q.size_gb,
                        stream.indexer,
                        now_s,
                        now_s,
                        next_s,
                        now_s,
                        now_s,
                    ],
                )
                .map_err(|e| StreamCacheError::Database(e.to_string()))?;
                UpsertOutcome::Created
            }
        };

        tx.commit()
            .map_err(|e| StreamCacheError::Database(e.to_string()))?;

        debug!(key = %key, score = stream.score, outcome = ?outcome, "Cached stream written");
        Ok(outcome)
    }

    fn mark_unavailable(&self, key: &ContentKey) -> Result<(), StreamCacheError> {
        let now = Utc::now();
        self.update_key(
            key,
            "is_available = 0, check_count = check_count + 1, last_checked_at = ?, \
             next_check_at = ?, updated_at = ?",
            vec![
                fmt_ts(now).into(),
                fmt_ts(now + self.unavailable_retry).into(),
                fmt_ts(now).into(),
            ],
        )
    }

    fn mark_upgrade_available(
        &self,
        key: &ContentKey,
        available: bool,
    ) -> Result<(), StreamCacheError> {
        self.update_key(
            key,
            "upgrade_available = ?, updated_at = ?",
            vec![(available as i64).into(), fmt_ts(Utc::now()).into()],
        )
    }

    fn record_check(&self, key: &ContentKey, next_in: Duration) -> Result<(), StreamCacheError> {
        let now = Utc::now();
        self.update_key(
            key,
            "last_checked_at = ?, check_count = check_count + 1, next_check_at = ?, updated_at = ?",
            vec![
                fmt_ts(now).into(),
                fmt_ts(now + next_in).into(),
                fmt_ts(now).into(),
            ],
        )
    }

    fn due_for_check(&self, limit: u32) -> Result<Vec<CachedStreamRecord>, StreamCacheError> {
        self.query_records(
            "is_available = 1 AND next_check_at <= ?",
            "last_checked_at ASC, id ASC",
            vec![fmt_ts(Utc::now()).into(), (limit as i64).into()],
        )
    }

    fn unavailable(&self, limit: u32) -> Result<Vec<CachedStreamRecord>, StreamCacheError> {
        self.query_records(
            "is_available = 0",
            "last_checked_at ASC, id ASC",
            vec![(limit as i64).into()],
        )
    }

    fn with_upgrades_available(
        &self,
        limit: u32,
    ) -> Result<Vec<CachedStreamRecord>, StreamCacheError> {
        self.query_records(
            "is_available = 1 AND upgrade_available = 1",
            "quality_score ASC, id ASC",
            vec![(limit as i64).into()],
        )
    }

    fn by_quality_score(
        &self,
        max_score: i32,
        limit: u32,
    ) -> Result<Vec<CachedStreamRecord>, StreamCacheError> {
        self.query_records(
            "is_available = 1 AND quality_score <= ?",
            "quality_score ASC, id ASC",
            vec![(max_score as i64).into(), (limit as i64).into()],
        )
    }

    fn stats(&self) -> Result<StreamCacheStats, StreamCacheError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*), \
             COALESCE(SUM(is_available = 1), 0), \
             COALESCE(SUM(is_available = 0), 0), \
             COALESCE(SUM(is_available = 1 AND upgrade_available = 1), 0), \
             COALESCE(SUM(is_available = 1 AND next_check_at <= ?), 0), \
             COALESCE(AVG(CASE WHEN is_available = 1 THEN quality_score END), 0.0), \
             COALESCE(SUM(resolution = '2160p'), 0), \
             COALESCE(SUM(resolution = '1080p'), 0), \
             COALESCE(SUM(resolution = '720p'), 0), \
             COALESCE(SUM(hdr_type IN ('DV', 'DV+HDR')), 0), \
             COALESCE(SUM(source_type = 'REMUX'), 0) \
             FROM media_streams",
            params![fmt_ts(Utc::now())],
            |row| {
                Ok(StreamCacheStats {
                    total: row.get::<_, i64>(0)? as u64,
                    available: row.get::<_, i64>(1)? as u64,
                    unavailable: row.get::<_, i64>(2)? as u64,
                    upgrades_available: row.get::<_, i64>(3)? as u64,
                    due_for_check: row.get::<_, i64>(4)? as u64,
                    average_score: row.get(5)?,
                    count_4k: row.get::<_, i64>(6)? as u64,
                    count_1080p: row.get::<_, i64>(7)? as u64,
                    count_720p: row.get::<_, i64>(8)? as u64,
                    dolby_vision: row.get::<_, i64>(9)? as u64,
                    remux: row.get::<_, i64>(10)? as u64,
                })
            },
        )
        .map_err(|e| StreamCacheError::Database(e.to_string()))
    }

    fn delete(&self, key: &ContentKey) -> Result<bool, StreamCacheError> {
        let conn = self.conn.lock().unwrap();
        let (filter, key_params) = key_filter(key);
        let rows = conn
            .execute(
                &format!("DELETE FROM media_streams WHERE {}", filter),
                params_from_iter(key_params),
            )
            .map_err(|e| StreamCacheError::Database(e.to_string()))?;
        Ok(rows > 0)
    }
}
