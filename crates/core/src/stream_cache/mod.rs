//! Cached-stream records: the current best stream per movie or episode,
//! with availability and recheck bookkeeping.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteStreamCacheStore;
pub use store::StreamCacheStore;
pub use types::*;
