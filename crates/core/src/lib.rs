pub mod catalog;
pub mod checker;
pub mod config;
pub mod debrid;
pub mod metrics;
pub mod pipeline;
pub mod provider;
pub mod quality;
pub mod scanner;
pub mod scheduler;
pub mod selector;
pub mod stream_cache;
pub mod testing;

pub use catalog::{CatalogError, CatalogStore, ContentKind, ContentRef, SqliteCatalog};
pub use checker::{CheckOutcome, CheckReport, CheckerConfig, CheckerStats, StreamChecker};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DebridBackend,
    LogFormat, SanitizedConfig,
};
pub use debrid::{AvailabilityFilter, DebridError, DebridService};
pub use pipeline::{JobError, StreamPipeline};
pub use provider::{ProviderError, StreamCandidate, StreamProvider, StreamRequest};
pub use quality::{parse_quality, score_quality, ParsedQuality, ScoreBreakdown, ScoringPolicy};
pub use scanner::{BackfillReport, LibraryScanner, ScannerConfig};
pub use scheduler::{JobRegistry, JobStatus, BACKFILL_JOB, CHECKER_JOB};
pub use selector::{ScoredCandidate, StreamSelector, UpgradeDecision, UpgradePolicy};
pub use stream_cache::{
    CachedStreamRecord, ContentKey, SqliteStreamCacheStore, StreamCacheError, StreamCacheStats,
    StreamCacheStore, UpsertOutcome,
};
