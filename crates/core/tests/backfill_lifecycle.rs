//! Library backfill integration tests.
//!
//! Full passes over a mocked catalog against an on-disk stream store:
//! catalog page -> provider -> debrid filter -> selector -> store

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use debridarr_core::{
    catalog::ContentKind,
    provider::ProviderError,
    quality::Resolution,
    scanner::ItemOutcome,
    testing::{fixtures, MockCatalog, MockDebrid, MockProvider},
    AvailabilityFilter, CatalogStore, ContentKey, ContentRef, DebridService, JobError,
    JobRegistry, LibraryScanner, ScannerConfig, SqliteStreamCacheStore, StreamCacheStore,
    StreamPipeline, StreamProvider, StreamSelector, BACKFILL_JOB,
};

struct TestHarness {
    store: Arc<SqliteStreamCacheStore>,
    catalog: Arc<MockCatalog>,
    provider: Arc<MockProvider>,
    debrid: Arc<MockDebrid>,
    registry: Arc<JobRegistry>,
    _temp_dir: TempDir,
}

/// No pauses, so a pass runs as fast as the mocks answer.
fn fast_config() -> ScannerConfig {
    ScannerConfig {
        initial_delay_secs: 0,
        page_pause_ms: 0,
        error_backoff_ms: 0,
        rate_limit_backoff_ms: 0,
        ..Default::default()
    }
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        Self {
            store: Arc::new(
                SqliteStreamCacheStore::new(&db_path).expect("Failed to create stream store"),
            ),
            catalog: Arc::new(MockCatalog::new()),
            provider: Arc::new(MockProvider::new()),
            debrid: Arc::new(MockDebrid::new()),
            registry: Arc::new(JobRegistry::new()),
            _temp_dir: temp_dir,
        }
    }

    fn scanner(&self, config: ScannerConfig) -> LibraryScanner {
        let filter = AvailabilityFilter::new(
            Arc::clone(&self.debrid) as Arc<dyn DebridService>,
            100,
            Duration::from_secs(5),
        );
        let pipeline = StreamPipeline::new(
            Arc::clone(&self.provider) as Arc<dyn StreamProvider>,
            filter,
            StreamSelector::default(),
            true,
        );

        LibraryScanner::new(
            config,
            Arc::clone(&self.store) as Arc<dyn StreamCacheStore>,
            Arc::clone(&self.catalog) as Arc<dyn CatalogStore>,
            Arc::new(pipeline),
            Arc::clone(&self.registry),
        )
    }

    /// Catalog movie `id` with imdb id `tt{id}` and one cached 1080p candidate.
    async fn add_cached_movie(&self, id: i64) {
        let imdb_id = format!("tt{}", id);
        let hash = fixtures::hash(id as u32);
        self.catalog.add_movie(id, "Movie", Some(&imdb_id));
        self.provider
            .set_streams(
                &imdb_id,
                vec![fixtures::candidate("Movie.1080p.WEB-DL", &hash)],
            )
            .await;
        self.debrid.add_cached(&[hash]).await;
    }
}

#[tokio::test]
async fn test_backfill_caches_every_page() {
    let h = TestHarness::new();
    for id in 1..=5 {
        h.add_cached_movie(id).await;
    }
    let config = ScannerConfig {
        page_size: 2,
        ..fast_config()
    };

    let report = h
        .scanner(config)
        .run_once(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.movies.processed, 5);
    assert_eq!(report.movies.cached, 5);
    assert_eq!(report.errors(), 0);
    for id in 1..=5 {
        let record = h.store.get_cached_stream(&ContentKey::movie(id)).unwrap();
        assert!(record.is_some(), "movie {} not cached", id);
    }
    assert_eq!(h.provider.request_count().await, 5);
}

#[tokio::test]
async fn test_items_without_external_id_are_skipped() {
    let h = TestHarness::new();
    h.add_cached_movie(1).await;
    h.catalog.add_movie(2, "Home Video", None);
    h.catalog.add_movie(3, "Blank Id", Some("  "));

    let report = h
        .scanner(fast_config())
        .run_once(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.movies.processed, 3);
    assert_eq!(report.movies.cached, 1);
    assert_eq!(report.movies.skipped, 2);
    assert_eq!(h.provider.request_count().await, 1);
}

#[tokio::test]
async fn test_series_sample_first_episode() {
    let h = TestHarness::new();
    h.catalog.add_series(9, "Show", Some("tt9"));
    h.provider
        .set_streams(
            "tt9",
            vec![fixtures::candidate("Show.S01E01.1080p.WEB-DL", &fixtures::hash(9))],
        )
        .await;
    h.debrid.set_cached(&[fixtures::hash(9)]).await;

    let report = h
        .scanner(fast_config())
        .run_once(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.series.cached, 1);
    let requests = h.provider.recorded_requests().await;
    assert_eq!(requests[0].season, Some(1));
    assert_eq!(requests[0].episode, Some(1));
    assert!(h
        .store
        .get_cached_stream(&ContentKey::episode(9, 1, 1))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_series_can_be_disabled() {
    let h = TestHarness::new();
    h.catalog.add_series(9, "Show", Some("tt9"));
    let config = ScannerConfig {
        scan_series: false,
        ..fast_config()
    };

    let report = h
        .scanner(config)
        .run_once(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.series.processed, 0);
    assert_eq!(h.provider.request_count().await, 0);
}

#[tokio::test]
async fn test_rescan_never_downgrades() {
    let h = TestHarness::new();
    h.catalog.add_movie(1, "Movie", Some("tt1"));
    let key = ContentKey::movie(1);
    h.store
        .cache_stream(&key, &fixtures::new_stream("Movie.2160p.BluRay.REMUX", &fixtures::hash(1)))
        .unwrap();
    h.provider
        .set_streams(
            "tt1",
            vec![
                fixtures::candidate("Movie.1080p.WEB-DL", &fixtures::hash(2)),
                fixtures::candidate("Movie.720p.BluRay", &fixtures::hash(3)),
            ],
        )
        .await;
    h.debrid
        .set_cached(&[fixtures::hash(2), fixtures::hash(3)])
        .await;

    let report = h
        .scanner(fast_config())
        .run_once(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.movies.unchanged, 1);
    let record = h.store.get_cached_stream(&key).unwrap().unwrap();
    assert_eq!(record.resolution, Resolution::R2160p);
    assert_eq!(record.stream_hash, fixtures::hash(1));
    assert!(h.debrid.resolved_hashes().await.is_empty());
}

#[tokio::test]
async fn test_rescan_applies_better_stream() {
    let h = TestHarness::new();
    h.catalog.add_movie(1, "Movie", Some("tt1"));
    let key = ContentKey::movie(1);
    h.store
        .cache_stream(&key, &fixtures::new_stream("Movie.720p.WEB-DL", &fixtures::hash(1)))
        .unwrap();
    h.provider
        .set_streams(
            "tt1",
            vec![fixtures::candidate("Movie.1080p.BluRay", &fixtures::hash(2))],
        )
        .await;
    h.debrid.set_cached(&[fixtures::hash(2)]).await;

    let item = h.catalog.get_content(ContentKind::Movie, 1).unwrap().unwrap();
    let outcome = h.scanner(fast_config()).scan_item(&item).await.unwrap();

    assert_eq!(outcome, ItemOutcome::Upgraded);
    let record = h.store.get_cached_stream(&key).unwrap().unwrap();
    assert_eq!(record.stream_hash, fixtures::hash(2));
}

#[tokio::test]
async fn test_rescan_keeps_same_torrent_with_more_seeders() {
    let h = TestHarness::new();
    h.catalog.add_movie(1, "Movie", Some("tt1"));
    let key = ContentKey::movie(1);
    h.store
        .cache_stream(&key, &fixtures::new_stream("Movie.1080p.WEB-DL", &fixtures::hash(1)))
        .unwrap();
    let before = h.store.get_cached_stream(&key).unwrap().unwrap();
    h.provider
        .set_streams(
            "tt1",
            vec![debridarr_core::StreamCandidate {
                seeders: 25,
                ..fixtures::candidate("Movie.1080p.WEB-DL", &fixtures::hash(1))
            }],
        )
        .await;
    h.debrid.set_cached(&[fixtures::hash(1)]).await;

    let item = h.catalog.get_content(ContentKind::Movie, 1).unwrap().unwrap();
    let outcome = h.scanner(fast_config()).scan_item(&item).await.unwrap();

    assert_eq!(outcome, ItemOutcome::Unchanged);
    assert!(h.debrid.resolved_hashes().await.is_empty());
    let record = h.store.get_cached_stream(&key).unwrap().unwrap();
    assert_eq!(record.quality_score, before.quality_score);
    assert_eq!(record.cached_at, before.cached_at);
    assert_eq!(record.updated_at, before.updated_at);
}

#[tokio::test]
async fn test_unavailable_record_is_refilled() {
    let h = TestHarness::new();
    h.add_cached_movie(1).await;
    let key = ContentKey::movie(1);
    h.store
        .cache_stream(&key, &fixtures::new_stream("Movie.2160p.BluRay.REMUX", &fixtures::hash(99)))
        .unwrap();
    h.store.mark_unavailable(&key).unwrap();

    let item = ContentRef {
        kind: ContentKind::Movie,
        id: 1,
        title: "Movie".to_string(),
        imdb_id: Some("tt1".to_string()),
        year: None,
    };
    let outcome = h.scanner(fast_config()).scan_item(&item).await.unwrap();

    assert_eq!(outcome, ItemOutcome::Cached);
    let record = h.store.get_cached_stream(&key).unwrap().unwrap();
    assert!(record.is_available);
    assert_eq!(record.resolution, Resolution::R1080p);
}

#[tokio::test]
async fn test_item_errors_are_counted_and_backed_off() {
    let h = TestHarness::new();
    h.add_cached_movie(1).await;
    h.add_cached_movie(2).await;
    h.add_cached_movie(3).await;
    h.provider.fail_for("tt2", ProviderError::RateLimited).await;
    let config = ScannerConfig {
        rate_limit_backoff_ms: 200,
        ..fast_config()
    };

    let started = Instant::now();
    let report = h
        .scanner(config)
        .run_once(&CancellationToken::new())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(report.movies.processed, 3);
    assert_eq!(report.movies.cached, 2);
    assert_eq!(report.movies.errors, 1);
    assert!(h
        .store
        .get_cached_stream(&ContentKey::movie(2))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_catalog_failure_aborts_pass() {
    let h = TestHarness::new();
    h.add_cached_movie(1).await;
    h.catalog.set_failing(true);
    let scanner = h.scanner(fast_config());
    scanner.register().await;

    let result = scanner.run_once(&CancellationToken::new()).await;

    assert!(matches!(result, Err(JobError::Catalog(_))));
    let status = h.registry.status(BACKFILL_JOB).await.unwrap();
    assert!(status.last_error.is_some());
}

#[tokio::test]
async fn test_cancellation_stops_between_items() {
    let h = TestHarness::new();
    for id in 1..=3 {
        h.add_cached_movie(id).await;
    }
    h.provider.fail_for("tt1", ProviderError::Timeout).await;
    let config = ScannerConfig {
        error_backoff_ms: 60_000,
        ..fast_config()
    };
    let scanner = Arc::new(h.scanner(config));
    let cancel = CancellationToken::new();

    let run = {
        let scanner = Arc::clone(&scanner);
        let cancel = cancel.clone();
        tokio::spawn(async move { scanner.run_once(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("backfill did not stop")
        .unwrap();
    assert!(matches!(result, Err(JobError::Cancelled)));
    assert_eq!(h.provider.request_count().await, 1);
    assert!(!scanner.is_running());
}

#[tokio::test]
async fn test_registry_tracks_pass() {
    let h = TestHarness::new();
    for id in 1..=4 {
        h.add_cached_movie(id).await;
    }
    let config = ScannerConfig {
        progress_every: 2,
        ..fast_config()
    };
    let scanner = h.scanner(config);
    scanner.register().await;

    scanner.run_once(&CancellationToken::new()).await.unwrap();

    let status = h.registry.status(BACKFILL_JOB).await.unwrap();
    assert_eq!(status.run_count, 1);
    assert!(!status.running);
    assert!(status.last_error.is_none());
    assert!(status.next_run.is_some());
    // Progress counters reset once the pass completes.
    assert_eq!(status.progress, 0);
    assert_eq!(status.items_processed, 0);
    assert_eq!(status.interval, "1 day");
}
