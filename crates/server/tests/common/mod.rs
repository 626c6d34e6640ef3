//! Common test utilities for API testing with mocks.
//!
//! Builds an in-process router over a temporary SQLite store, with the
//! stream provider, debrid service and library catalog replaced by mocks.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use debridarr_core::{
    testing::{MockCatalog, MockDebrid, MockProvider},
    config::DatabaseConfig,
    AvailabilityFilter, CatalogStore, CheckerConfig, Config, ContentKey,
    DebridService, JobRegistry, SqliteStreamCacheStore, StreamCacheStore, StreamChecker,
    StreamPipeline, StreamProvider, StreamSelector,
};

/// Re-export fixtures for test convenience
pub use debridarr_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_movie_stream() {
///     let fixture = TestFixture::new().await;
///     fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));
///
///     let response = fixture.get("/api/v1/streams/movie/1").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Stream cache backing the router
    pub store: Arc<SqliteStreamCacheStore>,
    /// Mock library catalog
    pub catalog: Arc<MockCatalog>,
    /// Mock stream provider - configure candidates per IMDb id
    pub provider: Arc<MockProvider>,
    /// Mock debrid service - control which hashes are cached
    pub debrid: Arc<MockDebrid>,
    /// Job registry shared with the checker
    pub registry: Arc<JobRegistry>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            ..Default::default()
        };
        config.debrid.api_key = "super-secret-key".to_string();

        let store = Arc::new(
            SqliteStreamCacheStore::new(&db_path).expect("Failed to create stream store"),
        );
        let catalog = Arc::new(MockCatalog::new());
        let provider = Arc::new(MockProvider::new());
        let debrid = Arc::new(MockDebrid::new());
        let registry = Arc::new(JobRegistry::new());

        let filter = AvailabilityFilter::new(
            Arc::clone(&debrid) as Arc<dyn DebridService>,
            100,
            Duration::from_secs(5),
        );
        let pipeline = StreamPipeline::new(
            Arc::clone(&provider) as Arc<dyn StreamProvider>,
            filter,
            StreamSelector::default(),
            true,
        );
        let checker = Arc::new(StreamChecker::new(
            CheckerConfig::default(),
            Arc::clone(&store) as Arc<dyn StreamCacheStore>,
            Arc::clone(&catalog) as Arc<dyn CatalogStore>,
            Arc::new(pipeline),
            Arc::clone(&registry),
        ));
        checker.register().await;

        let state = Arc::new(debridarr_server::state::AppState::new(
            config,
            Arc::clone(&store) as Arc<dyn StreamCacheStore>,
            Arc::clone(&registry),
            checker,
        ));
        let router = debridarr_server::api::create_router(state);

        Self {
            router,
            store,
            catalog,
            provider,
            debrid,
            registry,
            temp_dir,
        }
    }

    /// Add a catalog movie with a cached stream parsed from `title`.
    pub fn seed_movie(&self, id: i64, title: &str, hash: &str) -> ContentKey {
        let imdb_id = format!("tt{}", id);
        self.catalog.add_movie(id, "Movie", Some(imdb_id.as_str()));
        let key = ContentKey::movie(id);
        self.store
            .cache_stream(&key, &fixtures::new_stream(title, hash))
            .expect("Failed to seed stream");
        key
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
