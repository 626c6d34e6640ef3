//! HTTP API tests against an in-process router with mocked collaborators.

mod common;

use axum::http::StatusCode;
use debridarr_core::{ContentKey, DebridError, StreamCacheStore};

use common::{fixtures, TestFixture};

// =============================================================================
// Health, config, metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_config_hides_api_key() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["debrid"]["api_key_configured"], true);
    assert_eq!(response.body["debrid"]["backend"], "real_debrid");
    assert!(response.body["debrid"].get("api_key").is_none());
    assert!(!response.text.contains("super-secret-key"));
    assert_eq!(response.body["checker"]["auto_upgrade"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_cache_gauges() {
    let fixture = TestFixture::new().await;
    fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("debridarr_cached_streams"));
    assert!(response.text.contains("debridarr_job_runs"));
    assert!(response.text.contains("debridarr_http_requests_total"));
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_list_jobs() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/jobs").await;

    assert_status!(response, StatusCode::OK);
    let jobs = response.body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["name"], "stream_checker");
    assert_eq!(jobs[0]["interval"], "1 hour");
    assert_eq!(jobs[0]["running"], false);
    assert_eq!(jobs[0]["run_count"], 0);
}

#[tokio::test]
async fn test_get_job() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/jobs/stream_checker").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["enabled"], true);

    let response = fixture.get("/api/v1/jobs/nope").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Unknown job: nope");
}

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn test_stats() {
    let fixture = TestFixture::new().await;
    fixture.seed_movie(1, "Movie.2160p.BluRay.REMUX.DV", &fixtures::hash(1));
    fixture.seed_movie(2, "Movie.1080p.WEB-DL", &fixtures::hash(2));
    let gone = fixture.seed_movie(3, "Movie.720p.HDTV", &fixtures::hash(3));
    fixture.store.mark_unavailable(&gone).unwrap();

    let response = fixture.get("/api/v1/streams/stats").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
    assert_eq!(response.body["available"], 2);
    assert_eq!(response.body["unavailable"], 1);
    assert_eq!(response.body["count_4k"], 1);
    assert_eq!(response.body["remux"], 1);
    assert_eq!(response.body["due_for_check"], 0);
    assert_eq!(response.body["checker_config"]["recheck_after_days"], 7);
}

#[tokio::test]
async fn test_list_unavailable() {
    let fixture = TestFixture::new().await;
    fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));
    let gone = fixture.seed_movie(2, "Movie.720p.HDTV", &fixtures::hash(2));
    fixture.store.mark_unavailable(&gone).unwrap();

    let response = fixture.get("/api/v1/streams/unavailable").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["streams"][0]["key"]["movie"], 2);
    assert_eq!(response.body["streams"][0]["is_available"], false);
}

#[tokio::test]
async fn test_list_upgrades() {
    let fixture = TestFixture::new().await;
    let key = fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));
    fixture.seed_movie(2, "Movie.1080p.WEB-DL", &fixtures::hash(2));
    fixture.store.mark_upgrade_available(&key, true).unwrap();

    let response = fixture.get("/api/v1/streams/upgrades?limit=10").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["streams"][0]["upgrade_available"], true);
}

#[tokio::test]
async fn test_list_low_quality() {
    let fixture = TestFixture::new().await;
    fixture.seed_movie(1, "Movie.2160p.WEB-DL", &fixtures::hash(1));
    fixture.seed_movie(2, "Movie.720p.HDTV", &fixtures::hash(2));
    fixture.seed_movie(3, "Movie.1080p.WEB-DL", &fixtures::hash(3));

    let response = fixture.get("/api/v1/streams/low-quality?max_score=100").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 2);
    // Lowest score first
    assert_eq!(response.body["streams"][0]["key"]["movie"], 2);
    assert_eq!(response.body["streams"][1]["key"]["movie"], 3);
}

#[tokio::test]
async fn test_low_quality_requires_max_score() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/streams/low-quality").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Single streams
// =============================================================================

#[tokio::test]
async fn test_get_movie_stream() {
    let fixture = TestFixture::new().await;
    fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));

    let response = fixture.get("/api/v1/streams/movie/1").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["resolution"], "1080p");
    assert_eq!(response.body["quality_score"], 100);
    assert_eq!(
        response.body["stream_url"],
        format!("https://debrid.example/dl/{}", fixtures::hash(1))
    );
}

#[tokio::test]
async fn test_missing_or_unavailable_stream_is_not_found() {
    let fixture = TestFixture::new().await;
    let key = fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));
    fixture.store.mark_unavailable(&key).unwrap();

    let response = fixture.get("/api/v1/streams/movie/1").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "No stream available for movie:1");

    let response = fixture.get("/api/v1/streams/movie/99").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_episode_stream() {
    let fixture = TestFixture::new().await;
    let key = ContentKey::episode(7, 2, 5);
    fixture
        .store
        .cache_stream(&key, &fixtures::new_stream("Show.S02E05.1080p.WEB-DL", &fixtures::hash(1)))
        .unwrap();

    let response = fixture.get("/api/v1/streams/series/7/2/5").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["key"]["episode"]["season"], 2);

    let response = fixture.get("/api/v1/streams/series/7/2/6").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "No stream available for series:7:S02E06");
}

#[tokio::test]
async fn test_episode_numbers_start_at_one() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/streams/series/7/0/1").await;
    assert_status!(response, StatusCode::BAD_REQUEST);

    let response = fixture.post("/api/v1/streams/series/7/1/0/check").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_applies_upgrade() {
    let fixture = TestFixture::new().await;
    fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));
    fixture
        .provider
        .set_streams(
            "tt1",
            vec![fixtures::candidate("Movie.2160p.WEB-DL", &fixtures::hash(2))],
        )
        .await;
    fixture
        .debrid
        .set_cached(&[fixtures::hash(1), fixtures::hash(2)])
        .await;

    let response = fixture.post("/api/v1/streams/movie/1/check").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcome"], "upgraded");
    assert_eq!(response.body["key"]["movie"], 1);

    let response = fixture.get("/api/v1/streams/movie/1").await;
    assert_eq!(response.body["resolution"], "2160p");
    assert_eq!(response.body["stream_hash"], fixtures::hash(2));
}

#[tokio::test]
async fn test_check_marks_expired_stream_unavailable() {
    let fixture = TestFixture::new().await;
    fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));

    let response = fixture.post("/api/v1/streams/movie/1/check").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["outcome"], "unavailable");

    let response = fixture.get("/api/v1/streams/movie/1").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_unknown_stream_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/v1/streams/movie/42/check").await;

    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_rate_limited_is_service_unavailable() {
    let fixture = TestFixture::new().await;
    let key = fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));
    fixture.debrid.fail_batch(0, DebridError::RateLimited).await;

    let response = fixture.post("/api/v1/streams/movie/1/check").await;

    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    let record = fixture.store.get_cached_stream(&key).unwrap().unwrap();
    assert!(record.is_available);
    assert_eq!(record.stream_hash, fixtures::hash(1));
}

#[tokio::test]
async fn test_delete_stream() {
    let fixture = TestFixture::new().await;
    let key = fixture.seed_movie(1, "Movie.1080p.WEB-DL", &fixtures::hash(1));

    let response = fixture.delete("/api/v1/streams/movie/1").await;
    assert_status!(response, StatusCode::OK);
    assert!(fixture.store.get_cached_stream(&key).unwrap().is_none());

    let response = fixture.delete("/api/v1/streams/movie/1").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}
