//! Cached stream API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use debridarr_core::{
    CachedStreamRecord, CheckOutcome, CheckerStats, ContentKey, JobError, StreamCacheError,
};

use super::handlers::{internal_error, ApiError, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct LowQualityParams {
    pub max_score: i32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Serialize)]
pub struct StreamListResponse {
    pub streams: Vec<CachedStreamRecord>,
    pub total: usize,
}

impl From<Vec<CachedStreamRecord>> for StreamListResponse {
    fn from(streams: Vec<CachedStreamRecord>) -> Self {
        let total = streams.len();
        Self { streams, total }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub key: ContentKey,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

fn no_stream(key: &ContentKey) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No stream available for {}", key),
        }),
    )
}

fn episode_key(series_id: i64, season: u32, episode: u32) -> Result<ContentKey, ApiError> {
    let key = ContentKey::episode(series_id, season, episode);
    if key.is_valid() {
        Ok(key)
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Season and episode are numbered from 1".to_string(),
            }),
        ))
    }
}

// ============================================================================
// Listing handlers
// ============================================================================

/// GET /api/v1/streams/stats
///
/// Store totals plus the checker policy.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckerStats>, ApiError> {
    state.checker().stats().map(Json).map_err(internal_error)
}

/// GET /api/v1/streams/unavailable
pub async fn list_unavailable(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<StreamListResponse>, ApiError> {
    state
        .store()
        .unavailable(params.limit)
        .map(|streams| Json(streams.into()))
        .map_err(internal_error)
}

/// GET /api/v1/streams/upgrades
///
/// Streams flagged with an advisory upgrade.
pub async fn list_upgrades(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<StreamListResponse>, ApiError> {
    state
        .store()
        .with_upgrades_available(params.limit)
        .map(|streams| Json(streams.into()))
        .map_err(internal_error)
}

/// GET /api/v1/streams/low-quality?max_score=N
pub async fn list_low_quality(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LowQualityParams>,
) -> Result<Json<StreamListResponse>, ApiError> {
    state
        .store()
        .by_quality_score(params.max_score, params.limit)
        .map(|streams| Json(streams.into()))
        .map_err(internal_error)
}

// ============================================================================
// Single-item handlers
// ============================================================================

fn get_available(state: &AppState, key: ContentKey) -> Result<Json<CachedStreamRecord>, ApiError> {
    match state.store().get_cached_stream(&key) {
        Ok(Some(record)) if record.is_available => Ok(Json(record)),
        Ok(_) => Err(no_stream(&key)),
        Err(e) => Err(internal_error(e)),
    }
}

async fn check_now(state: &AppState, key: ContentKey) -> Result<Json<CheckResponse>, ApiError> {
    match state.checker().check_item(&key).await {
        Ok(outcome) => {
            info!(key = %key, outcome = outcome.as_str(), "Manual check completed");
            Ok(Json(CheckResponse { key, outcome }))
        }
        Err(JobError::Store(StreamCacheError::NotFound(_))) => Err(no_stream(&key)),
        Err(e) if e.is_rate_limited() => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

fn delete_stream(state: &AppState, key: ContentKey) -> Result<Json<SuccessResponse>, ApiError> {
    match state.store().delete(&key) {
        Ok(true) => {
            info!(key = %key, "Cached stream deleted");
            Ok(Json(SuccessResponse {
                message: format!("Deleted cached stream for {}", key),
            }))
        }
        Ok(false) => Err(no_stream(&key)),
        Err(e) => Err(internal_error(e)),
    }
}

/// GET /api/v1/streams/movie/{id}
///
/// The current stream of a movie. Missing and unavailable streams are both 404.
pub async fn get_movie_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CachedStreamRecord>, ApiError> {
    get_available(&state, ContentKey::movie(id))
}

/// POST /api/v1/streams/movie/{id}/check
pub async fn check_movie_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CheckResponse>, ApiError> {
    check_now(&state, ContentKey::movie(id)).await
}

/// DELETE /api/v1/streams/movie/{id}
pub async fn delete_movie_stream(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    delete_stream(&state, ContentKey::movie(id))
}

/// GET /api/v1/streams/series/{id}/{season}/{episode}
pub async fn get_episode_stream(
    State(state): State<Arc<AppState>>,
    Path((id, season, episode)): Path<(i64, u32, u32)>,
) -> Result<Json<CachedStreamRecord>, ApiError> {
    get_available(&state, episode_key(id, season, episode)?)
}

/// POST /api/v1/streams/series/{id}/{season}/{episode}/check
pub async fn check_episode_stream(
    State(state): State<Arc<AppState>>,
    Path((id, season, episode)): Path<(i64, u32, u32)>,
) -> Result<Json<CheckResponse>, ApiError> {
    check_now(&state, episode_key(id, season, episode)?).await
}

/// DELETE /api/v1/streams/series/{id}/{season}/{episode}
pub async fn delete_episode_stream(
    State(state): State<Arc<AppState>>,
    Path((id, season, episode)): Path<(i64, u32, u32)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    delete_stream(&state, episode_key(id, season, episode)?)
}
