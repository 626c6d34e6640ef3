use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, middleware::metrics_middleware, streams};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Jobs
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{name}", get(jobs::get_job))
        // Cached streams
        .route("/streams/stats", get(streams::get_stats))
        .route("/streams/unavailable", get(streams::list_unavailable))
        .route("/streams/upgrades", get(streams::list_upgrades))
        .route("/streams/low-quality", get(streams::list_low_quality))
        .route(
            "/streams/movie/{id}",
            get(streams::get_movie_stream).delete(streams::delete_movie_stream),
        )
        .route("/streams/movie/{id}/check", post(streams::check_movie_stream))
        .route(
            "/streams/series/{id}/{season}/{episode}",
            get(streams::get_episode_stream).delete(streams::delete_episode_stream),
        )
        .route(
            "/streams/series/{id}/{season}/{episode}/check",
            post(streams::check_episode_stream),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
