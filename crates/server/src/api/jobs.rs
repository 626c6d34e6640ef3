//! Background job status handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use debridarr_core::JobStatus;

use super::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobStatus>,
}

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: state.registry().all().await,
    })
}

/// GET /api/v1/jobs/{name}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state.registry().status(&name).await.map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown job: {}", name),
            }),
        )
    })
}
