use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::job::JobSummary;
use crate::routes::{api_failure, ApiFailure};
use crate::services::queue::QueueError;

#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub queue: Vec<JobSummary>,
    pub is_processing: bool,
    pub queue_length: usize,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub success: bool,
    pub message: String,
}

/// GET /api/queue — live job summaries plus the global busy flag.
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatusResponse> {
    let snapshot = state.queue.list().await;
    Json(QueueStatusResponse {
        queue: snapshot.jobs,
        is_processing: snapshot.is_processing,
        queue_length: snapshot.queue_length,
    })
}

/// DELETE /api/queue/{id} — remove a job unless it is currently processing.
pub async fn remove_from_queue(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<RemoveResponse>, ApiFailure> {
    match state.queue.remove(job_id).await {
        Ok(summary) => Ok(Json(RemoveResponse {
            success: true,
            message: format!("Analysis \"{}\" removed from queue", summary.name),
        })),
        Err(QueueError::NotFound(_)) => Err(api_failure(
            StatusCode::NOT_FOUND,
            "Analysis not found in queue",
        )),
        Err(QueueError::InProgress(_)) => Err(api_failure(
            StatusCode::CONFLICT,
            "Cannot remove analysis that is currently processing",
        )),
    }
}
