use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::analysis::{AnalysisRecord, RecordSummary};
use crate::routes::{api_failure, ApiFailure};
use crate::services::store::StoreError;

/// GET /api/analyses — persisted record summaries from the last 24 hours.
pub async fn list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecordSummary>>, ApiFailure> {
    let summaries = state.store.list_recent().await.map_err(|e| {
        tracing::error!(error = %e, "failed to list analysis records");
        api_failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get analyses")
    })?;

    Ok(Json(summaries))
}

/// GET /api/analyses/{id} — the full persisted record.
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisRecord>, ApiFailure> {
    match state.store.get(&id).await {
        Ok(record) => Ok(Json(record)),
        Err(StoreError::NotFound(_)) => {
            Err(api_failure(StatusCode::NOT_FOUND, "Analysis not found"))
        }
        Err(e) => {
            tracing::error!(key = %id, error = %e, "failed to read analysis record");
            Err(api_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get analysis",
            ))
        }
    }
}
