use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

pub mod analyses;
pub mod analyze;
pub mod auth;
pub mod health;
pub mod metrics;
pub mod queue;

/// JSON error body shared by every API route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiFailure = (StatusCode, Json<ErrorResponse>);

pub fn api_failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
