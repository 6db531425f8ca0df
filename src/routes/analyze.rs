use std::str::FromStr;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::analysis::AnalysisMode;
use crate::models::job::UploadedImage;
use crate::routes::{api_failure, ApiFailure};

/// Per-job upload cap.
pub const MAX_IMAGES_PER_JOB: usize = 50;

/// Per-image size cap: 10 MB.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Submit metadata fields (everything except the files themselves).
#[derive(Debug, Default, Validate)]
pub struct SubmitMetadata {
    #[garde(length(min = 1, max = 200))]
    pub analysis_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub queue_position: usize,
    pub message: String,
}

/// POST /api/analyze — upload a batch of images for analysis.
///
/// Validation happens synchronously; a job is only created once every file
/// and field has passed.
pub async fn submit_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiFailure> {
    let mut images: Vec<UploadedImage> = Vec::new();
    let mut mode_field: Option<String> = None;
    let mut name_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_failure(StatusCode::BAD_REQUEST, format!("Malformed upload: {e}")))?
    {
        // `bytes`/`text` consume the field, so pull the metadata out first.
        let field_name = field.name().map(str::to_string);

        match field_name.as_deref() {
            Some("images") => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "unnamed".to_string());

                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_default();
                if !content_type.starts_with("image/") {
                    return Err(api_failure(
                        StatusCode::BAD_REQUEST,
                        format!(
                            "Only image files are allowed ('{original_name}' is {content_type:?})"
                        ),
                    ));
                }

                let data = field.bytes().await.map_err(|e| {
                    api_failure(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read upload '{original_name}': {e}"),
                    )
                })?;

                if data.len() > MAX_IMAGE_BYTES {
                    return Err(api_failure(
                        StatusCode::BAD_REQUEST,
                        "File too large. Maximum size is 10MB.",
                    ));
                }

                // Content sniff: the bytes must actually be a known image
                // format, not just carry an image/* content type.
                image::guess_format(&data).map_err(|_| {
                    api_failure(
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        format!("'{original_name}' is not a recognized image format"),
                    )
                })?;

                if images.len() == MAX_IMAGES_PER_JOB {
                    return Err(api_failure(
                        StatusCode::BAD_REQUEST,
                        format!("Too many images; the limit is {MAX_IMAGES_PER_JOB} per job"),
                    ));
                }

                images.push(UploadedImage {
                    original_name,
                    content_type,
                    bytes: data.to_vec(),
                });
            }
            Some("analysis_mode") => {
                mode_field = Some(field.text().await.map_err(|e| {
                    api_failure(StatusCode::BAD_REQUEST, format!("Malformed upload: {e}"))
                })?);
            }
            Some("analysis_name") => {
                let text = field.text().await.map_err(|e| {
                    api_failure(StatusCode::BAD_REQUEST, format!("Malformed upload: {e}"))
                })?;
                if !text.is_empty() {
                    name_field = Some(text);
                }
            }
            _ => {}
        }
    }

    if images.is_empty() {
        return Err(api_failure(StatusCode::BAD_REQUEST, "No images uploaded"));
    }

    let mode = match mode_field.as_deref() {
        None => AnalysisMode::SearchBasic,
        Some(raw) => AnalysisMode::from_str(raw).map_err(|_| {
            api_failure(
                StatusCode::BAD_REQUEST,
                format!("Unknown analysis mode '{raw}'"),
            )
        })?,
    };

    let metadata = SubmitMetadata {
        analysis_name: name_field,
    };
    metadata
        .validate()
        .map_err(|report| api_failure(StatusCode::BAD_REQUEST, report.to_string()))?;

    let receipt = state
        .queue
        .submit(images, mode, metadata.analysis_name)
        .await;

    let message = if receipt.queue_position == 1 {
        "Analysis started".to_string()
    } else {
        format!("Analysis queued at position {}", receipt.queue_position)
    };

    Ok(Json(SubmitResponse {
        success: true,
        job_id: receipt.job_id,
        queue_position: receipt.queue_position,
        message,
    }))
}
