use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::analysis::AnalysisMode;

/// Status of an analysis job in the queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// One uploaded image, held in memory until its job is processed.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A queued batch of images awaiting or undergoing analysis.
///
/// Mutated only by the queue worker; the images live behind an `Arc` so the
/// worker can take a cheap copy of the head job without cloning image bytes.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub id: Uuid,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub mode: AnalysisMode,
    pub images: Arc<Vec<UploadedImage>>,
    pub status: JobStatus,
    pub error: Option<String>,
}

impl AnalysisJob {
    pub fn new(images: Vec<UploadedImage>, mode: AnalysisMode, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
            mode,
            images: Arc::new(images),
            status: JobStatus::Queued,
            error: None,
        }
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            name: self
                .name
                .clone()
                .unwrap_or_else(|| "Unnamed Analysis".to_string()),
            status: self.status,
            image_count: self.images.len(),
            created_at: self.created_at,
        }
    }
}

/// The queue-listing shape of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub name: String,
    pub status: JobStatus,
    pub image_count: usize,
    pub created_at: DateTime<Utc>,
}
