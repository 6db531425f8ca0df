use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::job::JobStatus;

/// Which external API a mode routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Web-search-capable summarization API (Perplexity sonar).
    Search,
    /// Multimodal chat-completion API (OpenAI gpt-4o).
    Vision,
}

/// Analysis mode: provider plus verbosity tier, as a closed enum so invalid
/// combinations are unrepresentable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AnalysisMode {
    SearchBasic,
    SearchWithResearch,
    VisionStandard,
    VisionAdvanced,
}

impl AnalysisMode {
    pub fn provider(self) -> Provider {
        match self {
            Self::SearchBasic | Self::SearchWithResearch => Provider::Search,
            Self::VisionStandard | Self::VisionAdvanced => Provider::Vision,
        }
    }
}

/// Per-image analysis outcome. One per input image, input order preserved;
/// a failed provider call yields `failed: true` with placeholder text rather
/// than a missing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageResult {
    pub original_filename: String,
    pub analysis: String,
    #[serde(default)]
    pub failed: bool,
}

impl ImageResult {
    /// Placeholder report emitted when a provider call fails, so consumers
    /// can always pair inputs to outputs by position.
    pub fn failure_placeholder(original_filename: &str) -> Self {
        Self {
            original_filename: original_filename.to_string(),
            analysis: format!(
                "**Original:** {original_filename}\n\
                 **Error:** Unable to process this image\n\
                 **Description:** Error occurred during analysis\n\
                 **Website Usage:** N/A\n\
                 **Professional Assessment:** Could not assess due to processing error"
            ),
            failed: true,
        }
    }
}

/// The persisted outcome of a job. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub mode: AnalysisMode,
    pub results: Vec<ImageResult>,
    pub status: JobStatus,
    pub text_output: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Listing shape of a persisted record; `id` is the storage key.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub image_count: usize,
    pub status: JobStatus,
}

const TEXT_OUTPUT_HEADER: &str = "Added the folder to the project with images in it. \
use the below to rename the images and put them in relevant spots on the site. \
Replace images and adjust content as necessary. Ensure you move the images to the \
proper location within the project so they show up\n\n";

/// Combined text output for a record: fixed instruction header followed by
/// every per-image analysis joined with a labeled separator.
pub fn combined_text_output(results: &[ImageResult]) -> String {
    let body = results
        .iter()
        .map(|r| r.analysis.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!("{TEXT_OUTPUT_HEADER}{body}")
}
