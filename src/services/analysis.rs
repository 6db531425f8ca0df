use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::models::analysis::{AnalysisMode, Provider};
use crate::models::job::UploadedImage;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

const OPENAI_MODEL: &str = "gpt-4o";
const SONAR_MODEL: &str = "sonar";
const SONAR_RESEARCH_MODEL: &str = "sonar-pro";

/// Anything that can turn an uploaded image into an analysis report.
///
/// The production implementation is [`AnalysisClient`]; tests substitute a
/// scripted analyzer so the processor and queue can run without network
/// access.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image: &UploadedImage, mode: AnalysisMode) -> Result<String, ApiError>;
}

/// Client for the two external vision-analysis providers.
pub struct AnalysisClient {
    http: Client,
    openai_api_key: String,
    perplexity_api_key: String,
}

/// Response shape shared by both providers (OpenAI-compatible chat API).
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl AnalysisClient {
    pub fn new(openai_api_key: String, perplexity_api_key: String) -> Self {
        Self {
            http: Client::new(),
            openai_api_key,
            perplexity_api_key,
        }
    }

    /// Send a vision request to the OpenAI chat-completion API with the image
    /// embedded as a data URL.
    async fn analyze_vision(
        &self,
        image: &UploadedImage,
        advanced: bool,
    ) -> Result<String, ApiError> {
        let prompt = if advanced {
            advanced_report_prompt(&image.original_name)
        } else {
            field_report_prompt(&image.original_name)
        };

        let request_body = serde_json::json!({
            "model": OPENAI_MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": { "url": data_url(image), "detail": "high" }
                    }
                ]
            }],
            "max_tokens": if advanced { 500 } else { 300 }
        });

        let response = self
            .http
            .post(OPENAI_API_URL)
            .bearer_auth(&self.openai_api_key)
            .json(&request_body)
            .send()
            .await?;

        extract_content("openai", response).await
    }

    /// Send a summarization request to the Perplexity API. The image is
    /// optional: the follow-up research call is text-only.
    async fn call_perplexity(
        &self,
        prompt: &str,
        image: Option<&UploadedImage>,
        web_search: bool,
    ) -> Result<String, ApiError> {
        let content = match image {
            Some(image) => serde_json::json!([
                { "type": "text", "text": prompt },
                { "type": "image_url", "image_url": { "url": data_url(image) } }
            ]),
            None => serde_json::json!(prompt),
        };

        let model = if web_search {
            SONAR_RESEARCH_MODEL
        } else {
            SONAR_MODEL
        };

        // `stream: false` is required by the Perplexity API.
        let request_body = serde_json::json!({
            "model": model,
            "stream": false,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": 400,
            "temperature": 0.2,
            "top_p": 0.9
        });

        let response = self
            .http
            .post(PERPLEXITY_API_URL)
            .bearer_auth(&self.perplexity_api_key)
            .json(&request_body)
            .send()
            .await?;

        extract_content("perplexity", response).await
    }

    async fn analyze_search(
        &self,
        image: &UploadedImage,
        with_research: bool,
    ) -> Result<String, ApiError> {
        let prompt = field_report_prompt(&image.original_name);

        if !with_research {
            return self.call_perplexity(&prompt, Some(image), false).await;
        }

        let image_analysis = self.call_perplexity(&prompt, Some(image), false).await?;
        let web_research = self
            .call_perplexity(&research_prompt(&image_analysis), None, true)
            .await?;

        Ok(format!(
            "{image_analysis}\n\n**Web Research & Trends:**\n{web_research}"
        ))
    }
}

#[async_trait]
impl ImageAnalyzer for AnalysisClient {
    async fn analyze(&self, image: &UploadedImage, mode: AnalysisMode) -> Result<String, ApiError> {
        match mode.provider() {
            Provider::Search => {
                self.analyze_search(image, mode == AnalysisMode::SearchWithResearch)
                    .await
            }
            Provider::Vision => {
                self.analyze_vision(image, mode == AnalysisMode::VisionAdvanced)
                    .await
            }
        }
    }
}

fn data_url(image: &UploadedImage) -> String {
    format!(
        "data:{};base64,{}",
        image.content_type,
        base64::engine::general_purpose::STANDARD.encode(&image.bytes)
    )
}

/// Pull the first choice's message text out of a chat-completion response,
/// converting non-2xx statuses and empty bodies into typed errors.
async fn extract_content(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<String, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            provider,
            status,
            body,
        });
    }

    let parsed: ChatCompletionResponse = response.json().await?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(ApiError::EmptyResponse { provider })?;

    Ok(choice.message.content.trim().to_string())
}

// The screenshot/UI-chrome wording below is a content-level contract: both
// providers must flag screenshots and images with visible UI elements as
// unsuitable for professional website use.

fn field_report_prompt(original_name: &str) -> String {
    format!(
        "Analyze this image with the original filename \"{original_name}\". \
Provide a detailed analysis in the following format:\n\n\
**Original:** {original_name}\n\
**Suggested:** [new descriptive filename with extension]\n\
**Description:** [Detailed description of what the image shows - be very specific about \
elements, colors, layout, text, UI components, etc.]\n\
**Website Usage:** [Explain where and how this could be used on a website - hero section, \
about page, product gallery, blog post, etc.]\n\
**Professional Assessment:** [State whether this image is suitable for professional website \
use or if it has issues like being blurry, poorly cropped, unprofessional lighting, etc. \
IMPORTANT: If this appears to be a screenshot, has visible UI elements (browser bars, \
desktop elements, app interfaces), or looks like it needs cropping to remove unwanted \
parts, mark it as NOT suitable for website use. Screenshots and images with extraneous UI \
elements are unprofessional for website use. Be honest about quality.]\n\n\
Focus on creating meaningful, SEO-friendly filenames that describe both the content and \
potential use case. Pay special attention to identifying screenshots or images with \
extraneous elements."
    )
}

fn advanced_report_prompt(original_name: &str) -> String {
    format!(
        "Analyze this image with the original filename \"{original_name}\". \
Provide an ultra-detailed professional analysis in the following format:\n\n\
**Original:** {original_name}\n\
**Suggested:** [new descriptive filename with extension - include technical context]\n\
**Description:** [Extremely detailed description including specific UI elements, \
typography, color schemes, layout patterns, brand elements, etc.]\n\
**Technical Specs:** [Image dimensions if visible, file format recommendations, \
compression suggestions, resolution assessment]\n\
**Website Suitability Assessment:** [CRITICAL EVALUATION: Should this image be used on a \
website at all? Check for: sensitive/confidential information, personal data, \
inappropriate content, unprofessional elements, poor image quality, copyright concerns, \
or anything that could harm brand reputation. ESPECIALLY IMPORTANT: If this appears to be \
a screenshot, has visible UI elements (browser bars, desktop elements, app interfaces, \
window frames, taskbars), or looks like it needs cropping to remove unwanted parts, mark \
it as NOT suitable for website use. Screenshots and images with extraneous UI elements \
are unprofessional for website use. Be brutally honest - if it shouldn't be used, clearly \
state WHY NOT.]\n\
**Website Usage:** [Only if suitable for web use - Multiple specific use cases with \
detailed placement recommendations - hero sections, landing pages, product showcases, \
blog headers, social media, etc.]\n\
**SEO Considerations:** [Alt text suggestions, semantic meaning, keyword opportunities]\n\
**Accessibility Assessment:** [Color contrast, readability, accessibility concerns, \
screen reader considerations]\n\
**Professional Assessment:** [Comprehensive quality evaluation including composition, \
lighting, technical quality, brand consistency, and specific improvement \
recommendations]\n\
**Content Strategy:** [How this image fits into broader content marketing, user \
experience considerations, conversion potential]\n\n\
Focus on creating highly optimized, contextual filenames that serve both technical and \
marketing purposes."
    )
}

fn research_prompt(image_analysis: &str) -> String {
    format!(
        "Based on this image analysis: \"{image_analysis}\", research current web design \
trends, similar successful implementations, and industry best practices. Provide \
additional insights about:\n\
- Current design trends that match this style\n\
- Similar implementations on popular websites\n\
- Modern naming conventions for this type of content\n\
- Industry-specific recommendations"
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} API returned a response with no choices")]
    EmptyResponse { provider: &'static str },
}
