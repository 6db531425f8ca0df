//! Test helper utilities for E2E testing

use std::io::Cursor;
use std::time::Duration;

use image::{ImageFormat, Rgba, RgbaImage};
use reqwest::multipart;
use serde::Deserialize;
use tokio::time::sleep;
use uuid::Uuid;

/// Response from POST /api/analyze
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub queue_position: usize,
    pub message: String,
}

/// Response from GET /api/queue
#[derive(Debug, Deserialize)]
pub struct QueueStatusResponse {
    pub queue: Vec<QueueJob>,
    pub is_processing: bool,
    pub queue_length: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueueJob {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub image_count: usize,
}

/// One entry from GET /api/analyses
#[derive(Debug, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub name: String,
    pub image_count: usize,
    pub status: String,
}

/// Full record from GET /api/analyses/{id}
#[derive(Debug, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub name: Option<String>,
    pub results: Vec<ImageResult>,
    pub status: String,
    pub text_output: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageResult {
    pub original_filename: String,
    pub analysis: String,
    #[serde(default)]
    pub failed: bool,
}

/// Get base URL from env or default to localhost
pub fn base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client with a cookie store so the session survives across requests.
pub fn session_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("failed to build client")
}

/// Log in with the configured operator credentials.
pub async fn login(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("ADMIN_PASSWORD")?;

    let response = client
        .post(format!("{base_url}/login"))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(format!("Login failed with status {}", response.status()).into());
    }
    Ok(())
}

/// A real 1x1 PNG so the server's format sniff passes.
pub fn tiny_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(1, 1, Rgba([120, 80, 200, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("failed to encode test PNG");
    buf.into_inner()
}

/// Build and send a submit request with `count` copies of the tiny PNG.
pub async fn submit_images(
    client: &reqwest::Client,
    base_url: &str,
    count: usize,
    mode: &str,
    name: Option<&str>,
) -> Result<reqwest::Response, Box<dyn std::error::Error>> {
    let png = tiny_png();
    let mut form = multipart::Form::new();

    for i in 0..count {
        form = form.part(
            "images",
            multipart::Part::bytes(png.clone())
                .file_name(format!("test_image_{i}.png"))
                .mime_str("image/png")?,
        );
    }

    form = form.text("analysis_mode", mode.to_string());
    if let Some(name) = name {
        form = form.text("analysis_name", name.to_string());
    }

    Ok(client
        .post(format!("{base_url}/api/analyze"))
        .multipart(form)
        .send()
        .await?)
}

/// Poll the queue endpoint until it drains (with timeout).
pub async fn wait_for_queue_drain(
    client: &reqwest::Client,
    base_url: &str,
    timeout_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs * 2; // Poll every 500ms

    for attempt in 0..max_attempts {
        let status: QueueStatusResponse = client
            .get(format!("{base_url}/api/queue"))
            .send()
            .await?
            .json()
            .await?;

        if status.queue_length == 0 && !status.is_processing {
            return Ok(());
        }

        if attempt % 20 == 0 && attempt > 0 {
            println!(
                "  ... queue at {} job(s) (attempt {}/{})",
                status.queue_length, attempt, max_attempts
            );
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(format!("Queue did not drain within {timeout_secs} seconds").into())
}
