//! End-to-end tests against a running server
//!
//! These tests require:
//! 1. The image-namer server running on the configured port
//! 2. OPENAI_API_KEY / PERPLEXITY_API_KEY configured on the server
//! 3. ADMIN_PASSWORD (and optionally ADMIN_USERNAME) set in this process's
//!    environment, matching the server's credentials
//!
//! Run with: cargo test --test e2e_test -- --ignored --nocapture
//!
//! Set API_BASE_URL to override the default (http://localhost:3000)

mod helpers;

use helpers::*;

#[tokio::test]
#[ignore] // Requires a running server
async fn test_e2e_health_check() {
    let base_url = base_url();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Health check request failed");

    assert!(
        response.status().is_success(),
        "Health check returned non-success status: {}",
        response.status()
    );

    println!("✓ Health check passed");
}

#[tokio::test]
#[ignore] // Requires a running server
async fn test_e2e_unauthenticated_requests_rejected() {
    let base_url = base_url();
    let client = reqwest::Client::new();

    for path in ["/api/queue", "/api/analyses"] {
        let response = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Request failed");

        assert_eq!(
            response.status(),
            reqwest::StatusCode::UNAUTHORIZED,
            "{path} should require authentication"
        );
    }

    println!("✓ Unauthenticated requests properly rejected");
}

#[tokio::test]
#[ignore] // Requires a running server with provider credentials
async fn test_e2e_login_submit_and_fetch_record() {
    let base_url = base_url();
    let client = session_client();

    login(&client, &base_url).await.expect("Login failed");
    println!("✓ Logged in");

    let response = submit_images(&client, &base_url, 2, "vision-standard", Some("e2e run"))
        .await
        .expect("Submit request failed");
    assert!(
        response.status().is_success(),
        "Submit failed with status {}",
        response.status()
    );

    let submit: SubmitResponse = response.json().await.expect("Bad submit response");
    assert!(submit.success);
    assert!(submit.queue_position >= 1);
    println!("✓ Submitted job {} ({})", submit.job_id, submit.message);

    wait_for_queue_drain(&client, &base_url, 120)
        .await
        .expect("Queue did not drain");
    println!("✓ Queue drained");

    let summaries: Vec<RecordSummary> = client
        .get(format!("{base_url}/api/analyses"))
        .send()
        .await
        .expect("List request failed")
        .json()
        .await
        .expect("Bad list response");

    let summary = summaries
        .iter()
        .find(|s| s.name == "e2e run")
        .expect("Submitted analysis not in recent records");
    assert_eq!(summary.image_count, 2);
    assert_eq!(summary.status, "completed");

    let record: AnalysisRecord = client
        .get(format!("{base_url}/api/analyses/{}", summary.id))
        .send()
        .await
        .expect("Get record request failed")
        .json()
        .await
        .expect("Bad record response");

    assert_eq!(record.id, submit.job_id);
    assert_eq!(record.results.len(), 2);
    assert!(!record.text_output.is_empty());

    println!(
        "✓ Record fetched: {} result(s), {} failed",
        record.results.len(),
        record.results.iter().filter(|r| r.failed).count()
    );
}

#[tokio::test]
#[ignore] // Requires a running server
async fn test_e2e_rejects_non_image_upload() {
    let base_url = base_url();
    let client = session_client();
    login(&client, &base_url).await.expect("Login failed");

    // Random bytes with an image content type: the format sniff must
    // reject them before any job is created.
    let form = reqwest::multipart::Form::new().part(
        "images",
        reqwest::multipart::Part::bytes(vec![0u8; 100])
            .file_name("fake.png")
            .mime_str("image/png")
            .unwrap(),
    );

    let response = client
        .post(format!("{base_url}/api/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Request failed");

    assert!(
        response.status().is_client_error(),
        "Should reject invalid image bytes, got status: {}",
        response.status()
    );

    // Wrong content type entirely.
    let form = reqwest::multipart::Form::new().part(
        "images",
        reqwest::multipart::Part::bytes(b"just text".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );

    let response = client
        .post(format!("{base_url}/api/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Request failed");

    assert!(
        response.status().is_client_error(),
        "Should reject non-image content type, got status: {}",
        response.status()
    );

    println!("✓ Non-image uploads properly rejected");
}

#[tokio::test]
#[ignore] // Requires a running server
async fn test_e2e_rejects_batch_over_image_cap() {
    let base_url = base_url();
    let client = session_client();
    login(&client, &base_url).await.expect("Login failed");

    // 51 images is one over the cap; no job may be created.
    let response = submit_images(&client, &base_url, 51, "vision-standard", Some("too big"))
        .await
        .expect("Request failed");

    assert_eq!(
        response.status(),
        reqwest::StatusCode::BAD_REQUEST,
        "51-image batch should be rejected"
    );

    let status: QueueStatusResponse = client
        .get(format!("{base_url}/api/queue"))
        .send()
        .await
        .expect("Queue request failed")
        .json()
        .await
        .expect("Bad queue response");

    assert!(
        !status.queue.iter().any(|j| j.name == "too big"),
        "Rejected batch must not appear in the queue"
    );

    println!("✓ Oversized batch properly rejected");
}

#[tokio::test]
#[ignore] // Requires a running server
async fn test_e2e_unknown_mode_rejected() {
    let base_url = base_url();
    let client = session_client();
    login(&client, &base_url).await.expect("Login failed");

    let response = submit_images(&client, &base_url, 1, "sonar-web", None)
        .await
        .expect("Request failed");

    assert_eq!(
        response.status(),
        reqwest::StatusCode::BAD_REQUEST,
        "Unknown analysis mode should be rejected"
    );

    println!("✓ Unknown mode properly rejected");
}

#[tokio::test]
#[ignore] // Requires a running server
async fn test_e2e_remove_queued_job() {
    let base_url = base_url();
    let client = session_client();
    login(&client, &base_url).await.expect("Login failed");

    // First job occupies the worker; the second sits queued behind it.
    let first: SubmitResponse = submit_images(&client, &base_url, 3, "vision-standard", None)
        .await
        .expect("Submit failed")
        .json()
        .await
        .expect("Bad submit response");

    let second: SubmitResponse =
        submit_images(&client, &base_url, 1, "vision-standard", Some("removable"))
            .await
            .expect("Submit failed")
            .json()
            .await
            .expect("Bad submit response");

    let response = client
        .delete(format!("{base_url}/api/queue/{}", second.job_id))
        .send()
        .await
        .expect("Delete request failed");
    assert!(
        response.status().is_success(),
        "Removing a queued job should succeed, got {}",
        response.status()
    );

    // Removing it again is a 404.
    let response = client
        .delete(format!("{base_url}/api/queue/{}", second.job_id))
        .send()
        .await
        .expect("Delete request failed");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    println!("✓ Queued job removed (first job {} left to finish)", first.job_id);
    wait_for_queue_drain(&client, &base_url, 120)
        .await
        .expect("Queue did not drain");
}
