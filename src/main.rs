mod app_state;
mod config;
mod models;
mod routes;
mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::{routing::delete, routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::{AdminCredentials, AppState};
use config::AppConfig;
use routes::analyze::{MAX_IMAGES_PER_JOB, MAX_IMAGE_BYTES};
use services::{
    analysis::AnalysisClient,
    pacer::Pacer,
    processor::BatchProcessor,
    queue::JobQueue,
    session::SessionStore,
    store::{AnalysisStore, RETENTION_WINDOW},
};

/// Upload budget: a full job of maximum-size images plus multipart framing.
const MAX_UPLOAD_BYTES: usize = MAX_IMAGES_PER_JOB * MAX_IMAGE_BYTES + 1024 * 1024;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing image-namer server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_histogram!(
        "analysis_processing_seconds",
        "Time to process an analysis job"
    );
    metrics::describe_counter!("analysis_jobs_total", "Total analysis jobs submitted");
    metrics::describe_counter!("analysis_jobs_completed", "Total analysis jobs completed");
    metrics::describe_counter!("analysis_jobs_failed", "Total analysis jobs that failed");
    metrics::describe_gauge!(
        "analysis_queue_depth",
        "Current number of jobs in the queue"
    );

    // Initialize the analysis record store
    tracing::info!(dir = %config.saved_analyses_dir, "Initializing analysis record store");
    let store = Arc::new(
        AnalysisStore::new(&config.saved_analyses_dir, RETENTION_WINDOW)
            .await
            .expect("Failed to initialize analysis record store"),
    );

    // Initialize the external provider client and batch processor
    tracing::info!("Initializing vision API clients");
    let analyzer = Arc::new(AnalysisClient::new(
        config.openai_api_key.clone(),
        config.perplexity_api_key.clone(),
    ));
    let pacer = Pacer::new(
        Duration::from_millis(config.request_delay_ms),
        Duration::from_millis(config.batch_delay_ms),
    );
    let processor = BatchProcessor::new(analyzer, pacer, config.batch_size);

    // Initialize the job queue
    let queue = Arc::new(JobQueue::new(
        processor,
        Arc::clone(&store),
        Duration::from_millis(config.job_pause_ms),
    ));

    // Create shared application state
    let state = AppState::new(
        queue,
        Arc::clone(&store),
        SessionStore::new(),
        AdminCredentials {
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
        },
    );

    // Purge expired records once at startup, then hourly
    if let Err(e) = store.purge_expired().await {
        tracing::error!(error = %e, "Startup purge of expired records failed");
    }
    let purge_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        interval.tick().await; // the first tick fires immediately
        loop {
            interval.tick().await;
            match purge_store.purge_expired().await {
                Ok(purged) if purged > 0 => {
                    tracing::info!(purged, "Hourly purge removed expired records");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Hourly purge failed"),
            }
        }
    });

    // API routes behind the session gate
    let protected = Router::new()
        .route(
            "/imageanalysis",
            get(|| async { Html(include_str!("../static/index.html")) }),
        )
        .route("/api/analyze", post(routes::analyze::submit_analysis))
        .route("/api/analyses", get(routes::analyses::list_analyses))
        .route("/api/analyses/{id}", get(routes::analyses::get_analysis))
        .route("/api/queue", get(routes::queue::queue_status))
        .route("/api/queue/{id}", delete(routes::queue::remove_from_queue))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            routes::auth::require_auth,
        ));

    let app = Router::new()
        // Login page (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../static/login.html")) }))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/health", get(routes::health::health_check))
        .merge(protected)
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES));

    tracing::info!("Starting image-namer on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
