use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// OpenAI API key for the vision modes
    pub openai_api_key: String,

    /// Perplexity API key for the search modes
    pub perplexity_api_key: String,

    /// Directory where completed analysis records are persisted
    #[serde(default = "default_saved_analyses_dir")]
    pub saved_analyses_dir: String,

    /// Operator login name
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Operator password. No default on purpose.
    pub admin_password: String,

    /// Images per batch when processing a job
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive images within a batch, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Pause between consecutive batches, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Pause between consecutive jobs, in milliseconds
    #[serde(default = "default_job_pause_ms")]
    pub job_pause_ms: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_saved_analyses_dir() -> String {
    "saved-analyses".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_batch_size() -> usize {
    crate::services::processor::DEFAULT_BATCH_SIZE
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_batch_delay_ms() -> u64 {
    2000
}

fn default_job_pause_ms() -> u64 {
    1000
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
