use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::models::analysis::{AnalysisRecord, RecordSummary};

/// Records older than this are invisible to listing and eligible for purge.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Directory-of-documents store for completed analysis records.
///
/// Each record is one uniquely-named JSON file written once, so concurrent
/// readers never observe partial writes.
pub struct AnalysisStore {
    dir: PathBuf,
    retention: Duration,
}

impl AnalysisStore {
    pub async fn new(dir: impl Into<PathBuf>, retention: Duration) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, retention })
    }

    /// Persist a record, returning its storage key.
    ///
    /// The key is the creation timestamp (`:` and `.` replaced with `-`)
    /// joined to the sanitized display name.
    pub async fn save(&self, record: &AnalysisRecord) -> Result<String, StoreError> {
        let timestamp = record.created_at.format("%Y-%m-%dT%H-%M-%S-%3fZ");
        let safe_name = sanitize_name(record.name.as_deref().unwrap_or(""));
        let key = format!("{timestamp}_{safe_name}");

        let body = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(self.record_path(&key), body).await?;

        Ok(key)
    }

    /// Fetch a full record by storage key.
    pub async fn get(&self, key: &str) -> Result<AnalysisRecord, StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }

        let bytes = match tokio::fs::read(self.record_path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// List summaries of records modified within the retention window,
    /// newest first. Unreadable or unparseable files are skipped.
    pub async fn list_recent(&self) -> Result<Vec<RecordSummary>, StoreError> {
        let cutoff = SystemTime::now() - self.retention;
        let mut summaries = Vec::new();

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(key) = record_key(&path) else {
                continue;
            };

            let modified = entry.metadata().await?.modified()?;
            if modified < cutoff {
                continue;
            }

            match self.get(&key).await {
                Ok(record) => summaries.push(RecordSummary {
                    id: key,
                    name: record
                        .name
                        .unwrap_or_else(|| "Unnamed Analysis".to_string()),
                    created_at: record.created_at,
                    image_count: record.results.len(),
                    status: record.status,
                }),
                Err(e) => {
                    tracing::warn!(key, error = %e, "skipping unreadable analysis record");
                }
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Delete every record whose modification time is older than the
    /// retention window. Returns the number of records removed.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        let cutoff = SystemTime::now() - self.retention;
        let mut purged = 0;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(key) = record_key(&path) else {
                continue;
            };

            let modified = entry.metadata().await?.modified()?;
            if modified < cutoff {
                tokio::fs::remove_file(&path).await?;
                tracing::info!(key, "purged expired analysis record");
                purged += 1;
            }
        }

        Ok(purged)
    }

    /// Cheap reachability probe for health checks.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        tokio::fs::read_dir(&self.dir).await?;
        Ok(())
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

/// Storage keys are generated from timestamps and sanitized names; anything
/// with a path separator did not come from us.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['/', '\\']) && !key.contains("..")
}

fn record_key(path: &Path) -> Option<String> {
    if path.extension()? != "json" {
        return None;
    }
    Some(path.file_stem()?.to_str()?.to_string())
}

/// Reduce a display name to a filesystem-safe slug: ASCII alphanumerics and
/// hyphens survive, whitespace runs collapse to single hyphens.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let slug = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    if slug.is_empty() {
        "unnamed-analysis".to_string()
    } else {
        slug
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize or parse analysis record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("analysis record '{0}' not found")]
    NotFound(String),
}
