use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::analysis::{combined_text_output, AnalysisMode, AnalysisRecord};
use crate::models::job::{AnalysisJob, JobStatus, JobSummary, UploadedImage};
use crate::services::processor::BatchProcessor;
use crate::services::store::AnalysisStore;

/// Ordered single-consumer FIFO of analysis jobs.
///
/// All queue state lives behind one mutex; the `busy` flag is checked and set
/// under that lock, which is what guarantees at most one job is processing at
/// any instant. The head job stays visible (as `processing`) until it reaches
/// a terminal status, then it is dequeued and only its persisted record
/// survives.
pub struct JobQueue {
    state: Mutex<QueueState>,
    processor: BatchProcessor,
    store: Arc<AnalysisStore>,
    inter_job_pause: Duration,
}

struct QueueState {
    jobs: VecDeque<AnalysisJob>,
    busy: bool,
}

/// What a caller gets back from `submit`.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub job_id: Uuid,
    pub queue_position: usize,
}

/// Point-in-time view of the queue for the introspection endpoint.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub jobs: Vec<JobSummary>,
    pub is_processing: bool,
    pub queue_length: usize,
}

impl JobQueue {
    pub fn new(
        processor: BatchProcessor,
        store: Arc<AnalysisStore>,
        inter_job_pause: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                busy: false,
            }),
            processor,
            store,
            inter_job_pause,
        }
    }

    /// Append a new job to the tail and start the worker if it is idle.
    pub async fn submit(
        self: &Arc<Self>,
        images: Vec<UploadedImage>,
        mode: AnalysisMode,
        name: Option<String>,
    ) -> SubmitReceipt {
        let job = AnalysisJob::new(images, mode, name);
        let job_id = job.id;

        let (queue_position, idle) = {
            let mut state = self.state.lock().await;
            state.jobs.push_back(job);
            (state.jobs.len(), !state.busy)
        };

        metrics::counter!("analysis_jobs_total").increment(1);
        metrics::gauge!("analysis_queue_depth").set(queue_position as f64);

        tracing::info!(
            %job_id,
            queue_position,
            "analysis job queued"
        );

        if idle {
            tokio::spawn(Arc::clone(self).drain());
        }

        SubmitReceipt {
            job_id,
            queue_position,
        }
    }

    /// Summaries of every live job, in queue order.
    pub async fn list(&self) -> QueueSnapshot {
        let state = self.state.lock().await;
        QueueSnapshot {
            jobs: state.jobs.iter().map(AnalysisJob::summary).collect(),
            is_processing: state.busy,
            queue_length: state.jobs.len(),
        }
    }

    /// Remove a queued job. Fails with `InProgress` (and no mutation) when
    /// the target is currently processing.
    pub async fn remove(&self, job_id: Uuid) -> Result<JobSummary, QueueError> {
        let mut state = self.state.lock().await;

        let index = state
            .jobs
            .iter()
            .position(|job| job.id == job_id)
            .ok_or(QueueError::NotFound(job_id))?;

        if state.jobs[index].status == JobStatus::Processing {
            return Err(QueueError::InProgress(job_id));
        }

        let job = state
            .jobs
            .remove(index)
            .ok_or(QueueError::NotFound(job_id))?;
        metrics::gauge!("analysis_queue_depth").set(state.jobs.len() as f64);

        tracing::info!(%job_id, image_count = job.images.len(), "job removed from queue");
        Ok(job.summary())
    }

    /// The sole worker loop. Exits when the queue is empty or another worker
    /// holds the busy flag; `submit` spawns a fresh worker whenever the flag
    /// is clear.
    async fn drain(self: Arc<Self>) {
        loop {
            let job = {
                let mut state = self.state.lock().await;
                if state.busy {
                    return;
                }
                let Some(head) = state.jobs.front_mut() else {
                    return;
                };
                head.status = JobStatus::Processing;
                let job = head.clone();
                state.busy = true;
                job
            };

            tracing::info!(
                job_id = %job.id,
                name = job.name.as_deref().unwrap_or("Unnamed"),
                image_count = job.images.len(),
                mode = %job.mode,
                "processing analysis job"
            );

            let started = std::time::Instant::now();
            let outcome = self.run_job(&job).await;
            metrics::histogram!("analysis_processing_seconds")
                .record(started.elapsed().as_secs_f64());

            match &outcome {
                Ok(()) => {
                    metrics::counter!("analysis_jobs_completed").increment(1);
                    tracing::info!(job_id = %job.id, "analysis job completed");
                }
                Err(e) => {
                    metrics::counter!("analysis_jobs_failed").increment(1);
                    tracing::error!(job_id = %job.id, error = %e, "analysis job failed");
                }
            }

            {
                let mut state = self.state.lock().await;
                if let Some(head) = state.jobs.front_mut() {
                    head.status = match &outcome {
                        Ok(()) => JobStatus::Completed,
                        Err(e) => {
                            head.error = Some(e.to_string());
                            JobStatus::Failed
                        }
                    };
                }
                state.jobs.pop_front();
                state.busy = false;
                metrics::gauge!("analysis_queue_depth").set(state.jobs.len() as f64);
            }

            // Yield between consecutive jobs so polling and new submissions
            // are never starved by back-to-back processing.
            tokio::time::sleep(self.inter_job_pause).await;
        }
    }

    /// Process one job's images and persist the outcome. Per-image provider
    /// failures are already captured inside the results; the only failure
    /// that reaches here is record persistence, which fails the whole job
    /// with no partial persistence.
    async fn run_job(&self, job: &AnalysisJob) -> Result<(), JobProcessingError> {
        let results = self.processor.process(&job.images, job.mode).await;

        let record = AnalysisRecord {
            id: job.id,
            name: job.name.clone(),
            created_at: job.created_at,
            mode: job.mode,
            status: JobStatus::Completed,
            text_output: combined_text_output(&results),
            results,
            error: None,
        };

        let key = self.store.save(&record).await?;
        tracing::debug!(job_id = %job.id, key, "analysis record persisted");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("job {0} not found in queue")]
    NotFound(Uuid),

    #[error("job {0} is currently processing and cannot be removed")]
    InProgress(Uuid),
}

#[derive(Debug, thiserror::Error)]
pub enum JobProcessingError {
    #[error("failed to persist analysis record: {0}")]
    Persist(#[from] crate::services::store::StoreError),
}
