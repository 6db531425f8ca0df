use std::sync::Arc;

use crate::models::analysis::{AnalysisMode, ImageResult};
use crate::models::job::UploadedImage;
use crate::services::analysis::ImageAnalyzer;
use crate::services::pacer::Pacer;

pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Processes one job's images in fixed-size batches with pacing delays.
pub struct BatchProcessor {
    analyzer: Arc<dyn ImageAnalyzer>,
    pacer: Pacer,
    batch_size: usize,
}

impl BatchProcessor {
    pub fn new(analyzer: Arc<dyn ImageAnalyzer>, pacer: Pacer, batch_size: usize) -> Self {
        // chunks() panics on zero.
        assert!(batch_size > 0, "batch size must be at least 1");
        Self {
            analyzer,
            pacer,
            batch_size,
        }
    }

    /// Analyze every image in order, one result per input image.
    ///
    /// A provider failure on one image is captured as a `failed` placeholder
    /// result and never aborts the rest of the job. The pacer waits between
    /// consecutive images within a batch and between batches, skipping the
    /// wait after the last of each.
    pub async fn process(&self, images: &[UploadedImage], mode: AnalysisMode) -> Vec<ImageResult> {
        let mut results = Vec::with_capacity(images.len());
        let total_batches = images.len().div_ceil(self.batch_size);

        for (batch_index, batch) in images.chunks(self.batch_size).enumerate() {
            tracing::info!(
                batch = batch_index + 1,
                total_batches,
                batch_len = batch.len(),
                "processing batch"
            );

            for (i, image) in batch.iter().enumerate() {
                match self.analyzer.analyze(image, mode).await {
                    Ok(analysis) => results.push(ImageResult {
                        original_filename: image.original_name.clone(),
                        analysis,
                        failed: false,
                    }),
                    Err(e) => {
                        tracing::error!(
                            file = %image.original_name,
                            error = %e,
                            "image analysis failed"
                        );
                        results.push(ImageResult::failure_placeholder(&image.original_name));
                    }
                }

                if i + 1 < batch.len() {
                    self.pacer.between_requests().await;
                }
            }

            if batch_index + 1 < total_batches {
                tracing::debug!("waiting before next batch");
                self.pacer.between_batches().await;
            }
        }

        results
    }
}
