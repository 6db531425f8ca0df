use std::time::Duration;

/// Pacing delays between external API calls.
///
/// Batching alone is not enough to stay under the providers' rate limits, so
/// the processor waits a short interval between consecutive images and a
/// longer one between batches. Both intervals are plain cooperative sleeps;
/// holding them behind this struct keeps them configurable and lets tests run
/// against tokio's paused clock.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    request_delay: Duration,
    batch_delay: Duration,
}

impl Pacer {
    pub fn new(request_delay: Duration, batch_delay: Duration) -> Self {
        Self {
            request_delay,
            batch_delay,
        }
    }

    /// No-op pacer for tests that don't exercise timing.
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Wait between consecutive images within a batch.
    pub async fn between_requests(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// Wait between consecutive batches.
    pub async fn between_batches(&self) {
        if !self.batch_delay.is_zero() {
            tokio::time::sleep(self.batch_delay).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(2000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn delays_match_configuration() {
        let pacer = Pacer::new(Duration::from_millis(500), Duration::from_millis(2000));

        let start = Instant::now();
        pacer.between_requests().await;
        assert_eq!(start.elapsed(), Duration::from_millis(500));

        let start = Instant::now();
        pacer.between_batches().await;
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delays_elapse_no_time() {
        let pacer = Pacer::unpaced();
        let start = Instant::now();
        pacer.between_requests().await;
        pacer.between_batches().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
