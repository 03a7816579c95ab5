//! Request pacing.
//!
//! [`Pacer`] enforces a minimum spacing between consecutive outbound calls.
//! One instance is shared across both fetch phases of a category run so the
//! spacing is global to the run, not per phase.

use crate::metrics::RunMetrics;
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive `wait()` calls.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl Pacer {
    /// Create a pacer with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Wait until at least `min_interval` has elapsed since the start of the
    /// previous `wait()` on this instance. Returns immediately on the first
    /// call or when the interval has already elapsed. Slept time is recorded
    /// into `metrics`.
    pub async fn wait(&mut self, metrics: &mut RunMetrics) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep_tracked(self.min_interval - elapsed, metrics).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}

/// Sleep for `duration`, accounting the slept time into `metrics`.
///
/// All delay paths (pacing, backoff, timeout waits, cooldown) go through this
/// so `sleep_seconds` reflects every pause of the run.
pub async fn sleep_tracked(duration: Duration, metrics: &mut RunMetrics) {
    if duration.is_zero() {
        return;
    }
    tokio::time::sleep(duration).await;
    metrics.record_sleep(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_consecutive_waits_are_spaced() {
        let mut metrics = RunMetrics::new("test");
        let mut pacer = Pacer::new(Duration::from_millis(50));

        pacer.wait(&mut metrics).await;
        let before_second = Instant::now();
        pacer.wait(&mut metrics).await;

        assert!(before_second.elapsed() >= Duration::from_millis(45));
        assert!(metrics.sleep_seconds > 0.0);
    }

    #[tokio::test]
    async fn test_first_wait_returns_immediately() {
        let mut metrics = RunMetrics::new("test");
        let mut pacer = Pacer::new(Duration::from_secs(5));

        let start = Instant::now();
        pacer.wait(&mut metrics).await;
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(metrics.sleep_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_elapsed_interval_does_not_sleep() {
        let mut metrics = RunMetrics::new("test");
        let mut pacer = Pacer::new(Duration::from_millis(10));

        pacer.wait(&mut metrics).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let start = Instant::now();
        pacer.wait(&mut metrics).await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_sleep_tracked_accumulates() {
        let mut metrics = RunMetrics::new("test");
        sleep_tracked(Duration::from_millis(20), &mut metrics).await;
        sleep_tracked(Duration::ZERO, &mut metrics).await;
        assert!((metrics.sleep_seconds - 0.02).abs() < 1e-9);
    }
}
