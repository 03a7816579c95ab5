//! Consecutive-failure circuit breaker.
//!
//! A coarse cross-request mitigation: any burst of consecutive failures,
//! regardless of error category, is treated as a signal that the remote
//! service needs a macro-level rest. The breaker never halts the run, it only
//! inserts a cooldown pause. One instance is shared across both fetch phases
//! of a category run so failure accounting is global to the run.

use crate::fetcher::pacing::sleep_tracked;
use crate::metrics::RunMetrics;
use std::time::Duration;
use tracing::warn;

/// Counts consecutive failures and pauses at a threshold.
#[derive(Debug)]
pub struct FailureTracker {
    consecutive: u32,
    threshold: u32,
    cooldown: Duration,
}

impl FailureTracker {
    /// Create a tracker that pauses for `cooldown` once `threshold`
    /// consecutive failures accumulate.
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            consecutive: 0,
            threshold,
            cooldown,
        }
    }

    /// Record one failed operation. When the counter reaches the threshold,
    /// sleeps the cooldown and resets the counter to zero.
    pub async fn on_failure(&mut self, metrics: &mut RunMetrics) {
        self.consecutive += 1;
        if self.consecutive >= self.threshold {
            warn!(
                failures = self.consecutive,
                cooldown_secs = self.cooldown.as_secs(),
                "Failure burst - cooling down"
            );
            sleep_tracked(self.cooldown, metrics).await;
            self.consecutive = 0;
        }
    }

    /// Record one successful operation, resetting the counter unconditionally.
    pub fn on_success(&mut self) {
        self.consecutive = 0;
    }

    /// Current consecutive-failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cooldown_fires_exactly_at_threshold() {
        let mut metrics = RunMetrics::new("test");
        let mut tracker = FailureTracker::new(3, Duration::from_millis(30));

        tracker.on_failure(&mut metrics).await;
        tracker.on_failure(&mut metrics).await;
        assert_eq!(tracker.consecutive_failures(), 2);
        assert_eq!(metrics.sleep_seconds, 0.0);

        tracker.on_failure(&mut metrics).await;
        assert_eq!(tracker.consecutive_failures(), 0);
        assert!(metrics.sleep_seconds >= 0.03);
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let mut metrics = RunMetrics::new("test");
        let mut tracker = FailureTracker::new(3, Duration::from_millis(30));

        tracker.on_failure(&mut metrics).await;
        tracker.on_failure(&mut metrics).await;
        tracker.on_success();
        assert_eq!(tracker.consecutive_failures(), 0);

        // A fresh burst starts counting from zero again
        tracker.on_failure(&mut metrics).await;
        assert_eq!(tracker.consecutive_failures(), 1);
        assert_eq!(metrics.sleep_seconds, 0.0);
    }
}
