//! Backoff delay calculation.

use std::time::Duration;

/// Base delay for exponential backoff.
/// 1.5 seconds gives the server a meaningful rest on the first retry while
/// keeping a 3-attempt cycle under a minute in the worst case.
pub const BACKOFF_BASE: Duration = Duration::from_millis(1500);

/// Cap for exponential backoff. 30 seconds bounds the wait even when the
/// attempt counter runs high.
pub const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Capped exponential backoff: `min(cap, base * 2^attempt)`.
///
/// Used whenever a retryable failure occurs without a server-provided delay
/// hint. Deterministic, no state.
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    BACKOFF_BASE.saturating_mul(factor).min(BACKOFF_CAP)
}

/// Delay before retrying after a network timeout: `5 * (attempt + 1)` seconds.
/// Timeouts grow the wait linearly rather than exponentially since the server
/// is usually struggling with payload size, not request volume.
pub fn timeout_delay(attempt: u32) -> Duration {
    Duration::from_secs(5) * (attempt + 1)
}
