//! HTTP client and response classification.
//!
//! [`DmsClient`] is the single request primitive both fetch phases go
//! through: it paces the call, issues an authenticated GET and classifies the
//! result into an [`Outcome`]. The retry loops in `pagination` and `content`
//! differ only in what they do with a classified outcome; the per-class delay
//! policy itself lives here in [`apply_retry_delay`].

use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::{RunConfig, HTTP_CONNECT_TIMEOUT};
use crate::fetcher::backoff::{backoff_delay, timeout_delay};
use crate::fetcher::breaker::FailureTracker;
use crate::fetcher::pacing::{sleep_tracked, Pacer};
use crate::fetcher::{FetchError, FetchResult};
use crate::metrics::RunMetrics;
use crate::ListingResponse;

/// Classification of one request attempt.
#[derive(Debug)]
pub enum Outcome {
    /// 2xx JSON response, deserialized
    Success(ListingResponse),
    /// HTTP 429, with the server's `Retry-After` hint when present
    RateLimited {
        /// Parsed `Retry-After` header, seconds
        retry_after: Option<Duration>,
    },
    /// HTTP 5xx
    ServerError {
        /// The status code received
        status: u16,
    },
    /// The request timed out
    TimedOut,
    /// Anything else: untrusted status, non-JSON content type, body that does
    /// not deserialize, or a non-timeout network failure
    Invalid {
        /// Human-readable reason
        reason: String,
    },
}

/// Authenticated HTTP client for the documents endpoint.
pub struct DmsClient {
    http: Client,
    url: String,
    username: String,
    password: String,
}

impl DmsClient {
    /// Build a client with explicit connect and request timeouts.
    pub fn new(config: &RunConfig) -> FetchResult<Self> {
        let http = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            http,
            url: config.documents_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Pace, issue one GET against the documents endpoint and classify the
    /// result. Records the request and its latency into `metrics`; never
    /// returns an error, every failure mode is an [`Outcome`] variant.
    pub async fn get(
        &self,
        params: &[(&str, String)],
        pacer: &mut Pacer,
        metrics: &mut RunMetrics,
    ) -> Outcome {
        pacer.wait(metrics).await;

        debug!(url = %self.url, params = params.len(), "Issuing GET request");
        let started = Instant::now();
        let result = self
            .http
            .get(&self.url)
            .query(params)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return Outcome::TimedOut,
            Err(e) => {
                return Outcome::Invalid {
                    reason: format!("network error: {e}"),
                }
            }
        };

        metrics.record_request(latency_ms);
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Outcome::RateLimited {
                retry_after: parse_retry_after(&response),
            };
        }

        if status.is_server_error() {
            return Outcome::ServerError {
                status: status.as_u16(),
            };
        }

        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            return Outcome::Invalid {
                reason: format!("unexpected status {status}"),
            };
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            return Outcome::Invalid {
                reason: format!("non-json content type: {content_type}"),
            };
        }

        match response.json::<ListingResponse>().await {
            Ok(body) => Outcome::Success(body),
            Err(e) => Outcome::Invalid {
                reason: format!("undeserializable body: {e}"),
            },
        }
    }
}

/// `Retry-After` as fractional seconds. Only the delta-seconds form is
/// honored; a malformed header falls back to local backoff.
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    let secs: f64 = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

/// Apply the shared delay policy for one retryable failure: bump the matching
/// counter, sleep the class-appropriate delay, signal the failure tracker.
///
/// Returns `true` when the failure class calls for shrinking the page width
/// (5xx and timeout; a 429 keeps the width, the server asked for spacing, not
/// smaller pages). `Success` and `Invalid` outcomes must be handled by the
/// caller and never reach this function.
pub(crate) async fn apply_retry_delay(
    outcome: &Outcome,
    attempt: u32,
    metrics: &mut RunMetrics,
    breaker: &mut FailureTracker,
) -> bool {
    let (delay, shrink) = match outcome {
        Outcome::RateLimited { retry_after } => {
            metrics.http_429 += 1;
            let delay = retry_after.unwrap_or_else(|| backoff_delay(attempt));
            warn!(
                attempt,
                delay_secs = delay.as_secs_f64(),
                "Rate limited - waiting"
            );
            (delay, false)
        }
        Outcome::ServerError { status } => {
            metrics.http_5xx += 1;
            let delay = backoff_delay(attempt);
            warn!(
                status,
                attempt,
                delay_secs = delay.as_secs_f64(),
                "Server error - backing off"
            );
            (delay, true)
        }
        Outcome::TimedOut => {
            metrics.timeouts += 1;
            let delay = timeout_delay(attempt);
            warn!(
                attempt,
                delay_secs = delay.as_secs_f64(),
                "Request timed out - waiting"
            );
            (delay, true)
        }
        Outcome::Success(_) | Outcome::Invalid { .. } => {
            unreachable!("non-retryable outcome passed to apply_retry_delay")
        }
    };

    sleep_tracked(delay, metrics).await;
    breaker.on_failure(metrics).await;
    shrink
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COOLDOWN;

    #[tokio::test]
    async fn test_rate_limit_honors_retry_after_hint() {
        let mut metrics = RunMetrics::new("test");
        let mut breaker = FailureTracker::new(5, DEFAULT_COOLDOWN);
        let outcome = Outcome::RateLimited {
            retry_after: Some(Duration::from_millis(20)),
        };

        let shrink = apply_retry_delay(&outcome, 0, &mut metrics, &mut breaker).await;
        assert!(!shrink);
        assert_eq!(metrics.http_429, 1);
        assert!(metrics.sleep_seconds >= 0.02);
        assert_eq!(breaker.consecutive_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_requests_shrink() {
        let mut metrics = RunMetrics::new("test");
        let mut breaker = FailureTracker::new(5, DEFAULT_COOLDOWN);
        let outcome = Outcome::ServerError { status: 503 };

        let shrink = apply_retry_delay(&outcome, 0, &mut metrics, &mut breaker).await;
        assert!(shrink);
        assert_eq!(metrics.http_5xx, 1);
        assert!(metrics.sleep_seconds >= 1.5);
        assert_eq!(breaker.consecutive_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_requests_shrink_with_linear_delay() {
        let mut metrics = RunMetrics::new("test");
        let mut breaker = FailureTracker::new(5, DEFAULT_COOLDOWN);

        let shrink = apply_retry_delay(&Outcome::TimedOut, 1, &mut metrics, &mut breaker).await;
        assert!(shrink);
        assert_eq!(metrics.timeouts, 1);
        assert!((metrics.sleep_seconds - 10.0).abs() < 0.01);
    }
}
