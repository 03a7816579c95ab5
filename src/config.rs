//! Runtime configuration for a category fetch run.

use std::path::PathBuf;
use std::time::Duration;

/// Default minimum spacing between consecutive outbound requests.
/// 250ms keeps a full-category crawl comfortably under typical per-client
/// quotas without stretching multi-thousand-item runs into hours.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(250);

/// Default maximum retry attempts per offset or per item.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default page size for listing requests.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Default floor the page size may shrink to under 5xx/timeout pressure.
pub const DEFAULT_MIN_PAGE_LIMIT: u32 = 10;

/// Default consecutive-failure count that triggers the cooldown pause.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default cooldown pause after a failure burst.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// HTTP connect timeout - time to establish the TCP connection.
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default overall per-request timeout. Listing pages and single-document
/// fetches can both carry large payloads on slow ERP backends.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Configuration surface consumed by the fetch engine for one run.
///
/// Supplied by the CLI layer; every field has a working default except the
/// endpoint and credentials.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base URL of the document endpoint, no trailing slash
    pub base_url: String,
    /// Basic-auth user
    pub username: String,
    /// Basic-auth password
    pub password: String,
    /// `companyId` query parameter
    pub company_id: String,
    /// `indexes` query parameter
    pub indexes: String,
    /// Root directory for all run output
    pub output_root: PathBuf,
    /// Minimum spacing between consecutive requests
    pub min_interval: Duration,
    /// Maximum attempts per page offset / per item
    pub max_retries: u32,
    /// Initial page size for listing requests
    pub page_limit: u32,
    /// Floor the page size never shrinks below
    pub min_page_limit: u32,
    /// Consecutive failures before the circuit breaker pauses
    pub failure_threshold: u32,
    /// Circuit-breaker cooldown duration
    pub cooldown: Duration,
    /// Overall per-request timeout
    pub request_timeout: Duration,
}

impl RunConfig {
    /// Create a configuration with defaults for everything except endpoint
    /// and credentials.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            company_id: "P2".to_string(),
            indexes: "P2".to_string(),
            output_root: PathBuf::from("artifacts"),
            min_interval: DEFAULT_MIN_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            page_limit: DEFAULT_PAGE_LIMIT,
            min_page_limit: DEFAULT_MIN_PAGE_LIMIT,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Full URL of the documents endpoint.
    pub fn documents_url(&self) -> String {
        format!("{}/documents", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = RunConfig::new("https://erp.example.com/api/", "u", "p");
        assert_eq!(config.base_url, "https://erp.example.com/api");
        assert_eq!(config.documents_url(), "https://erp.example.com/api/documents");
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::new("https://erp.example.com", "u", "p");
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.min_page_limit, DEFAULT_MIN_PAGE_LIMIT);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.failure_threshold, DEFAULT_FAILURE_THRESHOLD);
        assert_eq!(config.cooldown, DEFAULT_COOLDOWN);
    }
}
