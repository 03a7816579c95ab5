//! The resilient fetch engine.
//!
//! Two phases share one [`pacing::Pacer`], one [`breaker::FailureTracker`] and
//! one [`crate::RunMetrics`] per category run:
//!
//! 1. [`pagination::PaginationDriver`] walks the listing endpoint page by page,
//!    persisting progress through the resume store after every page.
//! 2. [`content::ContentFetcher`] fills in missing binary content with
//!    individual per-document requests under the same retry classification.
//!
//! Both phases issue requests through the single [`http::DmsClient`] GET
//! primitive, which classifies every response into an [`http::Outcome`].

pub mod backoff;
pub mod breaker;
pub mod content;
pub mod http;
pub mod pacing;
pub mod pagination;

pub use breaker::FailureTracker;
pub use content::{ContentFetcher, ContentSummary};
pub use http::DmsClient;
pub use pacing::Pacer;
pub use pagination::PaginationDriver;

/// Fetch engine errors.
///
/// Per-item content failures are not errors at this level: the content phase
/// counts them and continues. An error here means the whole category run
/// failed (the resume store stays consistent for a future resume).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Failed to construct the HTTP client
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Response outside the retryable set; the response contract cannot be
    /// trusted, so the category run aborts
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// All retry attempts for one page offset were exhausted
    #[error("retries exhausted after {attempts} attempts at offset {offset}")]
    RetriesExhausted {
        /// Page offset being fetched when retries ran out
        offset: u64,
        /// Attempts made at that offset
        attempts: u32,
    },

    /// Resume store failure
    #[error("resume error: {0}")]
    Resume(#[from] crate::resume::ResumeError),

    /// Output failure
    #[error("output error: {0}")]
    Output(#[from] crate::output::OutputError),
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
