//! CLI error types and conversions.

use crate::fetcher::FetchError;
use crate::output::OutputError;
use crate::resume::ResumeError;

/// CLI errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Fetch engine error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Resume state error
    #[error("resume error: {0}")]
    Resume(#[from] ResumeError),

    /// Output error
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more document categories did not complete
    #[error("categories failed: {}", failed.join(", "))]
    CategoriesFailed {
        /// Document-type codes that failed
        failed: Vec<String>,
    },
}
