//! Artifact and report writers.

pub mod artifact;
pub mod report;

pub use artifact::{
    artifact_present, decode_content, sanitize_file_name, sha256_hex, write_artifact,
};

/// Output writer errors.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Binary payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    Csv(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;
