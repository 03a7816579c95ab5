//! Resume capability: durable checkpoint plus append-only item ledger.
//!
//! [`ResumeStore`] is the single cursor abstraction the pagination driver
//! talks to; [`checkpoint`] and [`ledger`] are its two backing projections.

pub mod checkpoint;
pub mod ledger;
pub mod store;

pub use checkpoint::Checkpoint;
pub use ledger::ItemLedger;
pub use store::{ResumeState, ResumeStore};

/// Errors from resume-state persistence.
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A ledger line could not be parsed
    #[error("corrupt ledger record at line {line}: {reason}")]
    CorruptLedger {
        /// 1-based line number
        line: usize,
        /// Parse failure detail
        reason: String,
    },
}

/// Result type for resume operations.
pub type ResumeResult<T> = Result<T, ResumeError>;
