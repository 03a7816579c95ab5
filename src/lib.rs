//! # DMS Downloader Library
//!
//! A resilient bulk downloader for paginated document-management HTTP APIs.
//! Walks a listing endpoint page by page, persists progress after every page,
//! and fills in missing binary content with individual per-document fetches.
//!
//! ## Features
//!
//! - **Resume Capability**: Checkpoint plus append-only item ledger; an
//!   interrupted run restarts at the last confirmed offset with no duplicates
//! - **Rate Limiting**: Minimum spacing between consecutive outbound requests
//! - **Retry with Backoff**: 429/5xx/timeout classification with capped
//!   exponential backoff and `Retry-After` support
//! - **Circuit Breaker**: Consecutive-failure counter shared across the whole
//!   run forces a cooldown pause after a burst of failures
//! - **Idempotent Re-runs**: Already-written artifacts are skipped
//!
//! ## Quick Start
//!
//! ```no_run
//! use dms_downloader::cli::run_category;
//! use dms_downloader::config::RunConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::new("https://erp.example.com/api", "svc-user", "secret");
//! let outcome = run_category(&config, "REPINV", "repinv_docs").await?;
//! println!("collected {} documents", outcome.collected);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Pagination driver, content fetcher, pacing, backoff and
//!   circuit breaker
//! - [`resume`] - Checkpoint and item-ledger persistence
//! - [`output`] - Artifact decoding/writing and metadata reports
//! - [`metrics`] - Per-run accounting context, written out once at run end
//! - [`cli`] - Command-line interface and per-category orchestration
//!
//! Execution is strictly sequential: one request in flight at a time, shared
//! pacing and failure accounting across both fetch phases of a category run.

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI command implementations and per-category orchestration
pub mod cli;

/// Runtime configuration consumed by the fetch engine
pub mod config;

/// Pagination driver, content fetcher and retry machinery
pub mod fetcher;

/// Per-run accounting context
pub mod metrics;

/// Artifact and report writers
pub mod output;

/// Resume capability: checkpoint + item ledger
pub mod resume;

pub use metrics::RunMetrics;

/// One document record returned by the listing endpoint (camelCase wire form).
///
/// Immutable once ingested except for `file_content`, which transitions from
/// absent to present when the content phase fetches it. Only `id` is required;
/// every other field is presence-checked, never validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    /// Server-assigned document identifier
    pub id: String,
    /// Original file name as stored in the DMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// MIME type of the binary content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Document-type code (category)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Company code the document belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// Workflow status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Revision number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_no: Option<u32>,
    /// Last-update audit trail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<LastUpdate>,
    /// Base64-encoded binary content, absent until fetched.
    ///
    /// Excluded from the durable ledger to bound file size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
}

impl DocumentItem {
    /// Whether the item carries non-empty inline content.
    pub fn has_content(&self) -> bool {
        self.file_content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }

    /// Copy of this item with the content field stripped, for ledger records
    /// and reports.
    pub fn without_content(&self) -> Self {
        Self {
            file_content: None,
            ..self.clone()
        }
    }

    /// File name to write the artifact under, falling back to a positional
    /// name when the server did not supply one. `index` is 1-based.
    pub fn effective_file_name(&self, index: usize) -> String {
        match self.file_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("document_{index}.bin"),
        }
    }
}

/// Last-update audit fields on a [`DocumentItem`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LastUpdate {
    /// Timestamp of the last update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// User that performed the last update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Response shape shared by the listing call and the single-item call:
/// `{ total, items }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingResponse {
    /// Total number of matching documents reported by the server
    #[serde(default)]
    pub total: u64,
    /// Items in this page (or the single requested item)
    #[serde(default)]
    pub items: Vec<DocumentItem>,
}
