//! Per-item content fetch and persistence.
//!
//! Second phase of a category run: for every collected item that lacks inline
//! binary content, fetch it individually by id under the same retry
//! classification as the pagination driver, decode it and write it once.
//! Failures here are per-item; the batch always runs to completion.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::fetcher::breaker::FailureTracker;
use crate::fetcher::http::{apply_retry_delay, DmsClient, Outcome};
use crate::fetcher::pacing::{sleep_tracked, Pacer};
use crate::fetcher::FetchResult;
use crate::metrics::RunMetrics;
use crate::output::{artifact_present, decode_content, sanitize_file_name, sha256_hex, write_artifact};
use crate::DocumentItem;

/// Pause after an invalid or content-free response before the next attempt.
const INVALID_RESPONSE_PAUSE: Duration = Duration::from_secs(2);

/// Aggregate result of one content batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContentSummary {
    /// Artifacts written in this batch
    pub downloaded: u64,
    /// Items skipped because a non-empty artifact already existed
    pub skipped: u64,
    /// Items whose content could not be obtained or decoded
    pub failed: u64,
}

impl ContentSummary {
    /// The batch succeeds only if no item failed.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Downloads binary content for collected items, one at a time, in listing
/// order. Shares the pacer, failure tracker and metrics of the pagination
/// phase.
pub struct ContentFetcher<'a> {
    client: &'a DmsClient,
    config: &'a RunConfig,
    pacer: &'a mut Pacer,
    breaker: &'a mut FailureTracker,
    metrics: &'a mut RunMetrics,
}

impl<'a> ContentFetcher<'a> {
    /// Create a content fetcher for one category run.
    pub fn new(
        client: &'a DmsClient,
        config: &'a RunConfig,
        pacer: &'a mut Pacer,
        breaker: &'a mut FailureTracker,
        metrics: &'a mut RunMetrics,
    ) -> Self {
        Self {
            client,
            config,
            pacer,
            breaker,
            metrics,
        }
    }

    /// Fetch, decode and write content for every item, skipping artifacts
    /// that already exist. Re-running a partially completed batch is safe.
    pub async fn download_all(
        &mut self,
        items: &[DocumentItem],
        output_dir: &Path,
    ) -> FetchResult<ContentSummary> {
        let total = items.len();
        let mut summary = ContentSummary::default();

        for (index, item) in items.iter().enumerate() {
            let position = index + 1;
            let file_name = sanitize_file_name(&item.effective_file_name(position));
            let path = output_dir.join(&file_name);

            if artifact_present(&path) {
                debug!(position, total, file_name, "Artifact exists, skipping");
                summary.skipped += 1;
                self.metrics.files_skipped += 1;
                continue;
            }

            let content = match item.file_content.as_deref() {
                Some(inline) if !inline.trim().is_empty() => Some(inline.trim().to_string()),
                _ => self.fetch_content(&item.id, &file_name).await,
            };

            let Some(content) = content else {
                warn!(position, total, file_name, "No content obtained, item failed");
                summary.failed += 1;
                self.metrics.files_failed += 1;
                continue;
            };

            match self.persist(&path, &content) {
                Ok(bytes_written) => {
                    summary.downloaded += 1;
                    self.metrics.record_download(bytes_written);
                    self.breaker.on_success();
                    info!(
                        position,
                        total,
                        file_name,
                        size_kb = bytes_written / 1024,
                        "Artifact written"
                    );
                }
                Err(e) => {
                    warn!(position, total, file_name, error = %e, "Item failed");
                    summary.failed += 1;
                    self.metrics.files_failed += 1;
                    self.breaker.on_failure(self.metrics).await;
                }
            }
        }

        info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            total,
            "Content phase finished"
        );
        Ok(summary)
    }

    /// Fetch content by document id with the shared retry classification.
    /// Returns `None` once retries are exhausted; per-item failures never
    /// abort the batch.
    async fn fetch_content(&mut self, id: &str, file_name: &str) -> Option<String> {
        let params = self.single_item_params(id);
        let mut attempt: u32 = 0;

        while attempt < self.config.max_retries {
            debug!(id, file_name, attempt, "Fetching content");
            let outcome = self.client.get(&params, self.pacer, self.metrics).await;

            match outcome {
                Outcome::Success(body) => {
                    let content = body
                        .items
                        .first()
                        .and_then(|item| item.file_content.as_deref())
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string);

                    match content {
                        Some(content) => {
                            self.breaker.on_success();
                            return Some(content);
                        }
                        None => {
                            // A well-formed response without content; give
                            // the server a beat and ask again
                            debug!(id, attempt, "Response carried no content");
                            sleep_tracked(INVALID_RESPONSE_PAUSE, self.metrics).await;
                            attempt += 1;
                        }
                    }
                }
                Outcome::Invalid { reason } => {
                    warn!(id, attempt, %reason, "Invalid response for item");
                    self.metrics.http_other += 1;
                    sleep_tracked(INVALID_RESPONSE_PAUSE, self.metrics).await;
                    self.breaker.on_failure(self.metrics).await;
                    attempt += 1;
                }
                retryable => {
                    apply_retry_delay(&retryable, attempt, self.metrics, self.breaker).await;
                    attempt += 1;
                }
            }
        }

        warn!(id, file_name, attempts = attempt, "Content retries exhausted");
        None
    }

    /// Decode the payload and write the artifact, returning the byte count.
    fn persist(&self, path: &Path, content: &str) -> FetchResult<u64> {
        let bytes = decode_content(content)?;
        let digest = sha256_hex(&bytes);
        write_artifact(path, &bytes)?;
        debug!(path = %path.display(), sha256 = %digest, "Artifact decoded and written");
        Ok(bytes.len() as u64)
    }

    fn single_item_params(&self, id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("companyId", self.config.company_id.clone()),
            ("indexes", self.config.indexes.clone()),
            ("id", id.to_string()),
            ("withFileContent", "true".to_string()),
        ]
    }
}
