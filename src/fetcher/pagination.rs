//! Pagination driver for the listing endpoint.
//!
//! Walks the remote listing page by page in strictly increasing offset order,
//! persisting the ledger and checkpoint after every successful page. The
//! server signals exhaustion with an empty page, not an explicit flag.

use tracing::{error, info};

use crate::config::RunConfig;
use crate::fetcher::breaker::FailureTracker;
use crate::fetcher::http::{apply_retry_delay, DmsClient, Outcome};
use crate::fetcher::pacing::Pacer;
use crate::fetcher::{FetchError, FetchResult};
use crate::metrics::RunMetrics;
use crate::resume::ResumeStore;
use crate::DocumentItem;

/// Guard against a listing endpoint that never returns an empty page.
const MAX_PAGES: u64 = 10_000;

/// Page size that only ever shrinks, and never below its floor.
///
/// Server errors and timeouts halve the width; nothing grows it back. The
/// halving invariant lives here so the driver cannot get it wrong.
#[derive(Debug, Clone, Copy)]
pub struct PageWidth {
    current: u32,
    floor: u32,
}

impl PageWidth {
    /// Create a width starting at `initial` with the given floor.
    pub fn new(initial: u32, floor: u32) -> Self {
        let floor = floor.max(1);
        Self {
            current: initial.max(floor),
            floor,
        }
    }

    /// Current width.
    pub fn get(&self) -> u32 {
        self.current
    }

    /// Halve the width, floor-bounded.
    pub fn shrink(&mut self) {
        self.current = (self.current / 2).max(self.floor);
    }
}

/// Walks the listing endpoint for one document category.
///
/// Pacer, failure tracker and metrics are borrowed so the same instances can
/// be handed to the content phase afterwards; pacing and failure accounting
/// are global to the category run.
pub struct PaginationDriver<'a> {
    client: &'a DmsClient,
    config: &'a RunConfig,
    store: &'a ResumeStore,
    pacer: &'a mut Pacer,
    breaker: &'a mut FailureTracker,
    metrics: &'a mut RunMetrics,
}

impl<'a> PaginationDriver<'a> {
    /// Create a driver for one category run.
    pub fn new(
        client: &'a DmsClient,
        config: &'a RunConfig,
        store: &'a ResumeStore,
        pacer: &'a mut Pacer,
        breaker: &'a mut FailureTracker,
        metrics: &'a mut RunMetrics,
    ) -> Self {
        Self {
            client,
            config,
            store,
            pacer,
            breaker,
            metrics,
        }
    }

    /// Fetch the complete ordered item collection for `doc_type`.
    ///
    /// Resumes from the store's effective offset. On error the return value
    /// carries no partial collection; partial progress is recoverable only
    /// through the persisted resume state.
    pub async fn fetch_all(&mut self, doc_type: &str) -> FetchResult<Vec<DocumentItem>> {
        let state = self.store.load()?;
        let mut all_items = state.items;
        let mut offset = state.start_offset;
        if offset > 0 {
            self.metrics.resumed_items = all_items.len() as u64;
        }

        let mut width = PageWidth::new(self.config.page_limit, self.config.min_page_limit);
        let mut page = offset / u64::from(width.get()) + 1;

        info!(doc_type, offset, limit = width.get(), "Starting pagination");

        loop {
            if page > MAX_PAGES {
                return Err(FetchError::InvalidResponse(format!(
                    "exceeded {MAX_PAGES} pages without an empty terminating page"
                )));
            }

            let mut attempt: u32 = 0;
            loop {
                if attempt >= self.config.max_retries {
                    error!(doc_type, page, offset, "Max retries exceeded for page");
                    return Err(FetchError::RetriesExhausted {
                        offset,
                        attempts: attempt,
                    });
                }

                let params = self.listing_params(doc_type, offset, width.get());
                let outcome = self.client.get(&params, self.pacer, self.metrics).await;

                match outcome {
                    Outcome::Success(body) => {
                        let count = body.items.len();
                        if count == 0 {
                            info!(
                                doc_type,
                                page,
                                collected = all_items.len(),
                                "No more documents"
                            );
                            return Ok(all_items);
                        }

                        // Ledger first, then the in-memory offset, then the
                        // checkpoint: a crash anywhere in between replays at
                        // most one idempotent page read.
                        self.store.append_items(&body.items)?;
                        all_items.extend(body.items);
                        offset += count as u64;
                        self.store
                            .save_checkpoint(offset, body.total, all_items.len() as u64)?;
                        self.breaker.on_success();

                        info!(
                            doc_type,
                            page,
                            count,
                            collected = all_items.len(),
                            total = body.total,
                            "Page fetched"
                        );
                        page += 1;
                        break;
                    }
                    Outcome::Invalid { reason } => {
                        // The response contract cannot be trusted; abort the
                        // whole category run
                        self.metrics.http_other += 1;
                        self.breaker.on_failure(self.metrics).await;
                        error!(doc_type, page, %reason, "Invalid response, aborting category");
                        return Err(FetchError::InvalidResponse(reason));
                    }
                    retryable => {
                        let shrink =
                            apply_retry_delay(&retryable, attempt, self.metrics, self.breaker)
                                .await;
                        if shrink {
                            width.shrink();
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }

    fn listing_params(&self, doc_type: &str, offset: u64, limit: u32) -> Vec<(&'static str, String)> {
        vec![
            ("companyId", self.config.company_id.clone()),
            ("indexes", self.config.indexes.clone()),
            ("docType", doc_type.to_string()),
            ("withFileContent", "false".to_string()),
            ("start", offset.to_string()),
            ("limit", limit.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_halves_down_to_floor() {
        let mut width = PageWidth::new(50, 10);
        width.shrink();
        assert_eq!(width.get(), 25);
        width.shrink();
        assert_eq!(width.get(), 12);
        width.shrink();
        assert_eq!(width.get(), 10);
        width.shrink();
        assert_eq!(width.get(), 10);
    }

    #[test]
    fn test_width_never_falls_below_floor_under_pressure() {
        let mut width = PageWidth::new(1000, 25);
        for _ in 0..64 {
            width.shrink();
        }
        assert_eq!(width.get(), 25);
    }

    #[test]
    fn test_width_initial_below_floor_is_raised() {
        let width = PageWidth::new(5, 10);
        assert_eq!(width.get(), 10);
    }

    #[test]
    fn test_width_floor_of_zero_is_clamped_to_one() {
        let mut width = PageWidth::new(2, 0);
        width.shrink();
        width.shrink();
        assert_eq!(width.get(), 1);
    }
}
