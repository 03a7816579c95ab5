//! Download command: argument parsing and the per-category run loop.
//!
//! One category run is two sequential phases over shared pacing, failure
//! accounting and metrics: paginate the full listing, then fill in binary
//! content item by item. Reports and the metrics summary are written at the
//! end of each category.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

use super::error::CliError;
use crate::config::RunConfig;
use crate::fetcher::{ContentFetcher, ContentSummary, DmsClient, FailureTracker, Pacer, PaginationDriver};
use crate::metrics::RunMetrics;
use crate::output::report::{write_metadata_csv, write_response_json};
use crate::resume::ResumeStore;

/// Bulk-download document categories from a DMS endpoint.
#[derive(Debug, Parser)]
#[command(name = "dms-downloader", version, about)]
pub struct Cli {
    /// Base URL of the DMS API, e.g. https://erp.example.com/api
    #[arg(long, env = "DMS_BASE_URL")]
    pub base_url: String,

    /// Basic-auth user
    #[arg(long, env = "DMS_USER")]
    pub username: String,

    /// Basic-auth password
    #[arg(long, env = "DMS_PASS", hide_env_values = true)]
    pub password: String,

    /// Company code for the companyId query parameter
    #[arg(long, env = "DMS_COMPANY_ID", default_value = "P2")]
    pub company_id: String,

    /// Index set for the indexes query parameter
    #[arg(long, env = "DMS_INDEXES", default_value = "P2")]
    pub indexes: String,

    /// Document-type codes to fetch, in order
    #[arg(
        long = "doc-type",
        value_name = "CODE",
        default_values_t = [String::from("REPINV"), String::from("REPTEC")]
    )]
    pub doc_types: Vec<String>,

    /// Root directory for all run output
    #[arg(long, env = "DMS_OUT_DIR", default_value = "artifacts")]
    pub output_root: PathBuf,

    /// Minimum spacing between consecutive requests, seconds
    #[arg(long, env = "DMS_MIN_INTERVAL", default_value_t = 0.25)]
    pub min_interval: f64,

    /// Maximum attempts per page offset / per item
    #[arg(long, env = "DMS_MAX_RETRIES", default_value_t = crate::config::DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Initial page size for listing requests
    #[arg(long, env = "DMS_LIMIT", default_value_t = crate::config::DEFAULT_PAGE_LIMIT)]
    pub limit: u32,

    /// Floor the page size never shrinks below
    #[arg(long, default_value_t = crate::config::DEFAULT_MIN_PAGE_LIMIT)]
    pub min_limit: u32,

    /// Consecutive failures before the circuit breaker pauses
    #[arg(long, default_value_t = crate::config::DEFAULT_FAILURE_THRESHOLD)]
    pub failure_threshold: u32,

    /// Circuit-breaker cooldown, seconds
    #[arg(long, default_value_t = 60)]
    pub cooldown_secs: u64,

    /// Overall per-request timeout, seconds
    #[arg(long, default_value_t = 180)]
    pub request_timeout_secs: u64,
}

impl Cli {
    /// Build the engine configuration from the parsed arguments.
    pub fn to_config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.base_url, &self.username, &self.password);
        config.company_id = self.company_id.clone();
        config.indexes = self.indexes.clone();
        config.output_root = self.output_root.clone();
        config.min_interval = Duration::from_secs_f64(self.min_interval.max(0.0));
        config.max_retries = self.max_retries;
        config.page_limit = self.limit;
        config.min_page_limit = self.min_limit;
        config.failure_threshold = self.failure_threshold;
        config.cooldown = Duration::from_secs(self.cooldown_secs);
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }
}

/// Result of one completed category run.
#[derive(Debug)]
pub struct CategoryOutcome {
    /// Items collected by the pagination phase
    pub collected: u64,
    /// Content-phase counters
    pub summary: ContentSummary,
}

/// File layout for one category under the output root.
struct CategoryPaths {
    docs_dir: PathBuf,
    csv: PathBuf,
    json: PathBuf,
    metrics: PathBuf,
    checkpoint: PathBuf,
    items: PathBuf,
}

impl CategoryPaths {
    fn new(root: &Path, folder: &str) -> Self {
        Self {
            docs_dir: root.join("docs").join(folder),
            csv: root.join("csv").join(format!("{folder}_metadata.csv")),
            json: root.join("json").join(format!("{folder}_response.json")),
            metrics: root.join("metrics").join(format!("{folder}_metrics.json")),
            checkpoint: root
                .join("checkpoints")
                .join(format!("{folder}_checkpoint.json")),
            items: root.join("items").join(format!("{folder}_items.jsonl")),
        }
    }
}

/// Run every configured category in order. A failed category is reported and
/// does not stop the remaining ones; the command fails if any category did.
pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.to_config();
    let mut failed = Vec::new();

    for doc_type in &cli.doc_types {
        let folder = format!("{}_docs", doc_type.to_lowercase());
        info!(doc_type, folder, "Starting category run");

        match run_category(&config, doc_type, &folder).await {
            Ok(outcome) if outcome.summary.is_complete() => {
                info!(
                    doc_type,
                    collected = outcome.collected,
                    downloaded = outcome.summary.downloaded,
                    skipped = outcome.summary.skipped,
                    "Category complete"
                );
            }
            Ok(outcome) => {
                error!(
                    doc_type,
                    failed_items = outcome.summary.failed,
                    "Category finished with failed items"
                );
                failed.push(doc_type.clone());
            }
            Err(e) => {
                error!(doc_type, error = %e, "Category failed");
                failed.push(doc_type.clone());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::CategoriesFailed { failed })
    }
}

/// Fetch one document category end to end: pagination, content, reports,
/// metrics. The pacer, failure tracker and metrics context are created here
/// and shared by reference across both phases.
pub async fn run_category(
    config: &RunConfig,
    doc_type: &str,
    output_folder: &str,
) -> Result<CategoryOutcome, CliError> {
    let paths = CategoryPaths::new(&config.output_root, output_folder);

    let client = DmsClient::new(config)?;
    let store = ResumeStore::new(&paths.checkpoint, &paths.items);
    let mut pacer = Pacer::new(config.min_interval);
    let mut breaker = FailureTracker::new(config.failure_threshold, config.cooldown);
    let mut metrics = RunMetrics::new(doc_type);

    let items = {
        let mut driver = PaginationDriver::new(
            &client,
            config,
            &store,
            &mut pacer,
            &mut breaker,
            &mut metrics,
        );
        match driver.fetch_all(doc_type).await {
            Ok(items) => items,
            Err(e) => {
                // Resume state is already consistent on disk; surface the
                // category failure after persisting what we counted
                save_metrics(&mut metrics, &paths.metrics);
                return Err(e.into());
            }
        }
    };

    if items.is_empty() {
        info!(doc_type, "No documents found");
        save_metrics(&mut metrics, &paths.metrics);
        return Ok(CategoryOutcome {
            collected: 0,
            summary: ContentSummary::default(),
        });
    }
    info!(doc_type, collected = items.len(), "Pagination complete");

    let summary = {
        let mut fetcher = ContentFetcher::new(
            &client,
            config,
            &mut pacer,
            &mut breaker,
            &mut metrics,
        );
        fetcher.download_all(&items, &paths.docs_dir).await?
    };

    write_metadata_csv(&items, &paths.csv)?;
    write_response_json(&items, &paths.json)?;
    save_metrics(&mut metrics, &paths.metrics);

    Ok(CategoryOutcome {
        collected: items.len() as u64,
        summary,
    })
}

fn save_metrics(metrics: &mut RunMetrics, path: &Path) {
    metrics.finish();
    if let Err(e) = metrics.save(path) {
        warn!(path = %path.display(), error = %e, "Failed to save metrics summary");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_with_defaults() {
        let cli = Cli::parse_from([
            "dms-downloader",
            "--base-url",
            "https://erp.example.com/api",
            "--username",
            "svc",
            "--password",
            "secret",
        ]);
        assert_eq!(cli.doc_types, vec!["REPINV", "REPTEC"]);
        assert_eq!(cli.limit, 50);
        assert_eq!(cli.min_limit, 10);

        let config = cli.to_config();
        assert_eq!(config.min_interval, Duration::from_millis(250));
        assert_eq!(config.cooldown, Duration::from_secs(60));
    }

    #[test]
    fn test_cli_doc_types_override() {
        let cli = Cli::parse_from([
            "dms-downloader",
            "--base-url",
            "http://x",
            "--username",
            "u",
            "--password",
            "p",
            "--doc-type",
            "CONTR",
        ]);
        assert_eq!(cli.doc_types, vec!["CONTR"]);
    }

    #[test]
    fn test_category_paths_layout() {
        let paths = CategoryPaths::new(Path::new("artifacts"), "repinv_docs");
        assert_eq!(paths.docs_dir, Path::new("artifacts/docs/repinv_docs"));
        assert_eq!(
            paths.checkpoint,
            Path::new("artifacts/checkpoints/repinv_docs_checkpoint.json")
        );
        assert_eq!(
            paths.items,
            Path::new("artifacts/items/repinv_docs_items.jsonl")
        );
    }
}
