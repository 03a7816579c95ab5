//! Per-run accounting context.
//!
//! One [`RunMetrics`] instance is created per document-category run and passed
//! by mutable reference through every operation that can observe a retryable
//! event. There is no global recorder; tests inject a fresh context and read
//! it back directly. The summary is written to disk once at run end.

use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Mutable counter bag shared across both phases of one category run.
#[derive(Debug, Default, Serialize)]
pub struct RunMetrics {
    /// Document-type code this run covers
    pub doc_type: String,
    /// Wall-clock start of the run
    pub started_at: String,
    /// Wall-clock end of the run, set by [`RunMetrics::finish`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// Requests issued (both listing and single-item)
    pub requests_total: u64,
    /// HTTP 429 responses received
    pub http_429: u64,
    /// HTTP 5xx responses received
    pub http_5xx: u64,
    /// Responses outside the retryable set (bad status or content type)
    pub http_other: u64,
    /// Network timeouts
    pub timeouts: u64,
    /// Accumulated request latency in milliseconds
    pub latency_ms_total: u64,
    /// Items reconstructed from the ledger at startup
    pub resumed_items: u64,
    /// Artifacts written by the content phase
    pub files_downloaded: u64,
    /// Artifacts skipped because they already existed
    pub files_skipped: u64,
    /// Items whose content could not be obtained or decoded
    pub files_failed: u64,
    /// Total decoded bytes written
    pub bytes_downloaded: u64,
    /// Total time spent sleeping (pacing, backoff, cooldown)
    pub sleep_seconds: f64,
}

impl RunMetrics {
    /// Create a fresh context for one category run.
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            started_at: now_stamp(),
            ..Self::default()
        }
    }

    /// Record one issued request and its latency.
    pub fn record_request(&mut self, latency_ms: u64) {
        self.requests_total += 1;
        self.latency_ms_total += latency_ms;
    }

    /// Record time spent sleeping.
    pub fn record_sleep(&mut self, seconds: f64) {
        self.sleep_seconds += seconds;
    }

    /// Record one written artifact.
    pub fn record_download(&mut self, bytes: u64) {
        self.files_downloaded += 1;
        self.bytes_downloaded += bytes;
    }

    /// Stamp the end of the run.
    pub fn finish(&mut self) {
        self.finished_at = Some(now_stamp());
    }

    /// Write the summary as pretty JSON. Called once at run end.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Metrics summary saved");
        Ok(())
    }
}

fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let mut metrics = RunMetrics::new("REPINV");
        metrics.record_request(120);
        metrics.record_request(80);
        metrics.record_download(1024);
        metrics.record_sleep(0.25);
        metrics.record_sleep(1.5);

        assert_eq!(metrics.requests_total, 2);
        assert_eq!(metrics.latency_ms_total, 200);
        assert_eq!(metrics.files_downloaded, 1);
        assert_eq!(metrics.bytes_downloaded, 1024);
        assert!((metrics.sleep_seconds - 1.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_save_writes_json_summary() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("metrics").join("repinv_metrics.json");

        let mut metrics = RunMetrics::new("REPINV");
        metrics.record_request(10);
        metrics.finish();
        metrics.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["doc_type"], "REPINV");
        assert_eq!(value["requests_total"], 1);
        assert!(value["finished_at"].is_string());
    }
}
