//! Page-level checkpoint persistence.

use super::{ResumeError, ResumeResult};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Pagination progress for one category, overwritten after each successful
/// page. Owned exclusively by the pagination driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Next page offset to request
    pub start: u64,
    /// Total reported by the server on the last successful page
    pub total: u64,
    /// Items collected so far
    pub collected: u64,
    /// Wall-clock time of the last update
    pub updated_at: String,
}

impl Checkpoint {
    /// Create a checkpoint stamped with the current time.
    pub fn new(start: u64, total: u64, collected: u64) -> Self {
        Self {
            start,
            total,
            collected,
            updated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Load a checkpoint. A missing or unparsable file loads as `None`; an
    /// interrupted run must never be blocked by a half-written checkpoint.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Unparsable checkpoint ignored, starting from ledger state"
                );
                None
            }
        }
    }

    /// Overwrite the checkpoint file. The JSON is written to a temp file in
    /// the same directory and renamed into place so a crash mid-write leaves
    /// the previous checkpoint intact.
    pub fn save(&self, path: &Path) -> ResumeResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ResumeError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ResumeError::Serialization(e.to_string()))?;

        let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| ResumeError::Io(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| ResumeError::Io(format!("failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| ResumeError::Io(format!("failed to flush temp file: {e}")))?;
        temp_file
            .persist(path)
            .map_err(|e| ResumeError::Io(format!("failed to persist checkpoint: {e}")))?;

        debug!(
            path = %path.display(),
            start = self.start,
            collected = self.collected,
            "Checkpoint saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("checkpoints").join("repinv_checkpoint.json");

        let checkpoint = Checkpoint::new(150, 420, 150);
        checkpoint.save(&path).unwrap();

        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Checkpoint::load(&dir.path().join("absent.json")).is_none());
    }

    #[test]
    fn test_unparsable_file_loads_as_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Checkpoint::load(&path).is_none());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cp.json");

        Checkpoint::new(50, 120, 50).save(&path).unwrap();
        Checkpoint::new(100, 120, 100).save(&path).unwrap();

        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded.start, 100);
        assert_eq!(loaded.collected, 100);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_string(&Checkpoint::new(10, 20, 10)).unwrap();
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"start\""));
    }
}
