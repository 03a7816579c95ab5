//! Resumable cursor over checkpoint and ledger.
//!
//! The checkpoint records the offset the driver reached; the ledger records
//! the items behind that offset. [`ResumeStore::load`] reconciles the two in
//! one place: the effective start offset is the larger of the two views and
//! never decreases across a resumed run.

use super::checkpoint::Checkpoint;
use super::ledger::ItemLedger;
use super::ResumeResult;
use crate::DocumentItem;
use std::path::PathBuf;
use tracing::info;

/// Durable pagination cursor for one document category.
#[derive(Debug)]
pub struct ResumeStore {
    checkpoint_path: PathBuf,
    ledger: ItemLedger,
}

/// State reconstructed by [`ResumeStore::load`].
#[derive(Debug)]
pub struct ResumeState {
    /// Items already collected in previous runs, in page order
    pub items: Vec<DocumentItem>,
    /// Effective offset to resume pagination from
    pub start_offset: u64,
}

impl ResumeStore {
    /// Create a store over the given checkpoint and ledger files.
    pub fn new(checkpoint_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_path: checkpoint_path.into(),
            ledger: ItemLedger::new(ledger_path),
        }
    }

    /// Reconstruct already-collected state. Missing files mean a fresh run;
    /// an unparsable checkpoint degrades to the ledger's view.
    pub fn load(&self) -> ResumeResult<ResumeState> {
        let items = self.ledger.load()?;
        let ledger_offset = items.len() as u64;

        let checkpoint_offset = Checkpoint::load(&self.checkpoint_path)
            .map(|cp| cp.start)
            .unwrap_or(0);

        let start_offset = ledger_offset.max(checkpoint_offset);
        if start_offset > 0 {
            info!(
                ledger_records = ledger_offset,
                checkpoint_start = checkpoint_offset,
                start_offset,
                "Resuming previous run"
            );
        }

        Ok(ResumeState {
            items,
            start_offset,
        })
    }

    /// Durably append newly fetched items. Must be called before the caller
    /// advances its in-memory offset.
    pub fn append_items(&self, items: &[DocumentItem]) -> ResumeResult<()> {
        self.ledger.append(items)
    }

    /// Overwrite the checkpoint with the current cursor position.
    pub fn save_checkpoint(&self, start: u64, total: u64, collected: u64) -> ResumeResult<()> {
        Checkpoint::new(start, total, collected).save(&self.checkpoint_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> DocumentItem {
        serde_json::from_str(&format!(r#"{{"id": "{id}"}}"#)).unwrap()
    }

    fn store_in(dir: &std::path::Path) -> ResumeStore {
        ResumeStore::new(dir.join("checkpoint.json"), dir.join("items.jsonl"))
    }

    #[test]
    fn test_fresh_run_starts_at_zero() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = store_in(dir.path()).load().unwrap();
        assert_eq!(state.start_offset, 0);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_offset_is_max_of_ledger_and_checkpoint() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_in(dir.path());

        store.append_items(&[item("A"), item("B"), item("C")]).unwrap();
        store.save_checkpoint(2, 10, 2).unwrap();

        // Ledger is ahead of the checkpoint: crash happened between the
        // ledger append and the checkpoint overwrite
        let state = store.load().unwrap();
        assert_eq!(state.start_offset, 3);
        assert_eq!(state.items.len(), 3);

        // Checkpoint ahead of ledger never happens in normal operation, but
        // the cursor still takes the max
        store.save_checkpoint(7, 10, 7).unwrap();
        assert_eq!(store.load().unwrap().start_offset, 7);
    }

    #[test]
    fn test_unparsable_checkpoint_degrades_to_ledger() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_in(dir.path());

        store.append_items(&[item("A"), item("B")]).unwrap();
        std::fs::write(dir.path().join("checkpoint.json"), "garbage").unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.start_offset, 2);
    }

    #[test]
    fn test_offset_never_decreases_across_resumes() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = store_in(dir.path());

        store.append_items(&[item("A"), item("B")]).unwrap();
        store.save_checkpoint(2, 5, 2).unwrap();
        let first = store.load().unwrap().start_offset;

        store.append_items(&[item("C")]).unwrap();
        store.save_checkpoint(3, 5, 3).unwrap();
        let second = store.load().unwrap().start_offset;

        assert!(second >= first);
        assert_eq!(second, 3);
    }
}
