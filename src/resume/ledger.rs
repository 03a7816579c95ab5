//! Append-only item ledger.
//!
//! One JSON record per line, one line per collected item, content excluded.
//! Appends happen before the pagination driver advances its in-memory offset,
//! so a crash between "items received" and "offset persisted" loses nothing;
//! at worst the next run replays an already-confirmed page read.

use super::{ResumeError, ResumeResult};
use crate::DocumentItem;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable ordered sequence of collected items for one category.
#[derive(Debug)]
pub struct ItemLedger {
    path: PathBuf,
}

impl ItemLedger {
    /// Create a ledger backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every ledger record, in append order. A missing file is an
    /// empty ledger; a corrupt line is an error, not silently dropped, since
    /// the record count doubles as the resume offset.
    pub fn load(&self) -> ResumeResult<Vec<DocumentItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path).map_err(|e| ResumeError::Io(e.to_string()))?;
        let reader = BufReader::new(file);

        let mut items = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| ResumeError::Io(e.to_string()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let item = serde_json::from_str(line).map_err(|e| ResumeError::CorruptLedger {
                line: index + 1,
                reason: e.to_string(),
            })?;
            items.push(item);
        }

        debug!(path = %self.path.display(), records = items.len(), "Ledger loaded");
        Ok(items)
    }

    /// Durably append records for `items`, content stripped, flushing before
    /// returning.
    pub fn append(&self, items: &[DocumentItem]) -> ResumeResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ResumeError::Io(e.to_string()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ResumeError::Io(e.to_string()))?;
        let mut writer = std::io::BufWriter::new(file);

        for item in items {
            let record = serde_json::to_string(&item.without_content())
                .map_err(|e| ResumeError::Serialization(e.to_string()))?;
            writeln!(writer, "{record}").map_err(|e| ResumeError::Io(e.to_string()))?;
        }
        writer.flush().map_err(|e| ResumeError::Io(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| ResumeError::Io(e.to_string()))?
            .sync_all()
            .map_err(|e| ResumeError::Io(e.to_string()))?;

        debug!(path = %self.path.display(), appended = items.len(), "Ledger appended");
        Ok(())
    }
}
