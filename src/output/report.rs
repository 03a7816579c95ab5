//! Metadata reports: CSV summary and content-free response JSON.

use super::{OutputError, OutputResult};
use crate::{DocumentItem, ListingResponse};
use std::path::Path;
use tracing::info;

/// Write one CSV row per item with the metadata fields of the wire format
/// (content excluded).
pub fn write_metadata_csv(items: &[DocumentItem], path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::Io(e.to_string()))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| OutputError::Csv(e.to_string()))?;
    writer
        .write_record([
            "id",
            "fileName",
            "mimeType",
            "docType",
            "companyId",
            "status",
            "revisionNo",
            "updatedAt",
            "updatedBy",
        ])
        .map_err(|e| OutputError::Csv(e.to_string()))?;

    for item in items {
        let last_update = item.last_update.as_ref();
        writer
            .write_record([
                item.id.as_str(),
                item.file_name.as_deref().unwrap_or(""),
                item.mime_type.as_deref().unwrap_or(""),
                item.doc_type.as_deref().unwrap_or(""),
                item.company_id.as_deref().unwrap_or(""),
                item.status.as_deref().unwrap_or(""),
                &item
                    .revision_no
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                last_update
                    .and_then(|u| u.updated_at.as_deref())
                    .unwrap_or(""),
                last_update
                    .and_then(|u| u.updated_by.as_deref())
                    .unwrap_or(""),
            ])
            .map_err(|e| OutputError::Csv(e.to_string()))?;
    }

    writer.flush().map_err(|e| OutputError::Io(e.to_string()))?;
    info!(path = %path.display(), rows = items.len(), "Metadata CSV saved");
    Ok(())
}

/// Write the full response shape as JSON with `fileContent` excluded from
/// every item to keep the file size bounded.
pub fn write_response_json(items: &[DocumentItem], path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::Io(e.to_string()))?;
    }

    let clean = ListingResponse {
        total: items.len() as u64,
        items: items.iter().map(DocumentItem::without_content).collect(),
    };
    let json = serde_json::to_string_pretty(&clean)
        .map_err(|e| OutputError::Serialization(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| OutputError::Io(e.to_string()))?;

    info!(path = %path.display(), items = items.len(), "Response JSON saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<DocumentItem> {
        serde_json::from_str(
            r#"[
                {
                    "id": "DOC-001",
                    "fileName": "a.pdf",
                    "mimeType": "application/pdf",
                    "docType": "REPINV",
                    "companyId": "P2",
                    "status": "APPROVED",
                    "revisionNo": 2,
                    "lastUpdate": {"updatedAt": "2024-05-01", "updatedBy": "jdoe"},
                    "fileContent": "QUJD"
                },
                {"id": "DOC-002"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_item() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("csv").join("repinv_metadata.csv");

        write_metadata_csv(&items(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,fileName,mimeType"));
        assert!(lines[1].contains("DOC-001"));
        assert!(lines[1].contains("jdoe"));
        // Missing fields come out as empty cells, not row errors
        assert!(lines[2].starts_with("DOC-002,,"));
    }

    #[test]
    fn test_response_json_excludes_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("json").join("repinv_response.json");

        write_response_json(&items(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["items"].as_array().unwrap().len(), 2);
        assert!(!text.contains("fileContent"));
    }
}
