//! Binary artifact decoding and writing.

use super::{OutputError, OutputResult};
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Replace path separators in a server-supplied file name so it cannot
/// escape the target directory.
pub fn sanitize_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Strip a `data:<mime>;base64,` prefix when present.
fn strip_data_uri(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("data:") {
        if let Some(pos) = trimmed.find(";base64,") {
            return &trimmed[pos + ";base64,".len()..];
        }
    }
    trimmed
}

/// Decode a base64 payload into bytes, tolerating a data-URI prefix and
/// embedded whitespace.
pub fn decode_content(content: &str) -> OutputResult<Vec<u8>> {
    let payload: String = strip_data_uri(content)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| OutputError::Decode(e.to_string()))
}

/// Hex-encoded SHA-256 of the decoded content. Recorded for future
/// integrity/dedup use.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Whether a non-empty artifact already exists at `path`.
pub fn artifact_present(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}

/// Write the decoded bytes, creating parent directories as needed.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::Io(e.to_string()))?;
    }
    std::fs::write(path, bytes).map_err(|e| OutputError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_both_separator_styles() {
        assert_eq!(sanitize_file_name("a/b\\c.pdf"), "a_b_c.pdf");
        assert_eq!(sanitize_file_name("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn test_raw_and_data_uri_decode_identically() {
        let raw = decode_content("QUJD").unwrap();
        let prefixed = decode_content("data:application/pdf;base64,QUJD").unwrap();
        assert_eq!(raw, b"ABC");
        assert_eq!(raw, prefixed);
    }

    #[test]
    fn test_decode_tolerates_embedded_whitespace() {
        let decoded = decode_content("QU\nJD ").unwrap();
        assert_eq!(decoded, b"ABC");
    }

    #[test]
    fn test_invalid_base64_is_a_decode_error() {
        assert!(matches!(
            decode_content("@@@not-base64@@@"),
            Err(OutputError::Decode(_))
        ));
    }

    #[test]
    fn test_sha256_of_known_input() {
        assert_eq!(
            sha256_hex(b"ABC"),
            "b5d4045c3f466fa91fe2cc6abe79232a1a57cdf104f7a26e716e0a1e2789df78"
        );
    }

    #[test]
    fn test_artifact_present_requires_non_empty_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");

        assert!(!artifact_present(&path));
        std::fs::write(&path, b"").unwrap();
        assert!(!artifact_present(&path));
        std::fs::write(&path, b"x").unwrap();
        assert!(artifact_present(&path));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docs").join("repinv").join("doc.pdf");
        write_artifact(&path, b"ABC").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"ABC");
    }
}
