//! Source file metadata.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How a file is read, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Delimited text (csv, tsv, txt).
    Delimited,
    /// Spreadsheet workbook (xlsx, xls, ods, ...).
    Workbook,
}

impl FileKind {
    /// Delimited text extensions.
    pub const DELIMITED_EXTENSIONS: &'static [&'static str] = &["csv", "tsv", "txt"];
    /// Workbook extensions.
    pub const WORKBOOK_EXTENSIONS: &'static [&'static str] =
        &["xlsx", "xlsm", "xls", "xlsb", "ods"];

    /// Classify an extension, with or without a leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let ext = normalize_extension(extension);
        if Self::DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Delimited)
        } else if Self::WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Workbook)
        } else {
            None
        }
    }
}

/// Lowercased extension without a leading dot.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// Extension of a path, lowercased, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Metadata about the source data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, csv-semicolon, tsv, psv, xlsx, ...).
    pub format: String,
    /// Sheet read from a workbook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub analyzed_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        contents: &[u8],
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash: content_hash(contents),
            size_bytes: contents.len() as u64,
            format,
            sheet: None,
            row_count,
            column_count,
            analyzed_at: Utc::now(),
        }
    }

    /// Metadata for a table that did not come from a file.
    pub fn in_memory(name: &str, row_count: usize, column_count: usize) -> Self {
        Self {
            file: name.to_string(),
            path: PathBuf::from(name),
            hash: String::new(),
            size_bytes: 0,
            format: "memory".to_string(),
            sheet: None,
            row_count,
            column_count,
            analyzed_at: Utc::now(),
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// `sha256:<hex>` digest of raw bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Summary of a file that never fails; problems land in `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_path: PathBuf,
    pub file_name: String,
    pub file_extension: String,
    pub file_size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_extension(".CSV"), Some(FileKind::Delimited));
        assert_eq!(FileKind::from_extension("xlsx"), Some(FileKind::Workbook));
        assert_eq!(FileKind::from_extension(".ods"), Some(FileKind::Workbook));
        assert_eq!(FileKind::from_extension(".pdf"), None);
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash(b"Date,Amount\n");
        assert!(a.starts_with("sha256:"));
        assert_eq!(a, content_hash(b"Date,Amount\n"));
        assert_ne!(a, content_hash(b"Date;Amount\n"));
    }

    #[test]
    fn test_metadata_file_name() {
        let meta = SourceMetadata::new(PathBuf::from("/tmp/bank.csv"), b"abc", "csv".into(), 1, 2);
        assert_eq!(meta.file, "bank.csv");
        assert_eq!(meta.size_bytes, 3);
        assert!(meta.sheet.is_none());
    }
}
