//! Error types for the intake pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::mapping::ColumnMapping;
use crate::template::TemplateType;

/// Main error type for intake operations.
///
/// Two variants are *soft* terminal outcomes rather than failures:
/// [`IntakeError::NoTemplateMatch`] and [`IntakeError::MissingRequiredColumns`].
/// They are common for real-world uploads and carry enough detail for the
/// caller to tell the user what to fix. See [`IntakeError::is_soft`].
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The path does not resolve to a readable file.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Corrupt content, empty result or no usable delimiter.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from the workbook reader.
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// No template type reached the acceptance threshold.
    #[error(
        "No template matched (best candidate: {}, score {best_score:.2}, threshold {threshold:.2})",
        candidate_label(.best_candidate)
    )]
    NoTemplateMatch {
        best_candidate: Option<TemplateType>,
        best_score: f64,
        threshold: f64,
    },

    /// Required canonical fields could not be mapped to source columns.
    #[error("Missing required columns for {template}: {}", .missing.join(", "))]
    MissingRequiredColumns {
        template: TemplateType,
        missing: Vec<String>,
        mapping: ColumnMapping,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mapping memory could not be loaded or saved.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A pipeline worker task did not complete.
    #[error("Worker error: {0}")]
    Worker(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntakeError {
    /// Returns true for expected terminal outcomes that are not failures.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            IntakeError::NoTemplateMatch { .. } | IntakeError::MissingRequiredColumns { .. }
        )
    }

    /// Stable machine-readable tag for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::FileNotFound { .. } => "file_not_found",
            IntakeError::Io { .. } => "io_error",
            IntakeError::UnsupportedFormat(_)
            | IntakeError::Parse(_)
            | IntakeError::Csv(_)
            | IntakeError::Workbook(_) => "parse_error",
            IntakeError::NoTemplateMatch { .. } => "no_template_match",
            IntakeError::MissingRequiredColumns { .. } => "missing_required_columns",
            IntakeError::Config(_) => "config_error",
            IntakeError::Persistence(_) | IntakeError::Json(_) => "persistence_error",
            IntakeError::Worker(_) => "worker_error",
        }
    }
}

fn candidate_label(candidate: &Option<TemplateType>) -> &'static str {
    candidate.as_ref().map_or("none", TemplateType::as_str)
}

/// Result type alias for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_outcomes() {
        let no_match = IntakeError::NoTemplateMatch {
            best_candidate: Some(TemplateType::PosSales),
            best_score: 0.2,
            threshold: 0.3,
        };
        assert!(no_match.is_soft());
        assert_eq!(no_match.kind(), "no_template_match");
        assert!(no_match.to_string().contains("POS_Sales"));

        let parse = IntakeError::Parse("empty".to_string());
        assert!(!parse.is_soft());
        assert_eq!(parse.kind(), "parse_error");
        assert_eq!(IntakeError::UnsupportedFormat(".pdf".into()).kind(), "parse_error");
    }

    #[test]
    fn test_missing_columns_message_lists_fields() {
        let err = IntakeError::MissingRequiredColumns {
            template: TemplateType::ApOpenItems,
            missing: vec!["amount".to_string()],
            mapping: ColumnMapping::default(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns for AP_OpenItems: amount"
        );
    }
}
