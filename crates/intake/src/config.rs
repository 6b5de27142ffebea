//! Pipeline configuration.
//!
//! One [`IntakeConfig`] is built at startup and handed to every stage.
//! All fields have defaults, so a JSON file only needs the values it
//! overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, Result};
use crate::template::SchemaRegistry;

/// Top-level configuration for an intake run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub parser: ParserConfig,
    pub detection: DetectionConfig,
    pub mapping: MappingConfig,
    pub validation: ValidationConfig,
    pub registry: SchemaRegistry,
}

impl IntakeConfig {
    /// Load a configuration file (JSON) and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| IntakeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: IntakeConfig = serde_json::from_str(&contents)
            .map_err(|e| IntakeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that thresholds and lists are usable.
    pub fn validate(&self) -> Result<()> {
        self.parser.validate()?;
        self.detection.validate()?;
        self.mapping.validate()?;
        self.validation.validate()?;
        self.registry.validate()
    }
}

/// How files are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Delimiters tried in priority order.
    pub delimiters: Vec<char>,
    /// Quote character for delimited text.
    pub quote: char,
    /// Workbook sheet to read (None = first sheet).
    pub sheet: Option<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiters: vec![',', ';', '\t', '|'],
            quote: '"',
            sheet: None,
        }
    }
}

impl ParserConfig {
    fn validate(&self) -> Result<()> {
        if self.delimiters.is_empty() {
            return Err(IntakeError::Config(
                "parser.delimiters must list at least one delimiter".to_string(),
            ));
        }
        if let Some(bad) = self
            .delimiters
            .iter()
            .chain(std::iter::once(&self.quote))
            .find(|c| !c.is_ascii())
        {
            return Err(IntakeError::Config(format!(
                "parser delimiters and quote must be ASCII, got {:?}",
                bad
            )));
        }
        Ok(())
    }
}

/// Template detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum score for a template to be accepted.
    pub acceptance_threshold: f64,
    /// Non-empty values sampled when tagging a column.
    pub sample_size: usize,
    /// Fraction of sampled values that must parse as the kind.
    pub kind_ratio: f64,
    /// Largest median gap (days) for dates to count as sequential.
    pub max_median_day_gap: f64,
    /// Coefficient of variation below which a column looks like a balance.
    pub running_balance_max_cv: f64,
    /// Minimum values for the running-balance check.
    pub running_balance_min_values: usize,
    /// Values sampled for the account-number check.
    pub account_sample_size: usize,
    /// Fraction of sampled values that must contain digits.
    pub account_digit_ratio: f64,
    /// Largest standard deviation of code lengths.
    pub account_max_length_std: f64,
    /// Fraction of rows where exactly one of a pair is non-zero.
    pub debit_credit_exclusivity: f64,
    /// Numeric columns with aging keywords needed for aging buckets.
    pub aging_min_columns: usize,
    /// Header keywords that mark aging buckets.
    pub aging_keywords: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.3,
            sample_size: 10,
            kind_ratio: 0.7,
            max_median_day_gap: 7.0,
            running_balance_max_cv: 2.0,
            running_balance_min_values: 3,
            account_sample_size: 20,
            account_digit_ratio: 0.7,
            account_max_length_std: 3.0,
            debit_credit_exclusivity: 0.6,
            aging_min_columns: 3,
            aging_keywords: ["current", "30", "60", "90", "120", "days", "aging"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<()> {
        check_unit("detection.acceptance_threshold", self.acceptance_threshold)?;
        check_unit("detection.kind_ratio", self.kind_ratio)?;
        check_unit("detection.account_digit_ratio", self.account_digit_ratio)?;
        check_unit(
            "detection.debit_credit_exclusivity",
            self.debit_credit_exclusivity,
        )?;
        if self.sample_size == 0 || self.account_sample_size == 0 {
            return Err(IntakeError::Config(
                "detection sample sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Column mapping thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Minimum similarity for a source column to be accepted.
    pub similarity_threshold: f64,
    /// Score for an exact normalized match.
    pub exact_score: f64,
    /// Score when one normalized name contains the other.
    pub substring_score: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            exact_score: 1.0,
            substring_score: 0.9,
        }
    }
}

impl MappingConfig {
    fn validate(&self) -> Result<()> {
        check_unit("mapping.similarity_threshold", self.similarity_threshold)?;
        check_unit("mapping.exact_score", self.exact_score)?;
        check_unit("mapping.substring_score", self.substring_score)
    }
}

/// Data-quality check parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Date layouts tried in order; the first that parses enough values wins.
    pub date_formats: Vec<String>,
    /// Fraction of non-null values a date layout must parse.
    pub date_parse_ratio: f64,
    /// Fraction of non-null values that must be numeric.
    pub numeric_ratio: f64,
    /// Field-name fragments that mark numeric fields.
    pub numeric_keywords: Vec<String>,
    /// Canonical fields used as the duplicate key when mapped.
    pub duplicate_key_fields: Vec<String>,
    /// Null fraction above which a field is flagged.
    pub max_null_fraction: f64,
    /// Row count below which the table is flagged as small.
    pub low_row_warning: usize,
    /// Minimum rows for a table to be considered structurally valid.
    pub min_rows: usize,
    /// Minimum columns for a table to be considered structurally valid.
    pub min_columns: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            date_formats: [
                "%Y-%m-%d",
                "%m/%d/%Y",
                "%d/%m/%Y",
                "%Y/%m/%d",
                "%m-%d-%Y",
                "%d-%m-%Y",
                "%b %d, %Y",
                "%B %d, %Y",
                "%d-%b-%Y",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            date_parse_ratio: 0.8,
            numeric_ratio: 0.8,
            numeric_keywords: ["amount", "quantity", "qty", "price", "balance", "total"]
                .into_iter()
                .map(String::from)
                .collect(),
            duplicate_key_fields: [
                "transaction_date",
                "invoice_number",
                "reference_number",
                "product_code",
                "account_code",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_null_fraction: 0.5,
            low_row_warning: 10,
            min_rows: 1,
            min_columns: 1,
        }
    }
}

impl ValidationConfig {
    fn validate(&self) -> Result<()> {
        if self.date_formats.is_empty() {
            return Err(IntakeError::Config(
                "validation.date_formats must list at least one format".to_string(),
            ));
        }
        check_unit("validation.date_parse_ratio", self.date_parse_ratio)?;
        check_unit("validation.numeric_ratio", self.numeric_ratio)?;
        check_unit("validation.max_null_fraction", self.max_null_fraction)
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(IntakeError::Config(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = IntakeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.acceptance_threshold, 0.3);
        assert_eq!(config.mapping.similarity_threshold, 0.6);
        assert_eq!(config.validation.date_formats.len(), 9);
        assert_eq!(config.parser.delimiters, vec![',', ';', '\t', '|']);
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{"mapping": {"similarity_threshold": 0.75}, "parser": {"sheet": "Data"}}"#;
        let config: IntakeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mapping.similarity_threshold, 0.75);
        assert_eq!(config.mapping.substring_score, 0.9);
        assert_eq!(config.parser.sheet.as_deref(), Some("Data"));
        assert_eq!(config.detection, DetectionConfig::default());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = IntakeConfig::default();
        config.detection.acceptance_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), "config_error");

        let mut config = IntakeConfig::default();
        config.validation.date_formats.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"validation": {{"low_row_warning": 3}}}}"#).unwrap();

        let config = IntakeConfig::load(file.path()).unwrap();
        assert_eq!(config.validation.low_row_warning, 3);

        let missing = IntakeConfig::load("/nonexistent/intake.json").unwrap_err();
        assert_eq!(missing.kind(), "io_error");
    }
}
