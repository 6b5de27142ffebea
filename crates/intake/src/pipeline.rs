//! The intake pipeline: parse, detect, map, validate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::IntakeConfig;
use crate::detect::{Detection, DetectionReport, TemplateDetector, TemplateScore};
use crate::error::{IntakeError, Result};
use crate::input::{DataTable, Parser, SourceMetadata, content_hash, extension_of, validate_table};
use crate::mapping::{ColumnMapper, ColumnMapping, FieldMatch, MappedView};
use crate::template::TemplateType;
use crate::validation::{CheckStatus, DqReport, DqValidator};

/// A classified, mapped and validated table.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeOutcome {
    pub source: SourceMetadata,
    pub table: DataTable,
    pub template_type: TemplateType,
    pub detection_confidence: f64,
    /// Every template's score, in declaration order.
    pub detection_scores: Vec<TemplateScore>,
    pub column_mapping: ColumnMapping,
    pub mapping_confidence: f64,
    pub field_matches: Vec<FieldMatch>,
    pub dq_report: DqReport,
    /// SHA-256 of the table serialized as JSON records.
    pub data_hash: String,
}

impl IntakeOutcome {
    /// Canonical-field view over the table.
    pub fn mapped_view(&self) -> MappedView<'_> {
        MappedView::new(&self.table, &self.column_mapping)
    }

    /// Date layout accepted per canonical date field.
    pub fn date_formats(&self) -> IndexMap<String, String> {
        let Some(check) = self.dq_report.check("date_formats") else {
            return IndexMap::new();
        };
        check
            .details
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|(field, detail)| {
                        detail
                            .get("format")
                            .and_then(|f| f.as_str())
                            .map(|f| (field.clone(), f.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The intake engine. Stateless between runs; share it freely.
pub struct Intake {
    config: IntakeConfig,
    parser: Parser,
    detector: TemplateDetector,
    mapper: ColumnMapper,
    validator: DqValidator,
}

impl Intake {
    /// Build every stage from one configuration.
    pub fn new(config: IntakeConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let detector = TemplateDetector::from_config(&config);
        let mapper = ColumnMapper::from_config(&config);
        let validator = DqValidator::from_config(&config);

        Self {
            config,
            parser,
            detector,
            mapper,
            validator,
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn detector(&self) -> &TemplateDetector {
        &self.detector
    }

    pub fn mapper(&self) -> &ColumnMapper {
        &self.mapper
    }

    pub fn validator(&self) -> &DqValidator {
        &self.validator
    }

    /// Run the pipeline on a file, deriving the format from its extension.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<IntakeOutcome> {
        let path = path.as_ref();
        self.run_intake(path, &extension_of(path))
    }

    /// Run the pipeline on a file whose format is given by `extension`.
    pub fn run_intake(&self, path: impl AsRef<Path>, extension: &str) -> Result<IntakeOutcome> {
        let path = path.as_ref();
        let span = tracing::info_span!("intake", file = %path.display());
        let _guard = span.enter();

        let (table, source) = self.parser.parse_file(path, extension)?;
        self.run_table(table, source)
    }

    /// Parse and detect only.
    pub fn detect(&self, path: impl AsRef<Path>) -> Result<(SourceMetadata, DetectionReport)> {
        let (table, source) = self.parser.parse_path(path)?;
        Ok((source, self.detector.detect_with_scores(&table)))
    }

    /// Run detection, mapping and validation on an already parsed table.
    pub fn run_table(&self, table: DataTable, source: SourceMetadata) -> Result<IntakeOutcome> {
        if let Err(issue) = validate_table(
            &table,
            self.config.validation.min_rows,
            self.config.validation.min_columns,
        ) {
            tracing::warn!("Table structure: {}", issue);
        }

        let report = self.detector.detect_with_scores(&table);
        let (template, confidence) = match report.detection {
            Detection::Matched {
                template,
                confidence,
            } => (template, confidence),
            Detection::NoMatch {
                best_candidate,
                best_score,
            } => {
                tracing::warn!(
                    "No template matched (best {:?} at {:.2})",
                    best_candidate,
                    best_score
                );
                return Err(IntakeError::NoTemplateMatch {
                    best_candidate,
                    best_score,
                    threshold: self.detector.threshold(),
                });
            }
        };
        tracing::info!("Detected {} (confidence {:.2})", template, confidence);

        let headers = table.headers();
        let mapped = self.mapper.map_columns(&headers, template);
        let validation = self.mapper.validate_mappings(&mapped.mapping, template);
        if !validation.valid {
            tracing::warn!(
                "Missing required columns for {}: {}",
                template,
                validation.missing.join(", ")
            );
            return Err(IntakeError::MissingRequiredColumns {
                template,
                missing: validation.missing,
                mapping: mapped.mapping,
            });
        }
        tracing::info!(
            "Mapped {} of {} fields (confidence {:.2})",
            mapped.mapping.mapped_count(),
            mapped.mapping.len(),
            mapped.confidence
        );

        let dq_report = self.validator.validate(&table, template, &mapped.mapping);
        match dq_report.status {
            CheckStatus::Passed => tracing::info!("DQ passed"),
            status => tracing::info!(
                "DQ {} ({} errors, {} warnings)",
                status,
                dq_report.error_count,
                dq_report.warning_count
            ),
        }

        let data_hash = content_hash(&serde_json::to_vec(&table.records())?);

        Ok(IntakeOutcome {
            source,
            table,
            template_type: template,
            detection_confidence: confidence,
            detection_scores: report.scores,
            column_mapping: mapped.mapping,
            mapping_confidence: mapped.confidence,
            field_matches: mapped.matches,
            dq_report,
            data_hash,
        })
    }
}

impl Default for Intake {
    fn default() -> Self {
        Self::new(IntakeConfig::default())
    }
}

/// Run the pipeline with the default configuration.
pub fn run_intake(path: impl AsRef<Path>, extension: &str) -> Result<IntakeOutcome> {
    Intake::default().run_intake(path, extension)
}

/// Run the pipeline on a blocking worker and await it.
pub async fn run_intake_async(
    intake: Arc<Intake>,
    path: PathBuf,
    extension: String,
) -> Result<IntakeOutcome> {
    tokio::task::spawn_blocking(move || intake.run_intake(&path, &extension))
        .await
        .map_err(|e| IntakeError::Worker(e.to_string()))?
}
