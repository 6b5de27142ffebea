//! Greedy canonical-field to source-column mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::similarity::similarity;
use crate::config::{IntakeConfig, MappingConfig};
use crate::input::{Column, DataTable};
use crate::template::{SchemaRegistry, TemplateType};

/// Canonical field name to source column, in schema order.
///
/// Unmapped fields are present with `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(IndexMap<String, Option<String>>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, source: Option<String>) {
        self.0.insert(field.into(), source);
    }

    /// Source column mapped to a field.
    pub fn source(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|s| s.as_deref())
    }

    /// Whether the field is part of the mapping (mapped or not).
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Mapped fields only.
    pub fn mapped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter_map(|(k, v)| v.map(|v| (k, v)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn mapped_count(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }

    /// Mapped fields over all fields; zero for an empty mapping.
    pub fn confidence(&self) -> f64 {
        if self.0.is_empty() {
            0.0
        } else {
            self.mapped_count() as f64 / self.0.len() as f64
        }
    }
}

impl FromIterator<(String, Option<String>)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Best candidate found for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub source: Option<String>,
    pub score: f64,
}

/// Mapping for one table plus the per-field scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub template: TemplateType,
    pub mapping: ColumnMapping,
    pub matches: Vec<FieldMatch>,
    pub confidence: f64,
}

/// Whether every required field is mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingValidation {
    pub valid: bool,
    pub missing: Vec<String>,
}

/// Maps raw headers onto a template's canonical fields.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    config: MappingConfig,
    registry: SchemaRegistry,
}

impl ColumnMapper {
    pub fn new(config: MappingConfig, registry: SchemaRegistry) -> Self {
        Self { config, registry }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.mapping.clone(), config.registry.clone())
    }

    /// Map source headers onto the template's fields.
    ///
    /// Fields are processed in schema order; each takes the best-scoring
    /// unused column at or above the similarity threshold, and that column
    /// leaves the pool.
    pub fn map_columns<S: AsRef<str>>(&self, sources: &[S], template: TemplateType) -> MappingResult {
        let Some(spec) = self.registry.spec(template) else {
            return MappingResult {
                template,
                mapping: ColumnMapping::new(),
                matches: Vec::new(),
                confidence: 0.0,
            };
        };

        let mut used = vec![false; sources.len()];
        let mut mapping = ColumnMapping::new();
        let mut matches = Vec::with_capacity(spec.fields.len());

        for field in &spec.fields {
            let mut best: Option<(usize, f64)> = None;
            for (idx, source) in sources.iter().enumerate() {
                if used[idx] {
                    continue;
                }
                let score = similarity(source.as_ref(), &field.synonyms, &self.config);
                if score >= self.config.similarity_threshold
                    && best.is_none_or(|(_, b)| score > b)
                {
                    best = Some((idx, score));
                }
            }

            let chosen = best.map(|(idx, _)| {
                used[idx] = true;
                sources[idx].as_ref().to_string()
            });
            let score = best.map_or(0.0, |(_, s)| s);

            tracing::debug!(
                "Field {}.{} -> {:?} ({:.2})",
                template,
                field.name,
                chosen,
                score
            );

            mapping.insert(field.name.clone(), chosen.clone());
            matches.push(FieldMatch {
                field: field.name.clone(),
                source: chosen,
                score,
            });
        }

        let confidence = mapping.confidence();
        MappingResult {
            template,
            mapping,
            matches,
            confidence,
        }
    }

    /// Required fields for a template.
    pub fn required_fields(&self, template: TemplateType) -> Vec<String> {
        self.registry.required_fields(template)
    }

    /// Check that every required field is mapped. Pure; does not change the mapping.
    pub fn validate_mappings(
        &self,
        mapping: &ColumnMapping,
        template: TemplateType,
    ) -> MappingValidation {
        let missing: Vec<String> = self
            .required_fields(template)
            .into_iter()
            .filter(|field| mapping.source(field).is_none())
            .collect();

        MappingValidation {
            valid: missing.is_empty(),
            missing,
        }
    }
}

/// Canonical-field view over a table. Borrows; copies nothing.
#[derive(Debug, Clone, Copy)]
pub struct MappedView<'a> {
    table: &'a DataTable,
    mapping: &'a ColumnMapping,
}

impl<'a> MappedView<'a> {
    pub fn new(table: &'a DataTable, mapping: &'a ColumnMapping) -> Self {
        Self { table, mapping }
    }

    /// Column behind a canonical field, if mapped and present.
    pub fn column(&self, field: &str) -> Option<&'a Column> {
        self.mapping
            .source(field)
            .and_then(|source| self.table.column(source))
    }

    /// Mapped canonical fields with their columns, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Column)> + '_ {
        self.mapping
            .mapped()
            .filter_map(|(field, source)| self.table.column(source).map(|c| (field, c)))
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }
}
