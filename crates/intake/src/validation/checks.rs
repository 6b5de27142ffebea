//! The data-quality checks.

use std::collections::HashSet;

use serde_json::{Map, Value as Json, json};

use super::report::{CheckResult, CheckStatus};
use crate::config::ValidationConfig;
use crate::input::values::{parse_amount, parse_date_with};
use crate::input::{Column, DataTable, Value};
use crate::mapping::{ColumnMapping, MappedView};

/// Everything a check may look at.
pub struct CheckContext<'a> {
    pub table: &'a DataTable,
    pub mapping: &'a ColumnMapping,
    pub required: &'a [String],
    pub config: &'a ValidationConfig,
}

impl<'a> CheckContext<'a> {
    fn view(&self) -> MappedView<'a> {
        MappedView::new(self.table, self.mapping)
    }
}

/// A single named data-quality rule.
pub trait DqCheck: Send + Sync {
    /// Key under which the result is stored in the report.
    fn name(&self) -> &'static str;

    /// Run the check. `None` means it does not apply and adds no entry.
    fn check(&self, ctx: &CheckContext<'_>) -> Option<CheckResult>;
}

/// Every required canonical field is mapped.
pub struct RequiredColumnsCheck;

impl DqCheck for RequiredColumnsCheck {
    fn name(&self) -> &'static str {
        "required_columns"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<CheckResult> {
        let missing: Vec<&str> = ctx
            .required
            .iter()
            .map(String::as_str)
            .filter(|field| ctx.mapping.source(field).is_none())
            .collect();

        Some(if missing.is_empty() {
            CheckResult::passed(
                "All required columns present",
                json!({ "required_columns": ctx.required }),
            )
        } else {
            CheckResult::failed(
                format!("Missing required columns: {}", missing.join(", ")),
                json!({ "missing_columns": missing }),
            )
        })
    }
}

/// Mapped date fields parse under one of the configured layouts.
pub struct DateFormatCheck;

impl DqCheck for DateFormatCheck {
    fn name(&self) -> &'static str {
        "date_formats"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<CheckResult> {
        let view = ctx.view();
        let fields: Vec<(&str, &Column)> = view
            .fields()
            .filter(|(field, _)| field.to_lowercase().contains("date"))
            .collect();
        if fields.is_empty() {
            return None;
        }

        let mut details = Map::new();
        let mut failed = Vec::new();

        for (field, column) in fields {
            let total = column.non_null().count();
            if total == 0 {
                details.insert(
                    field.to_string(),
                    json!({
                        "source_column": column.name,
                        "status": CheckStatus::Warning,
                        "message": "Column is empty",
                    }),
                );
                continue;
            }

            let accepted = ctx.config.date_formats.iter().find_map(|format| {
                let parsed = column
                    .non_null()
                    .filter(|v| date_parses(v, format))
                    .count();
                let share = parsed as f64 / total as f64;
                (share >= ctx.config.date_parse_ratio).then_some((format, share))
            });

            let entry = match accepted {
                Some((format, share)) => json!({
                    "source_column": column.name,
                    "status": CheckStatus::Passed,
                    "format": format,
                    "parsed_percentage": round2(share * 100.0),
                }),
                None => {
                    failed.push(field);
                    json!({
                        "source_column": column.name,
                        "status": CheckStatus::Failed,
                        "message": "Could not parse dates with standard formats",
                    })
                }
            };
            details.insert(field.to_string(), entry);
        }

        Some(if failed.is_empty() {
            CheckResult::passed("All date columns validated", Json::Object(details))
        } else {
            CheckResult::failed(
                format!("Date parsing failed for: {}", failed.join(", ")),
                Json::Object(details),
            )
        })
    }
}

/// Mapped amount-like fields hold numbers.
pub struct NumericColumnsCheck;

impl DqCheck for NumericColumnsCheck {
    fn name(&self) -> &'static str {
        "numeric_columns"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<CheckResult> {
        let view = ctx.view();
        let fields: Vec<(&str, &Column)> = view
            .fields()
            .filter(|(field, _)| {
                let lower = field.to_lowercase();
                ctx.config
                    .numeric_keywords
                    .iter()
                    .any(|kw| lower.contains(kw.as_str()))
            })
            .collect();
        if fields.is_empty() {
            return None;
        }

        let mut details = Map::new();
        let mut failed = Vec::new();

        for (field, column) in fields {
            let total = column.non_null().count();
            if total == 0 {
                details.insert(
                    field.to_string(),
                    json!({
                        "source_column": column.name,
                        "status": CheckStatus::Warning,
                        "message": "Column is empty",
                    }),
                );
                continue;
            }

            let numbers: Vec<f64> = column.non_null().filter_map(cell_amount).collect();
            let valid_percentage = numbers.len() as f64 / total as f64 * 100.0;

            let entry = if valid_percentage >= ctx.config.numeric_ratio * 100.0 {
                let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                json!({
                    "source_column": column.name,
                    "status": CheckStatus::Passed,
                    "valid_percentage": round2(valid_percentage),
                    "min": finite_or_null(min),
                    "max": finite_or_null(max),
                    "mean": finite_or_null(mean),
                })
            } else {
                failed.push(field);
                json!({
                    "source_column": column.name,
                    "status": CheckStatus::Failed,
                    "valid_percentage": round2(valid_percentage),
                    "message": format!("Only {:.1}% of values are valid numbers", valid_percentage),
                })
            };
            details.insert(field.to_string(), entry);
        }

        Some(if failed.is_empty() {
            CheckResult::passed("All numeric columns validated", Json::Object(details))
        } else {
            CheckResult::warning(
                format!("Numeric validation issues in: {}", failed.join(", ")),
                Json::Object(details),
            )
        })
    }
}

/// Duplicate rows on the mapped key fields, or whole-row duplicates.
pub struct DuplicatesCheck;

impl DqCheck for DuplicatesCheck {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<CheckResult> {
        let view = ctx.view();
        let key_columns: Vec<&Column> = view
            .fields()
            .filter(|(field, _)| ctx.config.duplicate_key_fields.iter().any(|k| k == field))
            .map(|(_, column)| column)
            .collect();

        let total_rows = ctx.table.row_count();
        let percentage = |count: usize| {
            if total_rows == 0 {
                0.0
            } else {
                round2(count as f64 / total_rows as f64 * 100.0)
            }
        };

        if key_columns.is_empty() {
            let all: Vec<&Column> = ctx.table.columns().iter().collect();
            let count = count_duplicates(&all, total_rows);
            return Some(if count > 0 {
                CheckResult::warning(
                    format!("Found {} exact duplicate rows", count),
                    json!({
                        "duplicate_count": count,
                        "duplicate_percentage": percentage(count),
                    }),
                )
            } else {
                CheckResult::passed("No duplicate rows found", json!({ "duplicate_count": 0 }))
            });
        }

        let names: Vec<&str> = key_columns.iter().map(|c| c.name.as_str()).collect();
        let count = count_duplicates(&key_columns, total_rows);
        Some(if count > 0 {
            CheckResult::warning(
                format!("Found {} duplicate rows based on key columns", count),
                json!({
                    "duplicate_count": count,
                    "duplicate_percentage": percentage(count),
                    "key_columns": names,
                }),
            )
        } else {
            CheckResult::passed(
                "No duplicates found in key columns",
                json!({ "duplicate_count": 0, "key_columns": names }),
            )
        })
    }
}

/// Share of empty cells per mapped field.
pub struct NullValuesCheck;

impl DqCheck for NullValuesCheck {
    fn name(&self) -> &'static str {
        "null_values"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<CheckResult> {
        let total_rows = ctx.table.row_count();
        let mut details = Map::new();
        let mut high = Vec::new();

        for (field, column) in ctx.view().fields() {
            let null_count = column.null_count();
            let fraction = if total_rows == 0 {
                0.0
            } else {
                null_count as f64 / total_rows as f64
            };

            details.insert(
                field.to_string(),
                json!({
                    "source_column": column.name,
                    "null_count": null_count,
                    "null_percentage": round2(fraction * 100.0),
                }),
            );

            if fraction > ctx.config.max_null_fraction {
                high.push(field);
            }
        }

        Some(if high.is_empty() {
            CheckResult::passed("Null values within acceptable limits", Json::Object(details))
        } else {
            CheckResult::warning(
                format!("High null percentage in: {}", high.join(", ")),
                Json::Object(details),
            )
        })
    }
}

/// Enough rows to be worth processing.
pub struct RowCountCheck;

impl DqCheck for RowCountCheck {
    fn name(&self) -> &'static str {
        "row_count"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Option<CheckResult> {
        let rows = ctx.table.row_count();
        let min = ctx.config.min_rows.max(1);

        Some(if rows < min {
            CheckResult::failed(
                format!("Insufficient data: only {} rows", rows),
                json!({ "row_count": rows, "min_required": min }),
            )
        } else if rows < ctx.config.low_row_warning {
            CheckResult::warning(
                format!(
                    "Low row count: {} rows (recommend {}+)",
                    rows, ctx.config.low_row_warning
                ),
                json!({ "row_count": rows }),
            )
        } else {
            CheckResult::passed(
                format!("Row count acceptable: {} rows", rows),
                json!({ "row_count": rows }),
            )
        })
    }
}

fn date_parses(value: &Value, format: &str) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Text(s) => parse_date_with(s, format).is_some(),
        _ => false,
    }
}

fn cell_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Text(s) => parse_amount(s),
        _ => None,
    }
}

/// Rows whose key has already been seen.
fn count_duplicates(columns: &[&Column], rows: usize) -> usize {
    let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(rows);
    (0..rows)
        .filter(|&row| {
            let key: Vec<String> = columns.iter().map(|c| c.values[row].key()).collect();
            !seen.insert(key)
        })
        .count()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn finite_or_null(value: f64) -> Json {
    if value.is_finite() { json!(value) } else { Json::Null }
}
