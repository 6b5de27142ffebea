//! Runs the check battery and assembles the report.

use super::checks::{
    CheckContext, DateFormatCheck, DqCheck, DuplicatesCheck, NullValuesCheck,
    NumericColumnsCheck, RequiredColumnsCheck, RowCountCheck,
};
use super::report::DqReport;
use crate::config::{IntakeConfig, ValidationConfig};
use crate::input::DataTable;
use crate::mapping::ColumnMapping;
use crate::template::{SchemaRegistry, TemplateType};

/// Data-quality validator.
///
/// Checks run in a fixed order; the order is visible in the report and in
/// its running tallies.
pub struct DqValidator {
    config: ValidationConfig,
    registry: SchemaRegistry,
    checks: Vec<Box<dyn DqCheck>>,
}

impl DqValidator {
    /// Validator with the standard six checks.
    pub fn new(config: ValidationConfig, registry: SchemaRegistry) -> Self {
        Self {
            config,
            registry,
            checks: vec![
                Box::new(RequiredColumnsCheck),
                Box::new(DateFormatCheck),
                Box::new(NumericColumnsCheck),
                Box::new(DuplicatesCheck),
                Box::new(NullValuesCheck),
                Box::new(RowCountCheck),
            ],
        }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.validation.clone(), config.registry.clone())
    }

    /// Append a custom check after the standard ones.
    pub fn with_check(mut self, check: impl DqCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Validate a mapped table.
    pub fn validate(
        &self,
        table: &DataTable,
        template: TemplateType,
        mapping: &ColumnMapping,
    ) -> DqReport {
        let required = self.registry.required_fields(template);
        let ctx = CheckContext {
            table,
            mapping,
            required: &required,
            config: &self.config,
        };

        let mut report = DqReport::new();
        for check in &self.checks {
            if let Some(result) = check.check(&ctx) {
                tracing::debug!("DQ check {}: {}", check.name(), result.status);
                report.add_check(check.name(), result);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Column;
    use crate::validation::{CheckResult, CheckStatus};
    use serde_json::json;

    fn bank_table(rows: usize) -> DataTable {
        let dates: Vec<String> = (1..=rows).map(|d| format!("2025-01-{:02}", d)).collect();
        let memos: Vec<String> = (1..=rows).map(|i| format!("Payment {}", i)).collect();
        let dates: Vec<&str> = dates.iter().map(String::as_str).collect();
        let memos: Vec<&str> = memos.iter().map(String::as_str).collect();
        DataTable::new(vec![
            Column::from_raw("Date", &dates),
            Column::from_raw("Description", &memos),
        ])
    }

    fn bank_mapping() -> ColumnMapping {
        [
            ("transaction_date", Some("Date")),
            ("description", Some("Description")),
            ("debit_amount", None),
        ]
        .into_iter()
        .map(|(f, s)| (f.to_string(), s.map(String::from)))
        .collect()
    }

    #[test]
    fn test_clean_table_passes() {
        let validator = DqValidator::from_config(&IntakeConfig::default());
        let report = validator.validate(&bank_table(12), TemplateType::BankStatement, &bank_mapping());
        assert_eq!(report.status, CheckStatus::Passed);
        assert_eq!(
            report.checks.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["required_columns", "date_formats", "duplicates", "null_values", "row_count"]
        );
    }

    #[test]
    fn test_small_table_warns() {
        let validator = DqValidator::from_config(&IntakeConfig::default());
        let report = validator.validate(&bank_table(3), TemplateType::BankStatement, &bank_mapping());
        assert_eq!(report.status, CheckStatus::Warning);
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.error_count, 0);
    }

    struct AlwaysFails;

    impl DqCheck for AlwaysFails {
        fn name(&self) -> &'static str {
            "custom"
        }

        fn check(&self, _ctx: &CheckContext<'_>) -> Option<CheckResult> {
            Some(CheckResult::failed("nope", json!({})))
        }
    }

    #[test]
    fn test_custom_check_runs_last() {
        let validator = DqValidator::from_config(&IntakeConfig::default()).with_check(AlwaysFails);
        let report = validator.validate(&bank_table(12), TemplateType::BankStatement, &bank_mapping());
        assert_eq!(report.status, CheckStatus::Failed);
        assert_eq!(report.checks.keys().last().map(String::as_str), Some("custom"));
    }
}
