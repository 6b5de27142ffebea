//! Data-quality report types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single check. Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Warning => "warning",
            CheckStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one named check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    /// Structured payload; always a JSON object.
    pub details: Value,
}

impl CheckResult {
    pub fn new(status: CheckStatus, message: impl Into<String>, details: Value) -> Self {
        Self {
            status,
            message: message.into(),
            details,
        }
    }

    pub fn passed(message: impl Into<String>, details: Value) -> Self {
        Self::new(CheckStatus::Passed, message, details)
    }

    pub fn warning(message: impl Into<String>, details: Value) -> Self {
        Self::new(CheckStatus::Warning, message, details)
    }

    pub fn failed(message: impl Into<String>, details: Value) -> Self {
        Self::new(CheckStatus::Failed, message, details)
    }
}

/// Ordered collection of check results with a running status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqReport {
    pub status: CheckStatus,
    pub error_count: usize,
    pub warning_count: usize,
    pub checks: IndexMap<String, CheckResult>,
}

impl Default for DqReport {
    fn default() -> Self {
        Self::new()
    }
}

impl DqReport {
    pub fn new() -> Self {
        Self {
            status: CheckStatus::Passed,
            error_count: 0,
            warning_count: 0,
            checks: IndexMap::new(),
        }
    }

    /// Record a check and update the running tallies.
    ///
    /// A failure always counts and sets the status to failed. A warning
    /// counts only while the report has not failed. Status never improves.
    pub fn add_check(&mut self, name: impl Into<String>, result: CheckResult) {
        match result.status {
            CheckStatus::Failed => {
                self.error_count += 1;
                self.status = CheckStatus::Failed;
            }
            CheckStatus::Warning if self.status != CheckStatus::Failed => {
                self.warning_count += 1;
                self.status = CheckStatus::Warning;
            }
            _ => {}
        }
        self.checks.insert(name.into(), result);
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.get(name)
    }

    /// Worst status among the recorded checks.
    pub fn worst_status(&self) -> CheckStatus {
        self.checks
            .values()
            .map(|c| c.status)
            .max()
            .unwrap_or(CheckStatus::Passed)
    }

    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_escalates_only() {
        let mut report = DqReport::new();
        report.add_check("a", CheckResult::passed("ok", json!({})));
        assert_eq!(report.status, CheckStatus::Passed);

        report.add_check("b", CheckResult::warning("hmm", json!({})));
        assert_eq!(report.status, CheckStatus::Warning);
        assert_eq!(report.warning_count, 1);

        report.add_check("c", CheckResult::failed("bad", json!({})));
        report.add_check("d", CheckResult::warning("late", json!({})));
        report.add_check("e", CheckResult::passed("fine", json!({})));

        assert_eq!(report.status, CheckStatus::Failed);
        assert_eq!(report.error_count, 1);
        // Warnings after a failure are not tallied.
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.worst_status(), report.status);
        assert_eq!(report.checks.keys().collect::<Vec<_>>(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_serialized_shape() {
        let mut report = DqReport::new();
        report.add_check("row_count", CheckResult::warning("Low row count", json!({"row_count": 3})));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "warning");
        assert_eq!(value["checks"]["row_count"]["details"]["row_count"], 3);
    }
}
