//! Per-column content analysis feeding template scoring.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::input::values::{parse_amount, parse_date_loose};
use crate::input::{Column, ColumnKind, DataTable, Value};

/// Content tag assigned to a column during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnTag {
    Date,
    Numeric,
    Text,
}

/// Structural facts about a table.
///
/// Column lists hold column indices; columns with no data are in none of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableAnalysis {
    pub num_rows: usize,
    pub num_columns: usize,
    pub date_columns: Vec<usize>,
    pub numeric_columns: Vec<usize>,
    pub text_columns: Vec<usize>,
    pub has_sequential_dates: bool,
    pub has_running_balance: bool,
    pub has_account_numbers: bool,
    pub has_debit_credit: bool,
    pub has_aging_buckets: bool,
}

impl TableAnalysis {
    /// Analyze a table's columns and derive the structural signals.
    pub fn analyze(table: &DataTable, config: &DetectionConfig) -> Self {
        let mut analysis = TableAnalysis {
            num_rows: table.row_count(),
            num_columns: table.column_count(),
            ..TableAnalysis::default()
        };

        for (idx, column) in table.columns().iter().enumerate() {
            let Some(tag) = tag_column(column, config) else {
                continue;
            };

            match tag {
                ColumnTag::Date => {
                    analysis.date_columns.push(idx);
                    if has_sequential_dates(column, config.max_median_day_gap) {
                        analysis.has_sequential_dates = true;
                    }
                }
                ColumnTag::Numeric => {
                    analysis.numeric_columns.push(idx);
                    if looks_like_running_balance(column, config) {
                        analysis.has_running_balance = true;
                    }
                }
                ColumnTag::Text => {
                    analysis.text_columns.push(idx);
                    if looks_like_account_numbers(column, config) {
                        analysis.has_account_numbers = true;
                    }
                }
            }
        }

        if analysis.numeric_columns.len() >= 2 {
            analysis.has_debit_credit = has_debit_credit_pair(table, &analysis.numeric_columns, config);
        }
        if analysis.numeric_columns.len() >= config.aging_min_columns {
            analysis.has_aging_buckets = has_aging_buckets(table, &analysis.numeric_columns, config);
        }

        analysis
    }
}

/// Tag a column as date, numeric or text. `None` for columns with no data.
///
/// Dates are checked first. Numeric columns are never read as dates.
pub fn tag_column(column: &Column, config: &DetectionConfig) -> Option<ColumnTag> {
    match column.kind {
        ColumnKind::Empty => None,
        ColumnKind::Date => Some(ColumnTag::Date),
        ColumnKind::Numeric => Some(ColumnTag::Numeric),
        ColumnKind::Text => {
            let sample: Vec<&Value> = column.non_null().take(config.sample_size).collect();
            if sample.is_empty() {
                return None;
            }

            let dates = sample.iter().filter(|v| cell_date(v).is_some()).count();
            if ratio(dates, sample.len()) >= config.kind_ratio {
                return Some(ColumnTag::Date);
            }

            let numbers = sample.iter().filter(|v| cell_number(v).is_some()).count();
            if ratio(numbers, sample.len()) >= config.kind_ratio {
                return Some(ColumnTag::Numeric);
            }

            Some(ColumnTag::Text)
        }
    }
}

/// Median gap between sorted dates is at most `max_gap_days`.
fn has_sequential_dates(column: &Column, max_gap_days: f64) -> bool {
    let mut dates: Vec<NaiveDateTime> = column.non_null().filter_map(cell_date).collect();
    if dates.len() < 2 {
        return false;
    }
    dates.sort();

    let gaps: Vec<f64> = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .collect();

    median(gaps).is_some_and(|m| m <= max_gap_days)
}

/// Single-signed values with a low coefficient of variation.
fn looks_like_running_balance(column: &Column, config: &DetectionConfig) -> bool {
    let values: Vec<f64> = column.non_null().filter_map(cell_number).collect();
    if values.len() < config.running_balance_min_values {
        return false;
    }

    let all_positive = values.iter().all(|&v| v > 0.0);
    let all_negative = values.iter().all(|&v| v < 0.0);
    if !(all_positive || all_negative) {
        return false;
    }

    let mean = mean(&values);
    let cv = if mean != 0.0 {
        sample_std(&values) / mean
    } else {
        f64::INFINITY
    };

    cv < config.running_balance_max_cv
}

/// Mostly digit-bearing codes of consistent length.
fn looks_like_account_numbers(column: &Column, config: &DetectionConfig) -> bool {
    let sample: Vec<String> = column
        .non_null()
        .take(config.account_sample_size)
        .filter_map(|v| v.as_text().map(|s| s.into_owned()))
        .collect();
    if sample.is_empty() {
        return false;
    }

    let with_digits = sample
        .iter()
        .filter(|s| s.chars().any(|c| c.is_ascii_digit()))
        .count();
    if ratio(with_digits, sample.len()) < config.account_digit_ratio {
        return false;
    }

    let lengths: Vec<f64> = sample.iter().map(|s| s.chars().count() as f64).collect();
    if lengths.len() < 2 {
        return false;
    }

    sample_std(&lengths) < config.account_max_length_std
}

/// Some pair of numeric columns is mutually exclusive on enough rows.
fn has_debit_credit_pair(table: &DataTable, numeric: &[usize], config: &DetectionConfig) -> bool {
    let rows = table.row_count();
    if rows == 0 {
        return false;
    }

    let columns = table.columns();
    for (i, &a) in numeric.iter().enumerate() {
        for &b in &numeric[i + 1..] {
            let left = &columns[a].values;
            let right = &columns[b].values;

            let exclusive = left
                .iter()
                .zip(right)
                .filter(|(l, r)| is_nonzero(l) != is_nonzero(r))
                .count();

            if ratio(exclusive, rows) > config.debit_credit_exclusivity {
                tracing::debug!(
                    "Debit/credit pair: {} / {} ({} of {} rows exclusive)",
                    columns[a].name,
                    columns[b].name,
                    exclusive,
                    rows
                );
                return true;
            }
        }
    }

    false
}

/// Enough numeric headers carry aging keywords.
fn has_aging_buckets(table: &DataTable, numeric: &[usize], config: &DetectionConfig) -> bool {
    let columns = table.columns();
    let matches = numeric
        .iter()
        .filter(|&&idx| {
            let name = columns[idx].name.to_lowercase();
            config.aging_keywords.iter().any(|kw| name.contains(kw.as_str()))
        })
        .count();

    matches >= config.aging_min_columns
}

fn cell_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(*d),
        Value::Text(s) => parse_date_loose(s),
        _ => None,
    }
}

fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Text(s) => parse_amount(s),
        _ => None,
    }
}

fn is_nonzero(value: &Value) -> bool {
    cell_number(value).is_some_and(|n| n != 0.0)
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    fn text_column(name: &str, values: &[&str]) -> Column {
        Column::from_raw(name, values)
    }

    #[test]
    fn test_tag_column() {
        let cfg = config();
        let dates = text_column("Date", &["2025-01-01", "2025-01-02", "2025-01-03"]);
        assert_eq!(tag_column(&dates, &cfg), Some(ColumnTag::Date));

        let amounts = text_column("Amount", &["$1,200.00", "$35.10", "n/a"]);
        assert_eq!(tag_column(&amounts, &cfg), Some(ColumnTag::Numeric));

        let plain = text_column("Qty", &["1", "2", "3"]);
        assert_eq!(tag_column(&plain, &cfg), Some(ColumnTag::Numeric));

        let memo = text_column("Memo", &["Rent", "Coffee", "2025-01-01"]);
        assert_eq!(tag_column(&memo, &cfg), Some(ColumnTag::Text));

        let empty = text_column("Blank", &["", "NA"]);
        assert_eq!(tag_column(&empty, &cfg), None);
    }

    #[test]
    fn test_kind_ratio_is_inclusive() {
        // 7 of 10 sampled values are dates: exactly at the ratio.
        let mut values = vec!["2025-01-01"; 7];
        values.extend(["x", "y", "z"]);
        let col = text_column("When", &values);
        assert_eq!(tag_column(&col, &config()), Some(ColumnTag::Date));
    }

    #[test]
    fn test_sequential_dates() {
        let daily = text_column("D", &["2025-01-03", "2025-01-01", "2025-01-02", "2025-01-05"]);
        assert!(has_sequential_dates(&daily, 7.0));

        let monthly = text_column("D", &["2025-01-31", "2025-02-28", "2025-03-31"]);
        assert!(!has_sequential_dates(&monthly, 7.0));

        let single = text_column("D", &["2025-01-01"]);
        assert!(!has_sequential_dates(&single, 7.0));
    }

    #[test]
    fn test_running_balance() {
        let cfg = config();
        let balance = text_column("Balance", &["1000", "1050", "990", "1200"]);
        assert!(looks_like_running_balance(&balance, &cfg));

        let mixed = text_column("Net", &["100", "-50", "20"]);
        assert!(!looks_like_running_balance(&mixed, &cfg));

        let short = text_column("Balance", &["1", "2"]);
        assert!(!looks_like_running_balance(&short, &cfg));

        let volatile = text_column("Spiky", &["1", "1", "1", "1", "1", "1", "1", "1", "1", "500"]);
        assert!(!looks_like_running_balance(&volatile, &cfg));
    }

    #[test]
    fn test_account_numbers() {
        let cfg = config();
        let codes = text_column("Acct", &["A1000", "A1100", "A2000", "A3000"]);
        assert!(looks_like_account_numbers(&codes, &cfg));

        let names = text_column("Name", &["Cash", "Accounts Receivable", "Inventory"]);
        assert!(!looks_like_account_numbers(&names, &cfg));

        let ragged = text_column("Ref", &["1", "REF-0000000000001", "22", "X-99999999999999"]);
        assert!(!looks_like_account_numbers(&ragged, &cfg));
    }

    #[test]
    fn test_debit_credit_and_aging() {
        let table = DataTable::new(vec![
            text_column("Account", &["Cash", "AR", "AP", "Equity"]),
            text_column("Debit", &["100", "", "50", "0"]),
            text_column("Credit", &["", "75", "", "25"]),
        ]);
        let analysis = TableAnalysis::analyze(&table, &config());
        assert_eq!(analysis.numeric_columns, vec![1, 2]);
        assert!(analysis.has_debit_credit);
        assert!(!analysis.has_aging_buckets);

        let aging = DataTable::new(vec![
            text_column("Customer", &["Acme", "Globex"]),
            text_column("Current", &["10", "0"]),
            text_column("1-30 Days", &["5", "0"]),
            text_column("31-60 Days", &["0", "7"]),
            text_column("Over 90", &["0", "3"]),
        ]);
        let analysis = TableAnalysis::analyze(&aging, &config());
        assert!(analysis.has_aging_buckets);
    }

    #[test]
    fn test_empty_columns_are_skipped() {
        let table = DataTable::new(vec![
            text_column("Date", &["2025-01-01", "2025-01-02"]),
            text_column("Blank", &["", ""]),
        ]);
        let analysis = TableAnalysis::analyze(&table, &config());
        assert_eq!(analysis.num_columns, 2);
        assert_eq!(analysis.date_columns, vec![0]);
        assert!(analysis.text_columns.is_empty());
        assert!(analysis.numeric_columns.is_empty());
    }
}
