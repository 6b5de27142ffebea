//! Cell-level parsing helpers shared by the parser, detector and validator.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Currency symbols, thousands separators and stray whitespace.
static AMOUNT_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\$€£¥₹,\s]").unwrap());

// Accounting-style negatives: (1,234.56)
static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\((.*)\)$").unwrap());

/// Tokens read as missing, compared case-insensitively.
const NULL_TOKENS: &[&str] = &["na", "n/a", "nan", "null", "none", "#n/a"];

/// Date-only layouts tried when sniffing whether text holds dates.
const LOOSE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Date-time layouts tried when sniffing whether text holds dates.
const LOOSE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Check if a raw cell represents a missing value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || NULL_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Parse a plain number exactly as written (no currency cleanup).
pub fn parse_plain_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse an amount, ignoring currency symbols and thousands separators.
///
/// Accepts accounting negatives written as `(123.45)`.
pub fn parse_amount(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let (body, negate) = match PARENTHESIZED.captures(trimmed) {
        Some(caps) => (caps.get(1).map_or("", |m| m.as_str()), true),
        None => (trimmed, false),
    };

    let cleaned = AMOUNT_NOISE.replace_all(body, "");
    let number = parse_plain_number(&cleaned)?;
    Some(if negate { -number } else { number })
}

/// Parse a date with one explicit strftime-style layout.
///
/// Layouts without time fields yield midnight.
/// A `%Y` field must be written with exactly four digits.
pub fn parse_date_with(value: &str, format: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .filter(|parsed| has_full_year(parsed, format))
}

/// Parse a date in any common layout.
pub fn parse_date_loose(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.len() < 6 || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    LOOSE_DATETIME_FORMATS
        .iter()
        .chain(LOOSE_DATE_FORMATS)
        .find_map(|f| parse_date_with(trimmed, f))
}

// chrono reads `%Y` greedily, so "25" is year 25.
fn has_full_year(parsed: &NaiveDateTime, format: &str) -> bool {
    !format.contains("%Y") || (1000..=9999).contains(&parsed.year())
}

/// Render a number the way spreadsheets display it.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Render a date, omitting a midnight time component.
pub fn format_datetime(value: &NaiveDateTime) -> String {
    if value.time() == chrono::NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_token() {
        assert!(is_null_token(""));
        assert!(is_null_token("   "));
        assert!(is_null_token("NA"));
        assert!(is_null_token("n/a"));
        assert!(is_null_token("NaN"));
        assert!(is_null_token("NULL"));
        assert!(!is_null_token("0"));
        assert!(!is_null_token("-"));
    }

    #[test]
    fn test_parse_amount_strips_currency() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("€ 99"), Some(99.0));
        assert_eq!(parse_amount("(250.00)"), Some(-250.0));
        assert_eq!(parse_amount("-12"), Some(-12.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_plain_number_is_strict() {
        assert_eq!(parse_plain_number("42"), Some(42.0));
        assert_eq!(parse_plain_number("1,000"), None);
        assert_eq!(parse_plain_number("inf"), None);
    }

    #[test]
    fn test_parse_date_with_explicit_format() {
        assert!(parse_date_with("01/15/2025", "%m/%d/%Y").is_some());
        assert!(parse_date_with("01/15/2025", "%Y-%m-%d").is_none());
        assert!(parse_date_with("15-Jan-2025", "%d-%b-%Y").is_some());
        assert!(parse_date_with("January 15, 2025", "%B %d, %Y").is_some());
    }

    #[test]
    fn test_four_digit_year_layouts_reject_short_years() {
        assert!(parse_date_with("01/15/25", "%m/%d/%Y").is_none());
        assert!(parse_date_with("15-01-0025", "%d-%m-%Y").is_none());
        assert!(parse_date_with("01/15/25", "%m/%d/%y").is_some());
        assert_eq!(
            parse_date_loose("01/15/25").map(|d| d.year()),
            Some(2025)
        );
    }

    #[test]
    fn test_parse_date_loose() {
        assert!(parse_date_loose("2025-01-15").is_some());
        assert!(parse_date_loose("2025-01-15 10:30:00").is_some());
        assert!(parse_date_loose("15/01/2025").is_some());
        assert!(parse_date_loose("Jan 15, 2025").is_some());
        assert!(parse_date_loose("Payment 1").is_none());
        assert!(parse_date_loose("1010").is_none());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-3.0), "-3");
    }
}
