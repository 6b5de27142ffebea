//! Property-based tests for the intake stages.
//!
//! Property-based tests verify:
//! 1. **No panics**: parsing and scoring never crash on any input
//! 2. **Determinism**: same input always produces same output
//! 3. **Invariants**: scores stay in range and mappings stay injective
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p intake --test property_tests
//!
//! # More cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p intake --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use intake::detect::{Detection, TemplateScore, decide};
use intake::input::Column;
use intake::input::values::{parse_amount, parse_date_loose};
use intake::mapping::{normalize, similarity};
use intake::validation::{CheckResult, CheckStatus, DqReport};
use intake::{ColumnMapper, DataTable, IntakeConfig, Parser, TemplateDetector, TemplateType};

// =============================================================================
// Test Strategies
// =============================================================================

/// Header-like strings, including the separators normalization touches.
fn header_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z][A-Za-z _\\-#]{0,20}",
        Just("Date".to_string()),
        Just("Amount".to_string()),
        Just("Account Number".to_string()),
        Just("Debit".to_string()),
        Just("Credit".to_string()),
    ]
}

/// Cell-like strings: numbers, dates, amounts and free text.
fn cell_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "-?[0-9]{1,6}(\\.[0-9]{1,2})?",
        "20[0-9]{2}-(0[1-9]|1[0-2])-(0[1-9]|1[0-9]|2[0-8])",
        "\\$[0-9]{1,3}(,[0-9]{3})?\\.[0-9]{2}",
        "[A-Za-z ]{0,12}",
        Just(String::new()),
        Just("N/A".to_string()),
    ]
}

fn template_type() -> impl Strategy<Value = TemplateType> {
    prop::sample::select(TemplateType::ALL.to_vec())
}

fn check_status() -> impl Strategy<Value = CheckStatus> {
    prop_oneof![
        Just(CheckStatus::Passed),
        Just(CheckStatus::Warning),
        Just(CheckStatus::Failed),
    ]
}

fn random_table() -> impl Strategy<Value = DataTable> {
    (1usize..6, 0usize..25).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(cell_like(), rows), cols).prop_map(
            move |columns| {
                let columns = columns
                    .iter()
                    .enumerate()
                    .map(|(i, cells)| {
                        let raw: Vec<&str> = cells.iter().map(String::as_str).collect();
                        Column::from_raw(format!("col{}", i), &raw)
                    })
                    .collect();
                DataTable::new(columns)
            },
        )
    })
}

// =============================================================================
// Value Parsing
// =============================================================================

proptest! {
    #[test]
    fn amount_parsing_never_panics(s in "\\PC{0,40}") {
        let _ = parse_amount(&s);
        let _ = parse_date_loose(&s);
    }

    #[test]
    fn formatted_amounts_parse_back(cents in -10_000_000i64..10_000_000i64) {
        let value = cents as f64 / 100.0;
        let plain = format!("{:.2}", value.abs());
        let text = if value < 0.0 { format!("(${})", plain) } else { format!("${}", plain) };

        let parsed = parse_amount(&text).expect("amount should parse");
        prop_assert!((parsed - value).abs() < 1e-6);
    }
}

// =============================================================================
// Parser
// =============================================================================

proptest! {
    #[test]
    fn delimited_parser_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = Parser::new().parse_delimited(&bytes);
    }

    #[test]
    fn parsed_tables_are_rectangular(
        rows in prop::collection::vec(prop::collection::vec("[a-z][0-9]{1,5}", 3), 1..20)
    ) {
        let mut content = String::from("a,b,c\n");
        for row in &rows {
            content.push_str(&row.join(","));
            content.push('\n');
        }

        let (table, delimiter) = Parser::new().parse_delimited(content.as_bytes()).unwrap();
        prop_assert_eq!(delimiter, b',');
        prop_assert_eq!(table.column_count(), 3);
        prop_assert_eq!(table.row_count(), rows.len());
        for column in table.columns() {
            prop_assert_eq!(column.len(), table.row_count());
        }
    }
}

// =============================================================================
// Detection
// =============================================================================

proptest! {
    #[test]
    fn detection_scores_stay_in_range(table in random_table()) {
        let detector = TemplateDetector::from_config(&IntakeConfig::default());
        let report = detector.detect_with_scores(&table);

        prop_assert_eq!(report.scores.len(), TemplateType::ALL.len());
        for score in &report.scores {
            prop_assert!((0.0..=1.0).contains(&score.score));
        }
        if let Detection::Matched { confidence, .. } = report.detection {
            prop_assert!(confidence >= detector.threshold());
        }
    }

    #[test]
    fn detection_is_deterministic(table in random_table()) {
        let detector = TemplateDetector::from_config(&IntakeConfig::default());
        prop_assert_eq!(detector.detect_with_scores(&table), detector.detect_with_scores(&table));
    }

    #[test]
    fn raising_threshold_never_accepts_more(
        raw in prop::collection::vec(0u8..=10, 5),
        low in 0u8..=10,
        bump in 0u8..=10,
    ) {
        let scores: Vec<TemplateScore> = TemplateType::ALL
            .iter()
            .zip(&raw)
            .map(|(&template, &s)| TemplateScore { template, score: f64::from(s) / 10.0 })
            .collect();
        let low = f64::from(low) / 10.0;
        let high = (low + f64::from(bump) / 10.0).min(1.0);

        if let Detection::Matched { template, .. } = decide(&scores, high) {
            match decide(&scores, low) {
                Detection::Matched { template: at_low, .. } => prop_assert_eq!(at_low, template),
                Detection::NoMatch { .. } => prop_assert!(false, "lower threshold rejected a match"),
            }
        }
    }

    #[test]
    fn decide_picks_earliest_maximum(raw in prop::collection::vec(0u8..=10, 5)) {
        let scores: Vec<TemplateScore> = TemplateType::ALL
            .iter()
            .zip(&raw)
            .map(|(&template, &s)| TemplateScore { template, score: f64::from(s) / 10.0 })
            .collect();
        let best = scores.iter().map(|s| s.score).fold(0.0, f64::max);
        let first_best = scores.iter().find(|s| s.score == best).map(|s| s.template);

        match decide(&scores, 0.3) {
            Detection::Matched { template, confidence } => {
                prop_assert!(best >= 0.3);
                prop_assert_eq!(Some(template), first_best);
                prop_assert_eq!(confidence, best);
            }
            Detection::NoMatch { best_score, .. } => {
                prop_assert!(best < 0.3);
                prop_assert_eq!(best_score, best);
            }
        }
    }
}

// =============================================================================
// Mapping
// =============================================================================

proptest! {
    #[test]
    fn similarity_is_bounded(source in header_like(), synonym in header_like()) {
        let config = IntakeConfig::default().mapping;
        let score = similarity(&source, &[synonym], &config);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn normalized_synonym_is_exact(synonym in "[a-z][a-z _\\-]{0,15}[a-z]") {
        let config = IntakeConfig::default().mapping;
        let upper = synonym.to_uppercase();
        prop_assert_eq!(normalize(&upper), normalize(&synonym));
        prop_assert_eq!(similarity(&upper, &[synonym], &config), config.exact_score);
    }

    #[test]
    fn mapping_is_injective(
        headers in prop::collection::hash_set(header_like(), 0..10),
        template in template_type(),
    ) {
        let headers: Vec<String> = headers.into_iter().collect();
        let mapper = ColumnMapper::from_config(&IntakeConfig::default());
        let result = mapper.map_columns(&headers, template);

        let mut seen = HashSet::new();
        for (_, source) in result.mapping.mapped() {
            prop_assert!(headers.iter().any(|h| h == source));
            prop_assert!(seen.insert(source.to_string()), "{} mapped twice", source);
        }
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }
}

// =============================================================================
// Data Quality
// =============================================================================

proptest! {
    #[test]
    fn report_status_is_worst_check(statuses in prop::collection::vec(check_status(), 0..12)) {
        let mut report = DqReport::new();
        for (i, status) in statuses.iter().enumerate() {
            report.add_check(
                format!("check_{}", i),
                CheckResult::new(*status, "generated", serde_json::json!({})),
            );
        }

        let worst = statuses.iter().copied().max().unwrap_or(CheckStatus::Passed);
        prop_assert_eq!(report.status, worst);
        prop_assert_eq!(report.worst_status(), worst);
        prop_assert_eq!(report.is_failed(), statuses.contains(&CheckStatus::Failed));
        prop_assert_eq!(
            report.error_count,
            statuses.iter().filter(|s| **s == CheckStatus::Failed).count()
        );
        prop_assert_eq!(report.checks.len(), statuses.len());
    }
}
