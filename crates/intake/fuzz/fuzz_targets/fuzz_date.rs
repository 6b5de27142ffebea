//! Fuzz target for date and amount sniffing.
//!
//! The fuzzed string is fed to the loose parsers directly and as every cell
//! of a small table, so column tagging and the date-format check see it too.

#![no_main]

use intake::input::values::{parse_amount, parse_date_loose, parse_date_with};
use intake::{DataTable, IntakeConfig, TemplateDetector};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse_amount(content);
    let _ = parse_date_loose(content);
    let config = IntakeConfig::default();
    for format in &config.validation.date_formats {
        let _ = parse_date_with(content, format);
    }

    let headers = vec!["Date".to_string(), "Memo".to_string(), "Amount".to_string()];
    let rows = vec![vec![content.to_string(); 3]; 3];
    let table = DataTable::from_rows(&headers, &rows);
    let _ = TemplateDetector::from_config(&config).detect_with_scores(&table);
});
