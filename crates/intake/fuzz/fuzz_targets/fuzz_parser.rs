//! Fuzz target for the file parser.
//!
//! Checks that delimited and workbook parsing never panic on malformed
//! input, whichever delimiter ends up being tried.

#![no_main]

use intake::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    let _ = parser.parse_delimited(data);
    let _ = parser.parse_workbook(data, None);
});
