//! Fuzz target for the whole intake pipeline on delimited input.

#![no_main]

use intake::Intake;
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    if data.len() > 50_000 {
        return;
    }

    if let Ok(mut temp_file) = tempfile::NamedTempFile::with_suffix(".csv") {
        if temp_file.write_all(data).is_ok() {
            // Soft outcomes and parse errors are expected; panics are not.
            let _ = Intake::default().run(temp_file.path());
        }
    }
});
