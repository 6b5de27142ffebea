//! Example: run a financial export through the intake pipeline.
//!
//! Usage:
//!   cargo run --example intake_file -- <file_path>

use std::env;
use std::path::Path;

use intake::{CheckStatus, Intake};

fn main() -> intake::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example intake_file -- <file_path>");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Intake: {}", path.display());
    println!("{}", separator);
    println!();

    let outcome = match Intake::default().run(path) {
        Ok(outcome) => outcome,
        Err(e) if e.is_soft() => {
            println!("Not accepted: {}", e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    println!("## Source");
    println!("  File: {}", outcome.source.file);
    println!("  Format: {}", outcome.source.format);
    println!("  Rows: {}", outcome.source.row_count);
    println!("  Columns: {}", outcome.source.column_count);
    println!();

    println!(
        "## Template: {} (confidence {:.2})",
        outcome.template_type, outcome.detection_confidence
    );
    for score in &outcome.detection_scores {
        println!("  {:15} {:.2}", score.template.as_str(), score.score);
    }
    println!();

    println!("## Mapping (confidence {:.2})", outcome.mapping_confidence);
    for m in &outcome.field_matches {
        match &m.source {
            Some(source) => println!("  {:20} <- {:25} {:.2}", m.field, source, m.score),
            None => println!("  {:20} <- (unmapped)", m.field),
        }
    }
    println!();

    println!("## Data quality: {}", outcome.dq_report.status);
    for (name, check) in &outcome.dq_report.checks {
        let marker = match check.status {
            CheckStatus::Passed => "ok",
            CheckStatus::Warning => "!!",
            CheckStatus::Failed => "XX",
        };
        println!("  [{}] {:18} {}", marker, name, check.message);
    }

    Ok(())
}
