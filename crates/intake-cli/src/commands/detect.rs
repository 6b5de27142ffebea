//! Detect command - classify a file and show every template's score.

use std::path::PathBuf;

use colored::Colorize;
use intake::detect::Detection;
use intake::{Intake, IntakeConfig};

pub fn run(
    config: IntakeConfig,
    file: PathBuf,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let intake = Intake::new(config);
    let (source, report) = intake.detect(&file)?;

    if json_output {
        let value = serde_json::json!({
            "source": source,
            "analysis": report.analysis,
            "scores": report.scores,
            "detection": report.detection,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows x {} columns)",
        "Detecting".cyan().bold(),
        source.file.white(),
        source.row_count,
        source.column_count
    );
    println!();

    let analysis = &report.analysis;
    println!("{}", "Structure:".yellow().bold());
    println!(
        "  Date columns: {}  Numeric columns: {}  Text columns: {}",
        analysis.date_columns.len(),
        analysis.numeric_columns.len(),
        analysis.text_columns.len()
    );
    let signals = [
        ("sequential dates", analysis.has_sequential_dates),
        ("running balance", analysis.has_running_balance),
        ("account numbers", analysis.has_account_numbers),
        ("debit/credit pair", analysis.has_debit_credit),
        ("aging buckets", analysis.has_aging_buckets),
    ];
    for (label, present) in signals {
        let mark = if present { "yes".green() } else { "no".dimmed() };
        println!("  {:18} {}", label, mark);
    }
    println!();

    println!("{}", "Scores:".yellow().bold());
    let bar_width = 30;
    for score in &report.scores {
        let filled = (score.score * bar_width as f64).round() as usize;
        let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);
        println!("  {:14} {} {:.2}", score.template.as_str(), bar.cyan(), score.score);
    }
    println!();

    match report.detection {
        Detection::Matched {
            template,
            confidence,
        } => println!(
            "Detected {} (confidence {:.2})",
            template.to_string().green().bold(),
            confidence
        ),
        Detection::NoMatch {
            best_candidate,
            best_score,
        } => println!(
            "{} best candidate {} scored {:.2}, below the {:.2} threshold",
            "No match:".yellow().bold(),
            best_candidate.map_or("none", |t| t.as_str()),
            best_score,
            intake.detector().threshold()
        ),
    }

    Ok(())
}
