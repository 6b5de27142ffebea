//! Run command - push files through the full intake pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use intake::input::extension_of;
use intake::{
    CheckStatus, Intake, IntakeConfig, IntakeError, IntakeOutcome, MappingMemory, run_intake_async,
};
use serde_json::json;
use tokio::sync::Semaphore;

pub struct RunOptions {
    pub files: Vec<PathBuf>,
    pub extension: Option<String>,
    pub json: bool,
    pub include_data: bool,
    pub output: Option<PathBuf>,
    pub memory: Option<PathBuf>,
    pub tenant: String,
    pub jobs: usize,
}

pub fn run(config: IntakeConfig, options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let intake = Arc::new(Intake::new(config));

    let runtime = tokio::runtime::Runtime::new()?;
    let results = runtime.block_on(run_all(
        Arc::clone(&intake),
        options.files.clone(),
        options.extension.clone(),
        options.jobs.max(1),
    ));

    if let Some(path) = &options.memory {
        remember_accepted(path, &options.tenant, &results)?;
    }

    if options.json || options.output.is_some() {
        let entries = results
            .iter()
            .map(|(file, result)| json_entry(file, result, options.include_data))
            .collect::<Result<Vec<_>, _>>()?;
        let rendered = serde_json::to_string_pretty(&entries)?;
        match &options.output {
            Some(path) => {
                std::fs::write(path, rendered)?;
                println!(
                    "{} {}",
                    "Results written to".green(),
                    path.display().to_string().white()
                );
            }
            None => println!("{}", rendered),
        }
    }
    if !options.json {
        for (file, result) in &results {
            print_result(file, result);
        }
        print_summary(&results);
    }

    let not_accepted = results.iter().filter(|(_, r)| r.is_err()).count();
    if not_accepted > 0 {
        return Err(format!("{} of {} file(s) were not accepted", not_accepted, results.len()).into());
    }

    Ok(())
}

/// Run every file on the blocking pool, at most `jobs` at a time, keeping input order.
async fn run_all(
    intake: Arc<Intake>,
    files: Vec<PathBuf>,
    extension: Option<String>,
    jobs: usize,
) -> Vec<(PathBuf, intake::Result<IntakeOutcome>)> {
    let permits = Arc::new(Semaphore::new(jobs));
    let mut handles = Vec::with_capacity(files.len());

    for file in &files {
        let intake = Arc::clone(&intake);
        let permits = Arc::clone(&permits);
        let path = file.clone();
        let ext = extension.clone().unwrap_or_else(|| extension_of(file));

        handles.push(tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| IntakeError::Worker(e.to_string()))?;
            run_intake_async(intake, path, ext).await
        }));
    }

    let mut results = Vec::with_capacity(files.len());
    for (file, handle) in files.into_iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(IntakeError::Worker(e.to_string())),
        };
        results.push((file, result));
    }
    results
}

/// Record mappings of accepted files whose data quality did not fail.
fn remember_accepted(
    path: &Path,
    tenant: &str,
    results: &[(PathBuf, intake::Result<IntakeOutcome>)],
) -> intake::Result<()> {
    let memory = MappingMemory::load(path)?;
    let mut recorded = 0;

    for outcome in results.iter().filter_map(|(_, r)| r.as_ref().ok()) {
        if outcome.dq_report.is_failed() {
            continue;
        }
        let record = memory.remember(
            tenant,
            outcome.template_type,
            &outcome.column_mapping,
            &outcome.date_formats(),
        );
        tracing::debug!("Recorded mapping {} (used {} times)", record.id, record.use_count);
        recorded += 1;
    }

    if recorded > 0 {
        memory.save(path)?;
        tracing::info!("Saved {} mapping(s) to {}", recorded, path.display());
    }
    Ok(())
}

fn json_entry(
    file: &Path,
    result: &intake::Result<IntakeOutcome>,
    include_data: bool,
) -> Result<serde_json::Value, serde_json::Error> {
    let entry = match result {
        Ok(outcome) => {
            let mut value = serde_json::to_value(outcome)?;
            if !include_data {
                if let Some(map) = value.as_object_mut() {
                    map.remove("table");
                }
            }
            json!({ "file": file, "status": "accepted", "outcome": value })
        }
        Err(e) => json!({
            "file": file,
            "status": if e.is_soft() { "rejected" } else { "error" },
            "error": error_details(e),
        }),
    };
    Ok(entry)
}

fn error_details(err: &IntakeError) -> serde_json::Value {
    let mut details = json!({ "kind": err.kind(), "message": err.to_string() });
    match err {
        IntakeError::NoTemplateMatch {
            best_candidate,
            best_score,
            threshold,
        } => {
            details["best_candidate"] = json!(best_candidate);
            details["best_score"] = json!(best_score);
            details["threshold"] = json!(threshold);
        }
        IntakeError::MissingRequiredColumns {
            template,
            missing,
            mapping,
        } => {
            details["template_type"] = json!(template);
            details["missing"] = json!(missing);
            details["column_mapping"] = json!(mapping);
        }
        _ => {}
    }
    details
}

fn print_result(file: &Path, result: &intake::Result<IntakeOutcome>) {
    println!("{} {}", "File".cyan().bold(), file.display().to_string().white());

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.is_soft() => {
            println!("  {} {}", "Rejected:".yellow().bold(), e);
            if let IntakeError::MissingRequiredColumns { mapping, .. } = e {
                for (field, source) in mapping.iter() {
                    println!("    {:20} <- {}", field, source.unwrap_or("-"));
                }
            }
            println!();
            return;
        }
        Err(e) => {
            println!("  {} {}", "Error:".red().bold(), e);
            println!();
            return;
        }
    };

    println!(
        "  {} rows x {} columns ({})",
        outcome.source.row_count, outcome.source.column_count, outcome.source.format
    );
    println!(
        "  Template: {} (confidence {:.2})",
        outcome.template_type.to_string().green().bold(),
        outcome.detection_confidence
    );
    println!("  Mapping confidence: {:.2}", outcome.mapping_confidence);
    for m in &outcome.field_matches {
        match &m.source {
            Some(source) => println!("    {:20} <- {:24} {:.2}", m.field, source.white(), m.score),
            None => println!("    {:20} <- {}", m.field, "-".dimmed()),
        }
    }

    println!("  Data quality: {}", colored_status(outcome.dq_report.status));
    for (name, check) in &outcome.dq_report.checks {
        println!(
            "    {:18} {:8} {}",
            name,
            colored_status(check.status),
            check.message
        );
    }
    println!();
}

fn print_summary(results: &[(PathBuf, intake::Result<IntakeOutcome>)]) {
    let accepted = results.iter().filter(|(_, r)| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|(_, r)| matches!(r, Err(e) if e.is_soft()))
        .count();
    let errors = results.len() - accepted - rejected;

    println!(
        "Processed {} file(s): {} accepted, {} rejected, {} errors",
        results.len().to_string().white().bold(),
        accepted.to_string().green(),
        rejected.to_string().yellow(),
        errors.to_string().red()
    );
}

fn colored_status(status: CheckStatus) -> colored::ColoredString {
    match status {
        CheckStatus::Passed => status.label().green(),
        CheckStatus::Warning => status.label().yellow(),
        CheckStatus::Failed => status.label().red(),
    }
}
