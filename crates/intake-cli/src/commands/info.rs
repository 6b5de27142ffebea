//! Info command - basic facts about a file without running the pipeline.

use std::path::PathBuf;

use colored::Colorize;
use intake::{IntakeConfig, Parser};

pub fn run(
    config: IntakeConfig,
    file: PathBuf,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let info = Parser::with_config(config.parser).file_info(&file);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", "File:".cyan().bold(), info.file_path.display());
    println!("  Name:      {}", info.file_name);
    println!("  Extension: {}", info.file_extension);
    println!("  Size:      {} bytes", info.file_size_bytes);
    if let Some(sheets) = &info.sheet_names {
        println!("  Sheets:    {}", sheets.join(", "));
    }
    if let (Some(rows), Some(cols)) = (info.row_count, info.column_count) {
        println!("  Shape:     {} rows x {} columns", rows, cols);
    }
    if let Some(columns) = &info.columns {
        println!("  Columns:");
        for column in columns {
            println!("    {}", column);
        }
    }
    if let Some(error) = &info.error {
        println!("  {} {}", "Error:".red().bold(), error);
    }

    Ok(())
}
