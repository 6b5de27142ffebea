//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Intake: template detection, column mapping and data-quality checks for financial exports
#[derive(Parser)]
#[command(name = "intake")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, default_value = "compact")]
    pub log_format: LogFormat,

    /// Path to a JSON configuration file (thresholds, synonyms, date formats)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full intake pipeline on one or more files
    Run {
        /// Data files (csv, tsv, txt, xlsx, xls, xlsb, ods)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Treat every file as this extension instead of its own suffix
        #[arg(short, long)]
        extension: Option<String>,

        /// Worksheet to read from workbooks (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Include the parsed rows in JSON output
        #[arg(long)]
        include_data: bool,

        /// Write JSON results to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Mapping memory file to record accepted mappings in
        #[arg(long, value_name = "MEMORY_FILE")]
        memory: Option<PathBuf>,

        /// Tenant the accepted mappings belong to
        #[arg(long, default_value = "default")]
        tenant: String,

        /// Number of files processed concurrently
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Detect the template of a file and show every template's score
    Detect {
        /// Data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Worksheet to read from workbooks
        #[arg(short, long)]
        sheet: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the worksheets of a workbook
    Sheets {
        /// Workbook file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show basic facts about a file without running the pipeline
    Info {
        /// Data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the known templates and their canonical fields
    Templates {
        /// Show a single template (e.g. BankStatement, AP_OpenItems)
        #[arg(value_name = "TEMPLATE")]
        template: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
