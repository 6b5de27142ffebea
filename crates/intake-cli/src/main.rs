//! Intake CLI - template detection, column mapping and data-quality checks
//! for financial spreadsheet exports.

mod cli;
mod commands;
mod logging;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands};
use intake::IntakeConfig;
use logging::{LogConfig, init_logging};

fn main() {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format));

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run {
            files,
            extension,
            sheet,
            json,
            include_data,
            output,
            memory,
            tenant,
            jobs,
        } => commands::run::run(
            with_sheet(config, sheet),
            commands::run::RunOptions {
                files,
                extension,
                json,
                include_data,
                output,
                memory,
                tenant,
                jobs,
            },
        ),

        Commands::Detect { file, sheet, json } => {
            commands::detect::run(with_sheet(config, sheet), file, json)
        }

        Commands::Sheets { file } => commands::sheets::run(config, file),

        Commands::Info { file, json } => commands::info::run(config, file, json),

        Commands::Templates { template, json } => commands::templates::run(config, template, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> intake::Result<IntakeConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            IntakeConfig::load(path)
        }
        None => Ok(IntakeConfig::default()),
    }
}

fn with_sheet(mut config: IntakeConfig, sheet: Option<String>) -> IntakeConfig {
    if sheet.is_some() {
        config.parser.sheet = sheet;
    }
    config
}
