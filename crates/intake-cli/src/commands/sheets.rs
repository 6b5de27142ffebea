//! Sheets command - list the worksheets of a workbook.

use std::path::PathBuf;

use intake::{IntakeConfig, Parser};

pub fn run(config: IntakeConfig, file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let parser = Parser::with_config(config.parser);
    for name in parser.sheet_names(&file)? {
        println!("{}", name);
    }
    Ok(())
}
