//! Templates command - list the known templates and their canonical fields.

use colored::Colorize;
use intake::{IntakeConfig, TemplateType};

pub fn run(
    config: IntakeConfig,
    template: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let wanted = template.as_deref().map(str::parse::<TemplateType>).transpose()?;

    let specs: Vec<_> = config
        .registry
        .specs()
        .filter(|spec| wanted.is_none_or(|t| t == spec.template))
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    for spec in specs {
        println!(
            "{} {}",
            spec.template.as_str().cyan().bold(),
            spec.template.description().dimmed()
        );
        for field in &spec.fields {
            let marker = if field.required {
                "required".yellow()
            } else {
                "optional".dimmed()
            };
            println!("  {:20} {:9} {}", field.name, marker, field.synonyms.join(", "));
        }
        println!();
    }

    Ok(())
}
