use crate::cli::{Cli, ConfigAction, OutputFormat};
use crate::commands::{load_config, Result};
use crate::output::{format_output, OutputData};
use nexus_core::{Kind, NexusConfig};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run(cli: &Cli, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => {
            let path = config_path(cli);
            match cli.output {
                OutputFormat::Pretty | OutputFormat::Text => println!("{}", path),
                _ => format_output(&OutputData::ConfigInfo(json!({ "path": path })), &cli.output)?,
            }
            Ok(())
        }
    }
}

fn config_path(cli: &Cli) -> String {
    cli.config
        .clone()
        .unwrap_or_else(NexusConfig::default_path)
        .display()
        .to_string()
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?.redacted();

    match cli.output {
        OutputFormat::Pretty => {
            println!();
            println!("{}", "Nexus Configuration".bold().cyan());
            println!("{}", "===================".cyan());
            println!();
            println!("Config file: {}", config_path(cli).dimmed());
            println!(
                "Database:    {}",
                config.database.resolved_path().display().to_string().dimmed()
            );
            println!();

            let gemini_status = if config.gemini.api_key.is_some() {
                "configured".green().to_string()
            } else {
                "no API key (summaries fall back, music search off)"
                    .yellow()
                    .to_string()
            };
            println!(
                "  {} - {} ({})",
                "gemini".cyan().bold(),
                gemini_status,
                config.gemini.model
            );
            println!();

            println!(
                "{} (timeout {} ms)",
                "Sources".bold(),
                config.search.timeout_ms
            );
            for kind in Kind::source_kinds() {
                let source = config.search.source(*kind);
                let status = if source.enabled {
                    "enabled".green().to_string()
                } else {
                    "disabled".red().to_string()
                };
                let endpoint = if source.base_url.is_empty() {
                    "-".to_string()
                } else {
                    source.endpoint()
                };
                println!(
                    "  {:<13} {:<8} limit {:<3} {}",
                    kind.as_str().cyan(),
                    status,
                    source.limit,
                    endpoint.dimmed()
                );
            }
            println!();
        }
        _ => {
            let value = serde_json::to_value(&config)?;
            format_output(&OutputData::ConfigInfo(value), &cli.output)?;
        }
    }

    Ok(())
}
