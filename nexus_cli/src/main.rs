use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

/// Default filter when `RUST_LOG` is unset; `-v`/`-vv` open up the core.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "nexus_cli=info,nexus_core=warn",
        1 => "nexus_cli=info,nexus_core=info",
        _ => "nexus_cli=debug,nexus_core=debug",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (stderr, so piped output stays clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Commands::Search {
            query,
            kinds,
            token,
        } => search::run(&cli, query, kinds, token.as_deref()).await,
        Commands::History { limit, token } => history::run(&cli, *limit, token.as_deref()).await,
        Commands::Explain { term } => explain::run(&cli, term).await,
        Commands::Generate {
            prompt,
            temperature,
            max_output_tokens,
        } => generate::run(&cli, prompt, *temperature, *max_output_tokens).await,
        Commands::Blogs { action } => blogs::run(&cli, action.clone()).await,
        Commands::Users { action } => users::run(&cli, action.clone()).await,
        Commands::Config { action } => config::run(&cli, action.clone()).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }
}
