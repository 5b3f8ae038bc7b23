use crate::cli::Cli;
use crate::commands::{gemini_client, load_config, spinner, CommandError, Result};
use crate::output::{format_output, OutputData};
use nexus_core::Summarizer;
use std::sync::Arc;

pub async fn run(cli: &Cli, term: &str) -> Result<()> {
    let term = term.trim();
    if term.is_empty() {
        return Err(CommandError::InvalidInput("term must not be empty".into()));
    }

    let config = load_config(cli)?;
    let gemini = gemini_client(&config)?;
    let summarizer = Summarizer::new(Arc::new(gemini), config.gemini.generation_options());

    let progress = spinner(format!("Explaining '{}'...", term));
    // Same contract as inside search: fall back instead of failing
    let text = summarizer.explain(term).await;
    progress.finish_and_clear();

    format_output(
        &OutputData::Explanation {
            term: term.to_string(),
            text,
        },
        &cli.output,
    )
}
