use crate::cli::Cli;
use crate::commands::{gemini_client, load_config, spinner, Result};
use crate::output::{format_output, OutputData};
use nexus_core::GenerationOptions;

pub async fn run(cli: &Cli, prompt: &str, temperature: f32, max_output_tokens: u32) -> Result<()> {
    let config = load_config(cli)?;
    let gemini = gemini_client(&config)?;
    let options = GenerationOptions {
        temperature,
        max_output_tokens,
    };

    let progress = spinner(format!("Asking {}...", gemini.model()));
    let result = gemini.generate_text(prompt, &options).await;
    progress.finish_and_clear();

    format_output(&OutputData::Generated { text: result? }, &cli.output)
}
