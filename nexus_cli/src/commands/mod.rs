pub mod blogs;
pub mod config;
pub mod explain;
pub mod generate;
pub mod history;
pub mod search;
pub mod users;

use crate::cli::Cli;
use indicatif::{ProgressBar, ProgressStyle};
use nexus_core::auth::{default_secret_path, AuthError, TokenGate};
use nexus_core::store::{Store, StoreError};
use nexus_core::utils::build_client;
use nexus_core::{ConfigError, GeminiClient, NexusConfig, SourceError};
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

pub fn load_config(cli: &Cli) -> Result<NexusConfig> {
    Ok(NexusConfig::load(cli.config.as_deref())?)
}

pub fn gemini_client(config: &NexusConfig) -> Result<GeminiClient> {
    let client = build_client(None)?;
    Ok(GeminiClient::new(client, &config.gemini))
}

pub async fn open_store(config: &NexusConfig) -> Result<Store> {
    Ok(Store::open(&config.database.resolved_path()).await?)
}

pub fn token_gate(config: &NexusConfig) -> Result<TokenGate> {
    Ok(TokenGate::from_config(&config.auth, &default_secret_path())?)
}

/// The user id behind `token`, or an auth error explaining why not.
pub fn require_user(config: &NexusConfig, token: Option<&str>) -> Result<String> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .ok_or(AuthError::MissingToken)?;
    Ok(token_gate(config)?.decode(token)?.user_id)
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Read a password without echo, falling back to a plain line on non-TTY input.
pub fn read_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    match rpassword::read_password() {
        Ok(password) => Ok(password.trim().to_string()),
        Err(_) => {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            Ok(input.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_an_auth_error() {
        let config = NexusConfig::default();
        let err = require_user(&config, None).unwrap_err();
        assert!(matches!(err, CommandError::Auth(AuthError::MissingToken)));
        let err = require_user(&config, Some("  ")).unwrap_err();
        assert!(matches!(err, CommandError::Auth(AuthError::MissingToken)));
    }

    #[test]
    fn errors_display_without_prefix_noise() {
        let err = CommandError::from(SourceError::InvalidInput("Prompt is required.".into()));
        assert!(err.to_string().contains("Prompt is required."));
    }
}
