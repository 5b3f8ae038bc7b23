use crate::error::SourceError;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = concat!("nexus/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every connector and the Gemini client.
///
/// `timeout` bounds a single request; the aggregator applies its own
/// per-source deadline on top.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, SourceError> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(SourceError::from)
}

/// GET `url` with `params` and parse the body as JSON.
///
/// Non-2xx responses become [`SourceError::Status`] carrying the body text.
pub async fn get_json(
    client: &Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<Value, SourceError> {
    debug!(url, "GET");
    let resp = client
        .get(url)
        .header("Accept", "application/json")
        .query(params)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let mut message = body.trim().to_string();
        if message.is_empty() {
            message = status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string();
        }
        return Err(SourceError::Status {
            status,
            message: crate::normalize::truncate_chars(&message, 200),
        });
    }

    serde_json::from_str(&body).map_err(SourceError::from)
}

/// Join a base URL and a path segment without doubled slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
