use super::{backend_records, provider_label};
use crate::aggregator::{Kind, SearchResult};
use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::normalize::{
    id_field, record_id, strip_markup, text_field, text_or, timestamp_field, DEFAULT_DESCRIPTION,
    DEFAULT_TITLE,
};
use crate::Source;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub const LABEL: &str = "Web";

/// General web search on the shared backend.
pub struct WebSearchConnector {
    client: Client,
    settings: SourceSettings,
}

impl WebSearchConnector {
    pub fn new(client: Client, settings: SourceSettings) -> Self {
        Self { client, settings }
    }
}

pub fn map_result(item: &Value, index: usize) -> SearchResult {
    let description = text_field(item, &["snippet", "description", "content"])
        .map(|s| strip_markup(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    SearchResult::new(
        Kind::Web,
        record_id(Kind::Web, id_field(item, &["id"]), index),
        strip_markup(&text_or(item, &["title", "name"], DEFAULT_TITLE)),
    )
    .with_description(description)
    .with_source_label(
        text_field(item, &["displayLink", "domain"])
            .unwrap_or_else(|| provider_label(item, LABEL)),
    )
    .with_url(text_or(item, &["url", "link"], ""))
    .with_published_at(timestamp_field(item, &["publishedAt", "date"]))
}

#[async_trait]
impl Source for WebSearchConnector {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn kind(&self) -> Kind {
        Kind::Web
    }

    fn limit(&self) -> usize {
        self.settings.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let items = backend_records(&self.client, &self.settings, query, limit).await?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, item)| map_result(item, i))
            .collect())
    }
}
