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

pub const LABEL: &str = "News API";

/// News search (`/api/searchNews?query=&limit=`).
pub struct NewsConnector {
    client: Client,
    settings: SourceSettings,
}

impl NewsConnector {
    pub fn new(client: Client, settings: SourceSettings) -> Self {
        Self { client, settings }
    }
}

pub fn map_article(item: &Value, index: usize) -> SearchResult {
    let description = text_field(item, &["description", "summary", "content"])
        .map(|s| strip_markup(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    SearchResult::new(
        Kind::News,
        record_id(Kind::News, id_field(item, &["id"]), index),
        text_or(item, &["title", "headline"], DEFAULT_TITLE),
    )
    .with_description(description)
    .with_source_label(provider_label(item, LABEL))
    .with_url(text_or(item, &["url", "link"], ""))
    .with_thumbnail_url(text_field(item, &["thumbnail", "urlToImage", "image"]))
    .with_published_at(timestamp_field(item, &["publishedAt", "published_at", "date"]))
}

#[async_trait]
impl Source for NewsConnector {
    fn name(&self) -> &'static str {
        "news"
    }

    fn kind(&self) -> Kind {
        Kind::News
    }

    fn limit(&self) -> usize {
        self.settings.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let items = backend_records(&self.client, &self.settings, query, limit).await?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, item)| map_article(item, i))
            .collect())
    }
}
