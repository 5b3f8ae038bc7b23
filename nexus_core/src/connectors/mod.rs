pub mod blogs;
pub mod dictionary;
pub mod images;
pub mod music;
pub mod news;
pub mod web_search;
pub mod wikipedia;
pub mod youtube;

use crate::aggregator::Kind;
use crate::config::{NexusConfig, SourceSettings};
use crate::error::SourceError;
use crate::gemini::TextGenerator;
use crate::normalize::{results_array, text_field};
use crate::store::Store;
use crate::utils::get_json;
use crate::Source;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// GET `{endpoint}?query=..&limit=..` on the shared search backend and return
/// its record list, whether bare or wrapped.
pub(crate) async fn backend_records(
    client: &Client,
    settings: &SourceSettings,
    query: &str,
    limit: usize,
) -> Result<Vec<Value>, SourceError> {
    let raw = get_json(
        client,
        &settings.endpoint(),
        &[("query", query.to_string()), ("limit", limit.to_string())],
    )
    .await?;

    if !raw.is_array() && results_array(&raw).is_empty() && raw.get("error").is_some() {
        let message = text_field(&raw, &["error", "message"]).unwrap_or_default();
        return Err(SourceError::Parse(format!("backend error: {}", message)));
    }

    Ok(results_array(&raw).into_iter().cloned().collect())
}

/// Provider label: a plain `source` string, `source.name`, or `default`.
pub(crate) fn provider_label(item: &Value, default: &str) -> String {
    text_field(item, &["source", "provider", "channel", "channelTitle"])
        .or_else(|| item.get("source").and_then(|s| text_field(s, &["name"])))
        .unwrap_or_else(|| default.to_string())
}

/// Everything needed to build the default set of sources.
pub struct SourceDeps {
    pub client: Client,
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub store: Option<Store>,
}

/// Build every enabled source from configuration, in concatenation order.
///
/// Music is skipped without a generator and blogs without a store.
pub fn build_sources(config: &NexusConfig, deps: &SourceDeps) -> Vec<Arc<dyn Source>> {
    let mut sources: Vec<Arc<dyn Source>> = Vec::new();

    for kind in Kind::source_kinds() {
        let settings = config.search.source(*kind);
        if !settings.enabled {
            debug!(kind = %kind, "Source disabled in config");
            continue;
        }
        let client = deps.client.clone();
        let source: Option<Arc<dyn Source>> = match kind {
            Kind::Encyclopedia => Some(Arc::new(wikipedia::WikipediaConnector::new(
                client, settings,
            ))),
            Kind::Web => Some(Arc::new(web_search::WebSearchConnector::new(client, settings))),
            Kind::Dictionary => Some(Arc::new(dictionary::DictionaryConnector::new(
                client, settings,
            ))),
            Kind::News => Some(Arc::new(news::NewsConnector::new(client, settings))),
            Kind::Image => Some(Arc::new(images::ImagesConnector::new(client, settings))),
            Kind::Video => Some(Arc::new(youtube::YoutubeConnector::new(client, settings))),
            Kind::Music => deps.generator.clone().map(|g| {
                Arc::new(music::MusicConnector::new(g, settings.limit)) as Arc<dyn Source>
            }),
            Kind::Blog => deps.store.clone().map(|s| {
                Arc::new(blogs::BlogsConnector::new(s, settings.limit)) as Arc<dyn Source>
            }),
            Kind::Synthesized => None,
        };

        match source {
            Some(source) => sources.push(source),
            None => debug!(kind = %kind, "Source unavailable, skipping"),
        }
    }

    sources
}
