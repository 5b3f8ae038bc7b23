use super::{backend_records, provider_label};
use crate::aggregator::{Kind, SearchResult};
use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::normalize::{
    id_field, record_id, text_field, text_or, DEFAULT_DESCRIPTION, DEFAULT_TITLE,
};
use crate::Source;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub const LABEL: &str = "Images API";

/// Image search (`/api/searchImages?query=&limit=`).
pub struct ImagesConnector {
    client: Client,
    settings: SourceSettings,
}

impl ImagesConnector {
    pub fn new(client: Client, settings: SourceSettings) -> Self {
        Self { client, settings }
    }
}

pub fn map_image(item: &Value, index: usize) -> SearchResult {
    let url = text_or(item, &["url", "link", "pageURL"], "");
    // Fall back to the full image when the backend sends no separate preview.
    let thumbnail = text_field(item, &["thumbnail", "previewURL", "thumb"])
        .or_else(|| {
            item.pointer("/urls/small")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
        .or_else(|| (!url.is_empty()).then(|| url.clone()));

    SearchResult::new(
        Kind::Image,
        record_id(Kind::Image, id_field(item, &["id"]), index),
        text_or(item, &["title", "alt", "alt_description", "tags"], DEFAULT_TITLE),
    )
    .with_description(text_or(
        item,
        &["description", "alt_description", "tags"],
        DEFAULT_DESCRIPTION,
    ))
    .with_source_label(provider_label(item, LABEL))
    .with_url(url)
    .with_thumbnail_url(thumbnail)
}

#[async_trait]
impl Source for ImagesConnector {
    fn name(&self) -> &'static str {
        "images"
    }

    fn kind(&self) -> Kind {
        Kind::Image
    }

    fn limit(&self) -> usize {
        self.settings.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let items = backend_records(&self.client, &self.settings, query, limit).await?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, item)| map_image(item, i))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_source;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn maps_image_with_preview() {
        let item = json!({
            "id": 42,
            "title": "Mountain lake",
            "url": "https://img.example.com/full.jpg",
            "thumbnail": "https://img.example.com/small.jpg",
            "source": "Unsplash"
        });
        let record = map_image(&item, 0);
        assert_eq!(record.id, "image-42");
        assert_eq!(record.source_label, "Unsplash");
        assert_eq!(
            record.thumbnail_url.as_deref(),
            Some("https://img.example.com/small.jpg")
        );
    }

    #[test]
    fn thumbnail_falls_back_to_url() {
        let record = map_image(&json!({"url": "https://img.example.com/a.png"}), 1);
        assert_eq!(record.id, "image-2");
        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(
            record.thumbnail_url.as_deref(),
            Some("https://img.example.com/a.png")
        );
        assert!(map_image(&json!({}), 0).thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn never_returns_more_than_twelve() {
        let server = MockServer::start().await;
        let items: Vec<Value> = (0..30).map(|i| json!({"id": i, "title": "img"})).collect();
        Mock::given(method("GET"))
            .and(path("/api/searchImages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": items})))
            .mount(&server)
            .await;

        let connector =
            ImagesConnector::new(Client::new(), builtin_source(Kind::Image, &server.uri()));
        assert_eq!(connector.limit(), 12);
        assert_eq!(connector.fetch("lake", connector.limit()).await.len(), 12);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Nothing listens on port 1
        let connector = ImagesConnector::new(
            Client::new(),
            builtin_source(Kind::Image, "http://127.0.0.1:1"),
        );
        let err = connector.search("lake", 12).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
        assert_eq!(err.code_str(), "upstream_error");
        assert!(connector.fetch("lake", 12).await.is_empty());
    }
}
