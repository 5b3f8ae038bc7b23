use crate::aggregator::{Kind, SearchResult};
use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::normalize::{
    id_field, record_id, text_field, text_or, timestamp_field, DEFAULT_DESCRIPTION, DEFAULT_TITLE,
};
use crate::utils::get_json;
use crate::Source;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub const LABEL: &str = "Wikipedia";

/// Page summary lookup (`/page/summary/{title}`), one record per query.
pub struct WikipediaConnector {
    client: Client,
    settings: SourceSettings,
}

impl WikipediaConnector {
    pub fn new(client: Client, settings: SourceSettings) -> Self {
        Self { client, settings }
    }

    fn summary_url(&self, query: &str) -> String {
        let title = query.trim().replace(' ', "_");
        format!(
            "{}/{}",
            self.settings.endpoint(),
            urlencoding::encode(&title)
        )
    }
}

/// Map a page summary object. Returns `None` unless it has a title or extract.
pub fn map_summary(raw: &Value) -> Option<SearchResult> {
    text_field(raw, &["title", "extract"])?;
    let url = raw
        .pointer("/content_urls/desktop/page")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let thumbnail = raw
        .pointer("/thumbnail/source")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Some(
        SearchResult::new(
            Kind::Encyclopedia,
            record_id(Kind::Encyclopedia, id_field(raw, &["pageid"]), 0),
            text_or(raw, &["title", "displaytitle"], DEFAULT_TITLE),
        )
        .with_description(text_or(raw, &["extract", "description"], DEFAULT_DESCRIPTION))
        .with_source_label(LABEL)
        .with_url(url)
        .with_thumbnail_url(thumbnail)
        .with_published_at(timestamp_field(raw, &["timestamp"])),
    )
}

#[async_trait]
impl Source for WikipediaConnector {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    fn kind(&self) -> Kind {
        Kind::Encyclopedia
    }

    fn limit(&self) -> usize {
        self.settings.limit
    }

    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let raw = get_json(&self.client, &self.summary_url(query), &[]).await?;
        Ok(map_summary(&raw).into_iter().collect())
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
    fn maps_summary_object() {
        let raw = json!({
            "type": "standard",
            "title": "Rust (programming language)",
            "pageid": 29414838,
            "extract": "Rust is a general-purpose programming language.",
            "thumbnail": {"source": "https://upload.wikimedia.org/rust.png"},
            "content_urls": {"desktop": {"page": "https://en.wikipedia.org/wiki/Rust_(programming_language)"}},
            "timestamp": "2024-05-01T10:00:00Z"
        });
        let record = map_summary(&raw).unwrap();
        assert_eq!(record.id, "encyclopedia-29414838");
        assert_eq!(record.kind, Kind::Encyclopedia);
        assert_eq!(record.source_label, "Wikipedia");
        assert!(record.url.ends_with("Rust_(programming_language)"));
        assert!(record.thumbnail_url.is_some());
        assert!(record.published_at.is_some());
    }

    #[test]
    fn missing_extract_gets_default() {
        let record = map_summary(&json!({"title": "Stub"})).unwrap();
        assert_eq!(record.description, DEFAULT_DESCRIPTION);
        assert_eq!(record.url, "");
        assert_eq!(record.id, "encyclopedia-1");
        assert!(map_summary(&json!([])).is_none());
        assert_eq!(
            map_summary(&json!({"extract": "Orphan"})).unwrap().title,
            DEFAULT_TITLE
        );
    }

    #[tokio::test]
    async fn requests_underscored_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/machine_learning"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Machine learning",
                "extract": "Field of study."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = builtin_source(Kind::Encyclopedia, "");
        settings.base_url = server.uri();
        let connector = WikipediaConnector::new(Client::new(), settings);
        let records = connector.fetch("machine learning", 1).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Machine learning");
    }

    #[tokio::test]
    async fn missing_page_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"title": "Not found."})))
            .mount(&server)
            .await;

        let mut settings = builtin_source(Kind::Encyclopedia, "");
        settings.base_url = server.uri();
        let connector = WikipediaConnector::new(Client::new(), settings);
        assert!(connector.fetch("zzzz", 1).await.is_empty());
    }
}
