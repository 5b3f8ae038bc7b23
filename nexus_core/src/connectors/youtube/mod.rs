use super::{backend_records, provider_label};
use crate::aggregator::{Kind, SearchResult};
use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::normalize::{
    duration_field, id_field, record_id, strip_markup, text_field, text_or, timestamp_field,
    DEFAULT_DESCRIPTION, DEFAULT_TITLE,
};
use crate::Source;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub const LABEL: &str = "YouTube API";

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Video search (`/api/youtube/search?query=&limit=`).
pub struct YoutubeConnector {
    client: Client,
    settings: SourceSettings,
}

impl YoutubeConnector {
    pub fn new(client: Client, settings: SourceSettings) -> Self {
        Self { client, settings }
    }
}

fn thumbnail(item: &Value) -> Option<String> {
    text_field(item, &["thumbnail", "thumbnailUrl"]).or_else(|| {
        ["high", "medium", "default"].iter().find_map(|size| {
            item.get("thumbnails")
                .and_then(|t| t.get(*size))
                .and_then(|t| t.get("url"))
                .and_then(|u| u.as_str())
                .map(|s| s.to_string())
        })
    })
}

pub fn map_video(item: &Value, index: usize) -> SearchResult {
    let video_id = id_field(item, &["videoId", "id"]);
    let url = text_field(item, &["url", "link"])
        .or_else(|| video_id.as_ref().map(|id| format!("{}{}", WATCH_URL, id)))
        .unwrap_or_default();
    let description = text_field(item, &["description", "snippet"])
        .map(|s| strip_markup(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    SearchResult::new(
        Kind::Video,
        record_id(Kind::Video, video_id, index),
        strip_markup(&text_or(item, &["title"], DEFAULT_TITLE)),
    )
    .with_description(description)
    .with_source_label(provider_label(item, LABEL))
    .with_url(url)
    .with_thumbnail_url(thumbnail(item))
    .with_duration_seconds(duration_field(
        item,
        &["duration", "durationSeconds", "lengthSeconds"],
    ))
    .with_published_at(timestamp_field(item, &["publishedAt", "uploadDate"]))
}

#[async_trait]
impl Source for YoutubeConnector {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn kind(&self) -> Kind {
        Kind::Video
    }

    fn limit(&self) -> usize {
        self.settings.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let items = backend_records(&self.client, &self.settings, query, limit).await?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, item)| map_video(item, i))
            .collect())
    }
}
