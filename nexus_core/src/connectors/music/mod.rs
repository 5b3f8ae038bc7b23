//! Music "search" routed through the text-generation model.
//!
//! The model is asked for a JSON array of tracks. Its reply is a Gemini
//! response whose first text part *contains* that array, usually wrapped in
//! prose or a code fence, so the body is parsed twice: once as the response
//! envelope, then again for the array cut out of the text.

use super::provider_label;
use crate::aggregator::{Kind, SearchResult};
use crate::error::SourceError;
use crate::gemini::{GenerationOptions, TextGenerator};
use crate::normalize::{
    duration_field, id_field, record_id, text_field, text_or, timestamp_field, DEFAULT_TITLE,
};
use crate::Source;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

pub const LABEL: &str = "Music API";

static ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

pub struct MusicConnector {
    generator: Arc<dyn TextGenerator>,
    limit: usize,
    options: GenerationOptions,
}

impl MusicConnector {
    pub fn new(generator: Arc<dyn TextGenerator>, limit: usize) -> Self {
        Self {
            generator,
            limit,
            options: GenerationOptions {
                temperature: 0.7,
                max_output_tokens: 2048,
            },
        }
    }
}

pub fn music_prompt(query: &str, limit: usize) -> String {
    format!(
        "Find music related to \"{query}\". Respond with only a JSON array of {limit} tracks, \
         each shaped like {{\"id\": \"unique_id\", \"title\": \"song title\", \"artist\": \
         \"artist name\", \"album\": \"album name\", \"url\": \"streaming url\", \"thumbnail\": \
         \"cover art url\", \"source\": \"Spotify\", \"duration\": \"3:45\", \"publishedAt\": \
         \"2023-01-01\"}}."
    )
}

/// Cut the outermost `[...]` out of model text and parse it.
pub fn extract_tracks(text: &str) -> Result<Vec<Value>, SourceError> {
    let found = ARRAY_RE
        .find(text)
        .ok_or_else(|| SourceError::Parse("no JSON array in model output".into()))?;
    match serde_json::from_str::<Value>(found.as_str())? {
        Value::Array(items) => Ok(items),
        _ => Err(SourceError::Parse("model output is not an array".into())),
    }
}

pub fn map_track(item: &Value, index: usize) -> SearchResult {
    let artist = text_or(item, &["artist", "artists"], "Unknown artist");
    let album = text_or(item, &["album"], "Unknown album");

    SearchResult::new(
        Kind::Music,
        record_id(Kind::Music, id_field(item, &["id"]), index),
        text_or(item, &["title", "name"], DEFAULT_TITLE),
    )
    .with_description(format!("{} - {}", artist, album))
    .with_source_label(provider_label(item, LABEL))
    .with_url(text_or(item, &["url", "link"], ""))
    .with_thumbnail_url(text_field(item, &["thumbnail", "cover", "image"]))
    .with_duration_seconds(duration_field(item, &["duration"]))
    .with_published_at(timestamp_field(item, &["publishedAt", "releaseDate"]))
}

#[async_trait]
impl Source for MusicConnector {
    fn name(&self) -> &'static str {
        "music"
    }

    fn kind(&self) -> Kind {
        Kind::Music
    }

    fn limit(&self) -> usize {
        self.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let response = self
            .generator
            .generate(&music_prompt(query, limit), &self.options)
            .await?;
        let text = response.first_text().ok_or(SourceError::EmptyResponse)?;
        let tracks = extract_tracks(text)?;
        Ok(tracks
            .iter()
            .filter(|t| t.is_object())
            .enumerate()
            .map(|(i, item)| map_track(item, i))
            .collect())
    }
}
