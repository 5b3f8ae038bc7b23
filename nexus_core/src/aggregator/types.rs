//! Core types for aggregated search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Which source (or the synthesized explanation) a record came from.
///
/// Declaration order is the fixed concatenation order of the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Synthesized,
    Encyclopedia,
    Web,
    Dictionary,
    News,
    Image,
    Video,
    Music,
    Blog,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synthesized => "synthesized",
            Self::Encyclopedia => "encyclopedia",
            Self::Web => "web",
            Self::Dictionary => "dictionary",
            Self::News => "news",
            Self::Image => "image",
            Self::Video => "video",
            Self::Music => "music",
            Self::Blog => "blog",
        }
    }

    /// Source kinds in the order the aggregator concatenates them.
    pub fn source_kinds() -> &'static [Kind] {
        &[
            Self::Encyclopedia,
            Self::Web,
            Self::Dictionary,
            Self::News,
            Self::Image,
            Self::Video,
            Self::Music,
            Self::Blog,
        ]
    }

    /// Every kind, including the synthesized explanation.
    pub fn all() -> &'static [Kind] {
        &[
            Self::Synthesized,
            Self::Encyclopedia,
            Self::Web,
            Self::Dictionary,
            Self::News,
            Self::Image,
            Self::Video,
            Self::Music,
            Self::Blog,
        ]
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    /// Accepts singular and plural spellings (`image`/`images`, `blog`/`blogs`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthesized" | "overview" => Ok(Self::Synthesized),
            "encyclopedia" | "wikipedia" => Ok(Self::Encyclopedia),
            "web" => Ok(Self::Web),
            "dictionary" | "definitions" => Ok(Self::Dictionary),
            "news" => Ok(Self::News),
            "image" | "images" => Ok(Self::Image),
            "video" | "videos" => Ok(Self::Video),
            "music" | "tracks" => Ok(Self::Music),
            "blog" | "blogs" => Ok(Self::Blog),
            other => Err(format!(
                "unknown kind '{}' (expected one of: {})",
                other,
                Kind::all()
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// A normalized record from any source.
///
/// `id` is unique within one [`AggregationResponse`] only; records are built
/// per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub kind: Kind,
    pub title: String,
    pub description: String,
    pub source_label: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl SearchResult {
    /// Create a record with required fields; the rest start empty.
    pub fn new(kind: Kind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: String::new(),
            source_label: String::new(),
            url: String::new(),
            published_at: None,
            duration_seconds: None,
            thumbnail_url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_duration_seconds(mut self, seconds: Option<u64>) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_thumbnail_url(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail_url = thumbnail;
        self
    }

    pub fn is_synthesized(&self) -> bool {
        self.kind == Kind::Synthesized
    }
}

/// Which kinds a caller wants back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestedKinds {
    #[default]
    All,
    Only(BTreeSet<Kind>),
}

impl RequestedKinds {
    pub fn only<I: IntoIterator<Item = Kind>>(kinds: I) -> Self {
        let set: BTreeSet<Kind> = kinds.into_iter().collect();
        if set.is_empty() {
            Self::All
        } else {
            Self::Only(set)
        }
    }

    pub fn includes(&self, kind: Kind) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(&kind),
        }
    }
}

/// `all`, or the kinds comma-separated in concatenation order.
impl fmt::Display for RequestedKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(set) => {
                let names: Vec<&str> = set.iter().map(|k| k.as_str()).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

/// One search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
    pub query: String,
    pub requested_kinds: RequestedKinds,
}

impl AggregationRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            requested_kinds: RequestedKinds::All,
        }
    }

    pub fn with_kinds(mut self, kinds: RequestedKinds) -> Self {
        self.requested_kinds = kinds;
        self
    }
}

/// Everything one aggregation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AggregationResponse {
    /// The response for a rejected (blank) query.
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            narrative_summary: None,
            term_explanation: None,
            duration_ms: None,
        }
    }

    /// Records of one kind, in response order.
    pub fn of_kind(&self, kind: Kind) -> impl Iterator<Item = &SearchResult> {
        self.results.iter().filter(move |r| r.kind == kind)
    }

    /// Number of records that came from real sources.
    pub fn source_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_synthesized()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_plural_aliases() {
        assert_eq!("images".parse::<Kind>().unwrap(), Kind::Image);
        assert_eq!("Videos".parse::<Kind>().unwrap(), Kind::Video);
        assert_eq!("blogs".parse::<Kind>().unwrap(), Kind::Blog);
        assert!("podcasts".parse::<Kind>().is_err());
    }

    #[test]
    fn source_kinds_follow_declared_order() {
        let kinds = Kind::source_kinds();
        assert_eq!(kinds.first(), Some(&Kind::Encyclopedia));
        assert_eq!(kinds[6], Kind::Music);
        let mut sorted = kinds.to_vec();
        sorted.sort();
        assert_eq!(sorted, kinds);
    }

    #[test]
    fn requested_kinds_empty_set_means_all() {
        assert_eq!(RequestedKinds::only(Vec::new()), RequestedKinds::All);
        let only_news = RequestedKinds::only([Kind::News]);
        assert!(only_news.includes(Kind::News));
        assert!(!only_news.includes(Kind::Image));
        assert!(!only_news.includes(Kind::Synthesized));
    }

    #[test]
    fn requested_kinds_display() {
        assert_eq!(RequestedKinds::All.to_string(), "all");
        let kinds = RequestedKinds::only([Kind::Video, Kind::News]);
        assert_eq!(kinds.to_string(), "news,video");
    }

    #[test]
    fn search_result_serializes_camel_case_and_skips_empty_options() {
        let result = SearchResult::new(Kind::Video, "video-1", "Intro")
            .with_source_label("YouTube API")
            .with_duration_seconds(Some(225));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "video");
        assert_eq!(json["sourceLabel"], "YouTube API");
        assert_eq!(json["durationSeconds"], 225);
        assert!(json.get("thumbnailUrl").is_none());
        assert!(json.get("publishedAt").is_none());
    }

    #[test]
    fn source_count_ignores_synthesized() {
        let mut response = AggregationResponse::empty("rust");
        response
            .results
            .push(SearchResult::new(Kind::Synthesized, "synthesized-overview", "rust"));
        response
            .results
            .push(SearchResult::new(Kind::News, "news-1", "Rust 2.0"));
        assert_eq!(response.source_count(), 1);
        assert_eq!(response.of_kind(Kind::News).count(), 1);
    }
}
