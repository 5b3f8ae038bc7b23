//! Defensive field access shared by the connectors.
//!
//! Upstream payloads are loosely shaped. Every read here either yields a
//! value or a caller-supplied default, so a normalized [`SearchResult`] never
//! carries a hole.
//!
//! [`SearchResult`]: crate::aggregator::SearchResult

use crate::aggregator::Kind;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const DEFAULT_TITLE: &str = "No title";
pub const DEFAULT_DESCRIPTION: &str = "No description available";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static ISO_DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("valid duration regex")
});

/// Find the record list in a response that is either a bare array or an
/// object wrapping one.
pub fn results_array(raw: &Value) -> Vec<&Value> {
    if let Some(arr) = raw.as_array() {
        return arr.iter().collect();
    }

    for field in &[
        "results", "items", "articles", "images", "videos", "tracks", "data",
    ] {
        if let Some(arr) = raw.get(*field).and_then(|v| v.as_array()) {
            return arr.iter().collect();
        }
    }

    Vec::new()
}

/// First non-blank string among `keys`.
pub fn text_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn text_or(item: &Value, keys: &[&str], default: &str) -> String {
    text_field(item, keys).unwrap_or_else(|| default.to_string())
}

/// Identifier that may arrive as a string or a number.
pub fn id_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| item.get(*k)).find_map(|v| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .or_else(|| v.as_u64().map(|n| n.to_string()))
            .or_else(|| v.as_i64().map(|n| n.to_string()))
    })
}

/// Id of the `index`th record from a source, prefixed by kind.
pub fn record_id(kind: Kind, raw: Option<String>, index: usize) -> String {
    match raw {
        Some(raw) => format!("{}-{}", kind, raw),
        None => format!("{}-{}", kind, index + 1),
    }
}

/// RFC 3339 timestamps or plain `YYYY-MM-DD` dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn timestamp_field(item: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    text_field(item, keys).and_then(|s| parse_timestamp(&s))
}

/// Durations as `m:ss`, `h:mm:ss`, ISO 8601 (`PT3M45S`) or plain seconds.
pub fn parse_duration(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs);
    }

    if let Some(caps) = ISO_DURATION_RE.captures(raw) {
        // `P` and a trailing `T` carry no components
        if raw.len() < 2 || raw.ends_with('T') {
            return None;
        }
        let part = |i: usize| match caps.get(i) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        };
        return [(1, 86_400u64), (2, 3_600), (3, 60), (4, 1)]
            .iter()
            .try_fold(0u64, |total, &(i, unit)| {
                part(i)?.checked_mul(unit)?.checked_add(total)
            });
    }

    let parts: Vec<u64> = raw
        .split(':')
        .map(|p| p.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [m, s] if *s < 60 => m.checked_mul(60)?.checked_add(*s),
        [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3_600)?.checked_add(m * 60 + s),
        _ => None,
    }
}

pub fn duration_field(item: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().filter_map(|k| item.get(*k)).find_map(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .or_else(|| v.as_str().and_then(parse_duration))
    })
}

/// Remove HTML tags and decode entities (search snippets carry both).
pub fn strip_markup(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, "");
    html_escape::decode_html_entities(without_tags.trim()).into_owned()
}

/// Cut `text` to at most `max` characters on a char boundary, adding `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn results_array_handles_wrapped_and_bare() {
        let wrapped = json!({"results": [{"id": 1}, {"id": 2}]});
        assert_eq!(results_array(&wrapped).len(), 2);

        let bare = json!([{"id": 1}, {"id": 2}, {"id": 3}]);
        assert_eq!(results_array(&bare).len(), 3);

        let single = json!({"title": "not a list"});
        assert!(results_array(&single).is_empty());
    }

    #[test]
    fn text_or_skips_blank_values() {
        let item = json!({"title": "   ", "name": "Named", "n": 3});
        assert_eq!(text_or(&item, &["title", "name"], DEFAULT_TITLE), "Named");
        assert_eq!(text_or(&item, &["missing", "n"], DEFAULT_TITLE), DEFAULT_TITLE);
    }

    #[test]
    fn id_field_accepts_numbers() {
        let item = json!({"id": 38500000});
        assert_eq!(id_field(&item, &["id"]), Some("38500000".to_string()));
        assert_eq!(record_id(Kind::News, None, 0), "news-1");
        assert_eq!(
            record_id(Kind::Video, Some("abc".into()), 4),
            "video-abc"
        );
    }

    #[test]
    fn parse_timestamp_accepts_dates() {
        let ts = parse_timestamp("2023-01-01").unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-01-01T00:00:00+00:00");
        assert!(parse_timestamp("2024-05-06T07:08:09Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("3:45"), Some(225));
        assert_eq!(parse_duration("1:02:03"), Some(3723));
        assert_eq!(parse_duration("PT4M13S"), Some(253));
        assert_eq!(parse_duration("PT1H"), Some(3600));
        assert_eq!(parse_duration("90"), Some(90));
        assert_eq!(parse_duration("3:75"), None);
        assert_eq!(parse_duration("P"), None);
        assert_eq!(parse_duration("long"), None);
    }

    #[test]
    fn parse_duration_rejects_date_components() {
        assert_eq!(parse_duration("P1DT2H"), Some(93_600));
        assert_eq!(parse_duration("PT"), None);
        assert_eq!(parse_duration("P1DT"), None);
        // months are not minutes
        assert_eq!(parse_duration("P1M"), None);
        assert_eq!(parse_duration("PT1M"), Some(60));
    }

    #[test]
    fn parse_duration_overflow_is_none() {
        assert_eq!(parse_duration("PT9999999999999999H"), None);
        assert_eq!(parse_duration("P99999999999999999999D"), None);
        assert_eq!(parse_duration("999999999999999999:00"), None);
        assert_eq!(parse_duration("9999999999999999:00:00"), None);
        assert_eq!(
            duration_field(&json!({"duration": "PT9999999999999999H"}), &["duration"]),
            None
        );
    }

    #[test]
    fn duration_field_mixed_types() {
        assert_eq!(duration_field(&json!({"duration": 61}), &["duration"]), Some(61));
        assert_eq!(
            duration_field(&json!({"duration": "2:05"}), &["duration"]),
            Some(125)
        );
        assert_eq!(duration_field(&json!({}), &["duration"]), None);
    }

    #[test]
    fn strip_markup_removes_tags_and_entities() {
        let raw = r#"<span class="searchmatch">Rust</span> &amp; Cargo"#;
        assert_eq!(strip_markup(raw), "Rust & Cargo");
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
    }
}
