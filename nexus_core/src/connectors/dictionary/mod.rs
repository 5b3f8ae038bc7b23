use crate::aggregator::{Kind, SearchResult};
use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::normalize::{record_id, text_field, text_or, DEFAULT_DESCRIPTION, DEFAULT_TITLE};
use crate::utils::get_json;
use crate::Source;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub const LABEL: &str = "Dictionary";

/// Free dictionary lookup (`/entries/en/{word}`), one record per sense.
pub struct DictionaryConnector {
    client: Client,
    settings: SourceSettings,
}

impl DictionaryConnector {
    pub fn new(client: Client, settings: SourceSettings) -> Self {
        Self { client, settings }
    }
}

/// Flatten `[{word, meanings:[{partOfSpeech, definitions:[{definition}]}]}]`
/// into one record per definition, stopping at `limit`.
pub fn map_entries(raw: &Value, limit: usize) -> Vec<SearchResult> {
    let mut records = Vec::new();
    let Some(entries) = raw.as_array() else {
        return records;
    };

    for entry in entries {
        let word = text_or(entry, &["word"], DEFAULT_TITLE);
        let url = entry
            .get("sourceUrls")
            .and_then(|u| u.as_array())
            .and_then(|u| u.first())
            .and_then(|u| u.as_str())
            .unwrap_or_default()
            .to_string();
        let phonetic = text_field(entry, &["phonetic"]);

        let meanings = entry
            .get("meanings")
            .and_then(|m| m.as_array())
            .map(|m| m.as_slice())
            .unwrap_or_default();
        for meaning in meanings {
            let part = text_field(meaning, &["partOfSpeech"]);
            let definitions = meaning
                .get("definitions")
                .and_then(|d| d.as_array())
                .map(|d| d.as_slice())
                .unwrap_or_default();

            for definition in definitions {
                if records.len() >= limit {
                    return records;
                }
                let title = match (&part, &phonetic) {
                    (Some(p), Some(ph)) => format!("{} {} ({})", word, ph, p),
                    (Some(p), None) => format!("{} ({})", word, p),
                    _ => word.clone(),
                };
                let mut description = text_or(definition, &["definition"], DEFAULT_DESCRIPTION);
                if let Some(example) = text_field(definition, &["example"]) {
                    description = format!("{} Example: \"{}\"", description, example);
                }
                let id = record_id(Kind::Dictionary, None, records.len());
                records.push(
                    SearchResult::new(Kind::Dictionary, id, title)
                        .with_description(description)
                        .with_source_label(LABEL)
                        .with_url(url.clone()),
                );
            }
        }
    }

    records
}

#[async_trait]
impl Source for DictionaryConnector {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn kind(&self) -> Kind {
        Kind::Dictionary
    }

    fn limit(&self) -> usize {
        self.settings.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        let url = format!(
            "{}/{}",
            self.settings.endpoint(),
            urlencoding::encode(&query.trim().to_lowercase())
        );
        let raw = get_json(&self.client, &url, &[]).await?;
        if !raw.is_array() {
            return Err(SourceError::Parse(
                "expected an array of dictionary entries".into(),
            ));
        }
        Ok(map_entries(&raw, limit))
    }
}
