//! Narrative summaries and term explanations on top of a [`TextGenerator`].
//!
//! `summarize` and `explain` never fail. Every error path ends in a fallback
//! string that still mentions the query, so callers always have something to
//! show in the summary slot.

use crate::aggregator::SearchResult;
use crate::error::SourceError;
use crate::gemini::{GenerationOptions, TextGenerator};
use crate::normalize::truncate_chars;
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest description carried into the summary prompt, per record.
const MAX_DESCRIPTION_CHARS: usize = 300;

pub fn no_results_message(query: &str) -> String {
    format!(
        "No sources were found for \"{}\". Try broadening your search with more general terms.",
        query
    )
}

pub fn summary_fallback(query: &str, source_count: usize) -> String {
    format!(
        "Found {} sources about \"{}\", but a summary could not be generated right now.",
        source_count, query
    )
}

pub fn explanation_fallback(query: &str) -> String {
    format!(
        "An explanation of \"{}\" is not available right now. See the sources below.",
        query
    )
}

/// Narrative used when aggregation itself fails outside the per-source guards.
pub fn aggregation_fallback(query: &str) -> String {
    format!(
        "Search for \"{}\" could not be completed right now. Please try again in a moment.",
        query
    )
}

pub fn summary_prompt(query: &str, corpus: &[SearchResult]) -> String {
    let mut prompt = format!(
        "You are a research assistant. Using only the sources below, write a concise \
         narrative summary (two or three short paragraphs) about \"{}\". Mention where \
         the sources agree and note anything notable.\n\nSources:\n",
        query
    );
    for (i, record) in corpus.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. [{}] {}: {}\n",
            i + 1,
            record.kind,
            record.title,
            truncate_chars(&record.description, MAX_DESCRIPTION_CHARS)
        ));
    }
    prompt
}

pub fn explain_prompt(query: &str) -> String {
    format!(
        "Explain what \"{}\" means in plain language, as a short general-knowledge \
         definition of one paragraph. Do not refer to search results.",
        query
    )
}

/// Prompt-building and fallback wrapper over an optional generator.
///
/// With no generator attached every call returns its fallback immediately.
#[derive(Clone, Default)]
pub struct Summarizer {
    generator: Option<Arc<dyn TextGenerator>>,
    options: GenerationOptions,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, options: GenerationOptions) -> Self {
        Self {
            generator: Some(generator),
            options,
        }
    }

    /// A summarizer that always falls back.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    async fn first_text(&self, prompt: &str) -> Result<String, SourceError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| SourceError::MissingCredentials("no text generator configured".into()))?;
        let response = generator.generate(prompt, &self.options).await?;
        response
            .first_text()
            .map(|t| t.to_string())
            .ok_or(SourceError::EmptyResponse)
    }

    /// Summary of `corpus`, or the error that prevented one.
    pub async fn try_summarize(
        &self,
        query: &str,
        corpus: &[SearchResult],
    ) -> Result<String, SourceError> {
        debug!(records = corpus.len(), "Requesting narrative summary");
        self.first_text(&summary_prompt(query, corpus)).await
    }

    pub async fn try_explain(&self, query: &str) -> Result<String, SourceError> {
        debug!("Requesting term explanation");
        self.first_text(&explain_prompt(query)).await
    }

    pub async fn summarize(&self, query: &str, corpus: &[SearchResult]) -> String {
        match self.try_summarize(query, corpus).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, code = e.code_str(), "Summary unavailable, using fallback");
                summary_fallback(query, corpus.len())
            }
        }
    }

    pub async fn explain(&self, query: &str) -> String {
        match self.try_explain(query).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, code = e.code_str(), "Explanation unavailable, using fallback");
                explanation_fallback(query)
            }
        }
    }
}
