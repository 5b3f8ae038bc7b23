//! Aggregation execution engine.
//!
//! Every source call runs under its own timeout and panic guard, and all of
//! them run concurrently with the explanation request. The whole run is
//! guarded once more so `aggregate` always returns a response.

use super::{AggregationRequest, AggregationResponse, Kind, RequestedKinds, SearchResult};
use crate::config::{NexusConfig, DEFAULT_TIMEOUT_MS};
use crate::connectors::{build_sources, SourceDeps};
use crate::summarizer::{
    aggregation_fallback, explanation_fallback, no_results_message, Summarizer,
};
use crate::Source;
use futures::future::join_all;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Id of the synthesized explanation record.
pub const SYNTHESIZED_ID: &str = "synthesized-overview";
pub const SYNTHESIZED_LABEL: &str = "Gemini";

pub struct Aggregator {
    sources: Vec<Arc<dyn Source>>,
    summarizer: Summarizer,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(summarizer: Summarizer) -> Self {
        Self {
            sources: Vec::new(),
            summarizer,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Register a source. Sources are kept in concatenation order; two
    /// sources of the same kind keep their registration order.
    pub fn with_source(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self.sources.sort_by_key(|s| s.kind());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Every enabled source from `config`, with a summarizer on `deps.generator`.
    pub fn from_config(config: &NexusConfig, deps: &SourceDeps) -> Self {
        let summarizer = match &deps.generator {
            Some(generator) => {
                Summarizer::new(Arc::clone(generator), config.gemini.generation_options())
            }
            None => Summarizer::disabled(),
        };
        build_sources(config, deps)
            .into_iter()
            .fold(Self::new(summarizer), |agg, source| agg.with_source(source))
            .with_timeout(Duration::from_millis(config.search.timeout_ms))
    }

    pub fn sources(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Search every source for `query`.
    pub async fn aggregate(&self, query: &str) -> AggregationResponse {
        self.aggregate_request(&AggregationRequest::new(query)).await
    }

    /// Search the requested kinds for `request.query`. Never fails.
    pub async fn aggregate_request(&self, request: &AggregationRequest) -> AggregationResponse {
        let query = request.query.trim();
        if query.is_empty() {
            debug!("Blank query, nothing to aggregate");
            return AggregationResponse::empty(request.query.clone());
        }

        let start = Instant::now();
        let run = AssertUnwindSafe(self.run(query, &request.requested_kinds)).catch_unwind();
        let mut response = match run.await {
            Ok(response) => response,
            Err(_) => {
                error!("Aggregation aborted unexpectedly, returning fallback");
                failed(query)
            }
        };
        response.duration_ms = Some(start.elapsed().as_millis() as u64);
        response
    }

    async fn run(&self, query: &str, requested: &RequestedKinds) -> AggregationResponse {
        let sources: Vec<&Arc<dyn Source>> = self
            .sources
            .iter()
            .filter(|s| requested.includes(s.kind()))
            .collect();
        let wants_explanation = requested.includes(Kind::Synthesized);
        debug!(
            sources = sources.len(),
            explanation = wants_explanation,
            "Aggregation plan"
        );

        let explanation = async {
            if wants_explanation {
                Some(self.summarizer.try_explain(query).await)
            } else {
                None
            }
        };
        let fetches = join_all(sources.iter().map(|s| self.fetch_guarded(s, query)));
        let (explanation, batches) = tokio::join!(explanation, fetches);

        let mut results: Vec<SearchResult> = batches.into_iter().flatten().collect();
        let narrative_summary = if results.is_empty() {
            no_results_message(query)
        } else {
            self.summarizer.summarize(query, &results).await
        };

        let term_explanation = match explanation {
            Some(Ok(text)) => {
                let overview = SearchResult::new(Kind::Synthesized, SYNTHESIZED_ID, query)
                    .with_description(text.clone())
                    .with_source_label(SYNTHESIZED_LABEL);
                results.insert(0, overview);
                Some(text)
            }
            Some(Err(e)) => {
                warn!(error = %e, code = e.code_str(), "Explanation unavailable, using fallback");
                Some(explanation_fallback(query))
            }
            None => None,
        };

        ensure_unique_ids(&mut results);

        AggregationResponse {
            query: query.to_string(),
            results,
            narrative_summary: Some(narrative_summary),
            term_explanation,
            duration_ms: None,
        }
    }

    /// One source call under the per-source timeout and a panic guard.
    async fn fetch_guarded(&self, source: &Arc<dyn Source>, query: &str) -> Vec<SearchResult> {
        let limit = source.limit();
        let guarded = AssertUnwindSafe(source.fetch(query, limit)).catch_unwind();

        match timeout(self.timeout, guarded).await {
            Ok(Ok(mut records)) => {
                records.truncate(limit);
                records
            }
            Ok(Err(_)) => {
                warn!(
                    source = source.name(),
                    kind = %source.kind(),
                    code = "panic",
                    "Source panicked, contributing no results"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    source = source.name(),
                    kind = %source.kind(),
                    code = "timeout",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Source timed out, contributing no results"
                );
                Vec::new()
            }
        }
    }
}

/// Response for a run that failed outside the per-source guards.
fn failed(query: &str) -> AggregationResponse {
    AggregationResponse {
        query: query.to_string(),
        results: Vec::new(),
        narrative_summary: Some(aggregation_fallback(query)),
        term_explanation: Some(explanation_fallback(query)),
        duration_ms: None,
    }
}

/// Suffix repeated ids (`news-1`, `news-1-2`, ...) so every id in one response
/// is distinct.
fn ensure_unique_ids(results: &mut [SearchResult]) {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    for record in results.iter_mut() {
        if seen.insert(record.id.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = format!("{}-{}", record.id, n);
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", record.id, n);
        }
        seen.insert(candidate.clone());
        record.id = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::gemini::{GeminiResponse, GenerationOptions, TextGenerator};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Stub {
        kind: Kind,
        count: usize,
        limit: usize,
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(kind: Kind, count: usize, limit: usize) -> Arc<Self> {
            Arc::new(Self {
                kind,
                count,
                limit,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Source for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }
        fn kind(&self) -> Kind {
            self.kind
        }
        fn limit(&self) -> usize {
            self.limit
        }
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.count)
                .map(|i| {
                    SearchResult::new(self.kind, format!("{}-{}", self.kind, i + 1), "t")
                        .with_description("d")
                })
                .collect())
        }
    }

    struct Slow;

    #[async_trait]
    impl Source for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }
        fn kind(&self) -> Kind {
            Kind::Web
        }
        fn limit(&self) -> usize {
            5
        }
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, SourceError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![SearchResult::new(Kind::Web, "web-1", "late")])
        }
    }

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<GeminiResponse, SourceError> {
            Ok(serde_json::from_value(json!({
                "candidates": [{"content": {"parts": [{"text": "generated"}]}}]
            }))?)
        }
    }

    fn with_echo() -> Summarizer {
        Summarizer::new(Arc::new(Echo), GenerationOptions::default())
    }

    #[tokio::test]
    async fn blank_query_touches_nothing() {
        let news = Stub::new(Kind::News, 2, 8);
        let agg = Aggregator::new(with_echo()).with_source(news.clone());
        let response = agg.aggregate("   ").await;
        assert!(response.results.is_empty());
        assert!(response.narrative_summary.is_none());
        assert!(response.term_explanation.is_none());
        assert_eq!(news.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sources_are_concatenated_in_kind_order() {
        let agg = Aggregator::new(Summarizer::disabled())
            .with_source(Stub::new(Kind::Video, 1, 6))
            .with_source(Stub::new(Kind::Encyclopedia, 1, 1))
            .with_source(Stub::new(Kind::News, 2, 8));
        let kinds: Vec<Kind> = agg
            .aggregate("rust")
            .await
            .results
            .iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![Kind::Encyclopedia, Kind::News, Kind::News, Kind::Video]
        );
    }

    #[tokio::test]
    async fn explanation_is_prepended_when_it_succeeds() {
        let agg = Aggregator::new(with_echo()).with_source(Stub::new(Kind::News, 1, 8));
        let response = agg.aggregate("rust").await;
        assert_eq!(response.results[0].id, SYNTHESIZED_ID);
        assert_eq!(response.results[0].description, "generated");
        assert_eq!(response.term_explanation.as_deref(), Some("generated"));
        assert_eq!(response.narrative_summary.as_deref(), Some("generated"));
        assert_eq!(response.source_count(), 1);
        assert!(response.duration_ms.is_some());
    }

    #[tokio::test]
    async fn failed_explanation_leaves_no_synthesized_record() {
        let agg = Aggregator::new(Summarizer::disabled()).with_source(Stub::new(Kind::News, 1, 8));
        let response = agg.aggregate("rust").await;
        assert!(response.results.iter().all(|r| !r.is_synthesized()));
        assert_eq!(
            response.term_explanation,
            Some(explanation_fallback("rust"))
        );
    }

    #[tokio::test]
    async fn slow_source_times_out_without_blocking_others() {
        let agg = Aggregator::new(Summarizer::disabled())
            .with_source(Arc::new(Slow))
            .with_source(Stub::new(Kind::News, 1, 8))
            .with_timeout(Duration::from_millis(50));
        let response = agg.aggregate("rust").await;
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].kind, Kind::News);
    }

    #[tokio::test]
    async fn requested_kinds_filter_sources_and_explanation() {
        let news = Stub::new(Kind::News, 1, 8);
        let images = Stub::new(Kind::Image, 1, 12);
        let agg = Aggregator::new(with_echo())
            .with_source(news.clone())
            .with_source(images.clone());
        let request =
            AggregationRequest::new("rust").with_kinds(RequestedKinds::only([Kind::News]));
        let response = agg.aggregate_request(&request).await;
        assert_eq!(response.results.len(), 1);
        assert!(response.term_explanation.is_none());
        assert_eq!(news.calls.load(Ordering::SeqCst), 1);
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duplicate_ids_get_suffixes() {
        let mut results = vec![
            SearchResult::new(Kind::News, "news-1", "a"),
            SearchResult::new(Kind::News, "news-1", "b"),
            SearchResult::new(Kind::News, "news-1-2", "c"),
            SearchResult::new(Kind::News, "news-1", "d"),
        ];
        ensure_unique_ids(&mut results);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["news-1", "news-1-2", "news-1-2-2", "news-1-3"]);
    }
}
