use async_trait::async_trait;
use nexus_core::connectors::SourceDeps;
use nexus_core::gemini::GeminiResponse;
use nexus_core::store::{NewBlog, NewUser, Store};
use nexus_core::summarizer::{aggregation_fallback, explanation_fallback, no_results_message};
use nexus_core::{
    AggregationRequest, Aggregator, GeminiClient, GenerationOptions, Kind, NexusConfig,
    RequestedKinds, SearchResult, Source, SourceError, Summarizer, TextGenerator,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use wiremock::matchers::{any, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing every HTTP source and Gemini at `server`.
fn config_for(server: &MockServer) -> NexusConfig {
    let uri = server.uri();
    NexusConfig::from_toml_str(&format!(
        r#"
[gemini]
api_key = "test-key"
base_url = "{uri}"

[search]
base_url = "{uri}"
timeout_ms = 2000

[search.encyclopedia]
base_url = "{uri}"

[search.dictionary]
base_url = "{uri}"
"#
    ))
    .unwrap()
}

fn aggregator_for(config: &NexusConfig, store: Option<Store>) -> Aggregator {
    let client = reqwest::Client::new();
    let gemini = GeminiClient::new(client.clone(), &config.gemini);
    let deps = SourceDeps {
        client,
        generator: Some(Arc::new(gemini)),
        store,
    };
    Aggregator::from_config(config, &deps)
}

fn gemini_text(text: &str) -> Value {
    json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
}

fn titled(prefix: &str, n: usize) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| json!({"id": format!("{}{}", prefix, i), "title": format!("{} {}", prefix, i)}))
        .collect();
    json!({ "results": items })
}

async fn mount_gemini(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path_regex(":generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(text)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn technology_news_with_failing_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searchNews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"title": "A"}, {"title": "B"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/searchImages"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_gemini(&server, "Technology is moving fast.").await;

    let response = aggregator_for(&config_for(&server), None)
        .aggregate("technology")
        .await;

    let sources: Vec<&SearchResult> = response
        .results
        .iter()
        .filter(|r| !r.is_synthesized())
        .collect();
    let titles: Vec<&str> = sources.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);
    assert!(sources.iter().all(|r| r.kind == Kind::News));
    assert_eq!(response.of_kind(Kind::Image).count(), 0);
    assert_eq!(
        response.narrative_summary.as_deref(),
        Some("Technology is moving fast.")
    );
}

#[tokio::test]
async fn unreachable_source_drops_out_and_others_still_answer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searchNews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(titled("news", 2)))
        .mount(&server)
        .await;
    mount_gemini(&server, "Two stories.").await;

    // Images point at a port nothing listens on, so the request never connects
    let uri = server.uri();
    let config = NexusConfig::from_toml_str(&format!(
        r#"
[gemini]
api_key = "test-key"
base_url = "{uri}"

[search]
base_url = "{uri}"
timeout_ms = 2000

[search.images]
base_url = "http://127.0.0.1:1"
"#
    ))
    .unwrap();

    let request = AggregationRequest::new("technology")
        .with_kinds(RequestedKinds::only([Kind::News, Kind::Image]));
    let response = aggregator_for(&config, None)
        .aggregate_request(&request)
        .await;

    assert_eq!(response.of_kind(Kind::News).count(), 2);
    assert_eq!(response.of_kind(Kind::Image).count(), 0);
    assert_eq!(response.narrative_summary.as_deref(), Some("Two stories."));
    assert!(server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .all(|r| r.url.path() != "/api/searchImages"));
}

#[tokio::test]
async fn empty_query_makes_no_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = aggregator_for(&config_for(&server), None)
        .aggregate("")
        .await;
    assert!(response.results.is_empty());
    assert!(response.narrative_summary.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn total_failure_still_responds_with_no_results_message() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = aggregator_for(&config_for(&server), None)
        .aggregate("obscurequery")
        .await;
    assert!(response.results.is_empty());
    let narrative = response.narrative_summary.unwrap();
    assert_eq!(narrative, no_results_message("obscurequery"));
    assert!(narrative.contains("obscurequery"));
    assert_eq!(
        response.term_explanation,
        Some(explanation_fallback("obscurequery"))
    );
}

#[tokio::test]
async fn sources_concatenate_in_fixed_order_within_limits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/rest_v1/page/summary/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Rust", "extract": "A language."
        })))
        .mount(&server)
        .await;
    for (route, prefix, n) in [
        ("/api/searchWeb", "web", 9),
        ("/api/searchNews", "news", 20),
        ("/api/searchImages", "img", 30),
        ("/api/youtube/search", "vid", 10),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(titled(prefix, n)))
            .mount(&server)
            .await;
    }
    // Gemini down: no overview, no tracks
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let response = aggregator_for(&config_for(&server), None)
        .aggregate("rust")
        .await;

    let kinds: Vec<Kind> = response.results.iter().map(|r| r.kind).collect();
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);

    assert_eq!(response.of_kind(Kind::Encyclopedia).count(), 1);
    assert_eq!(response.of_kind(Kind::Web).count(), 5);
    assert_eq!(response.of_kind(Kind::News).count(), 8);
    assert_eq!(response.of_kind(Kind::Image).count(), 12);
    assert_eq!(response.of_kind(Kind::Video).count(), 6);
    assert_eq!(response.of_kind(Kind::Synthesized).count(), 0);

    let news: Vec<&str> = response
        .of_kind(Kind::News)
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(news.first(), Some(&"news 0"));
    assert_eq!(news.last(), Some(&"news 7"));
}

#[tokio::test]
async fn only_news_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searchNews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(titled("news", 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("summary")))
        .expect(1)
        .mount(&server)
        .await;

    let request = AggregationRequest::new("rust").with_kinds(RequestedKinds::only([Kind::News]));
    let response = aggregator_for(&config_for(&server), None)
        .aggregate_request(&request)
        .await;

    assert_eq!(response.results.len(), 2);
    assert!(response.term_explanation.is_none());
    assert_eq!(response.narrative_summary.as_deref(), Some("summary"));
    // One GET for news plus the summary POST
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn published_blogs_are_appended_last() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/searchNews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(titled("news", 1)))
        .mount(&server)
        .await;
    mount_gemini(&server, "overview").await;

    let store = Store::in_memory().await.unwrap();
    let user = store
        .create_user(NewUser {
            email: "writer@example.com".into(),
            password: "hunter22".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .create_blog(
            &user.id,
            NewBlog {
                title: "Rust for beginners".into(),
                content: "Ownership first.".into(),
                is_published: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = aggregator_for(&config_for(&server), Some(store))
        .aggregate("rust")
        .await;
    let last = response.results.last().unwrap();
    assert_eq!(last.kind, Kind::Blog);
    assert_eq!(last.url, "/blog/rust-for-beginners");
    assert_eq!(response.results[0].kind, Kind::Synthesized);
}

struct Fixed {
    kind: Kind,
    ids: Vec<&'static str>,
}

#[async_trait]
impl Source for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }
    fn kind(&self) -> Kind {
        self.kind
    }
    fn limit(&self) -> usize {
        10
    }
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        Ok(self
            .ids
            .iter()
            .map(|id| SearchResult::new(self.kind, *id, *id))
            .collect())
    }
}

struct Panics;

#[async_trait]
impl Source for Panics {
    fn name(&self) -> &'static str {
        "panics"
    }
    fn kind(&self) -> Kind {
        Kind::Web
    }
    fn limit(&self) -> usize {
        5
    }
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, SourceError> {
        panic!("adapter bug");
    }
}

struct PanickingGenerator;

#[async_trait]
impl TextGenerator for PanickingGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GeminiResponse, SourceError> {
        panic!("generator bug");
    }
}

#[tokio::test]
async fn panicking_adapter_is_contained() {
    let aggregator = Aggregator::new(Summarizer::disabled())
        .with_source(Arc::new(Panics))
        .with_source(Arc::new(Fixed {
            kind: Kind::News,
            ids: vec!["news-1", "news-2"],
        }));
    let response = aggregator.aggregate("rust").await;
    let ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["news-1", "news-2"]);
    assert!(response.narrative_summary.is_some());
}

#[tokio::test]
async fn panicking_summarizer_falls_back_at_top_level() {
    let summarizer = Summarizer::new(Arc::new(PanickingGenerator), GenerationOptions::default());
    let aggregator = Aggregator::new(summarizer).with_source(Arc::new(Fixed {
        kind: Kind::News,
        ids: vec!["news-1"],
    }));
    let response = aggregator.aggregate("rust").await;
    assert!(response.results.is_empty());
    assert_eq!(
        response.narrative_summary,
        Some(aggregation_fallback("rust"))
    );
    assert_eq!(
        response.term_explanation,
        Some(explanation_fallback("rust"))
    );
}

#[tokio::test]
async fn ids_are_unique_across_sources() {
    let aggregator = Aggregator::new(Summarizer::disabled())
        .with_source(Arc::new(Fixed {
            kind: Kind::News,
            ids: vec!["dup", "dup"],
        }))
        .with_source(Arc::new(Fixed {
            kind: Kind::Video,
            ids: vec!["dup"],
        }));
    let response = aggregator.aggregate("rust").await;
    let ids: HashSet<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(response.results[0].id, "dup");
}
