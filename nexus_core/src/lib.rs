// src/lib.rs
pub mod aggregator;
pub mod auth;
pub mod config;
pub mod connectors;
pub mod error;
pub mod gemini;
pub mod normalize;
pub mod store;
pub mod summarizer;
pub mod utils;

pub use aggregator::{
    AggregationRequest, AggregationResponse, Aggregator, Kind, RequestedKinds, SearchResult,
};
pub use config::{ConfigError, NexusConfig};
pub use error::SourceError;
pub use gemini::{GeminiClient, GenerationOptions, TextGenerator};
pub use summarizer::Summarizer;

use async_trait::async_trait;
use tracing::{debug, warn};

/// A single upstream the aggregator can fan a query out to.
///
/// Implementors only write [`Source::search`], which may fail freely with `?`.
/// The aggregator calls [`Source::fetch`], which never fails: errors become an
/// empty list plus one diagnostic event, and output is capped at `limit`.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable connector name (`wikipedia`, `news`, ...).
    fn name(&self) -> &'static str;

    /// Kind tag carried by every record this source returns.
    fn kind(&self) -> Kind;

    /// Default number of records kept from this source.
    fn limit(&self) -> usize;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SourceError>;

    async fn fetch(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        match self.search(query, limit).await {
            Ok(mut records) => {
                records.truncate(limit);
                debug!(source = self.name(), count = records.len(), "Source returned");
                records
            }
            Err(e) => {
                warn!(
                    source = self.name(),
                    kind = %self.kind(),
                    error = %e,
                    code = e.code_str(),
                    "Source failed, contributing no results"
                );
                Vec::new()
            }
        }
    }
}
