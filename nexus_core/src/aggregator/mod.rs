//! Multi-source search aggregation.
//!
//! Fans one query out to every configured [`Source`](crate::Source),
//! concatenates what comes back in [`Kind`] order and asks the
//! [`Summarizer`](crate::Summarizer) for a narrative and a term explanation.

mod engine;
mod types;

pub use engine::{Aggregator, SYNTHESIZED_ID, SYNTHESIZED_LABEL};
pub use types::{AggregationRequest, AggregationResponse, Kind, RequestedKinds, SearchResult};
