use crate::cli::Cli;
use crate::commands::{load_config, open_store, require_user, spinner, CommandError, Result};
use crate::output::{format_output, OutputData};
use nexus_core::connectors::SourceDeps;
use nexus_core::store::{Store, StoreError};
use nexus_core::utils::build_client;
use nexus_core::{
    AggregationRequest, AggregationResponse, Aggregator, GeminiClient, Kind, RequestedKinds,
    TextGenerator,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Parse `-k` values into a kind filter. No values means every kind.
pub fn parse_kinds(raw: &[String]) -> Result<RequestedKinds> {
    let kinds = raw
        .iter()
        .flat_map(|k| k.split(','))
        .filter(|k| !k.trim().is_empty())
        .map(|k| k.parse::<Kind>().map_err(CommandError::InvalidInput))
        .collect::<Result<Vec<Kind>>>()?;
    Ok(RequestedKinds::only(kinds))
}

/// Save a finished search to the user's history. Blank queries are skipped.
pub async fn record_history(
    store: &Store,
    user_id: &str,
    request: &AggregationRequest,
    response: &AggregationResponse,
) -> std::result::Result<(), StoreError> {
    if request.query.trim().is_empty() {
        return Ok(());
    }
    store
        .record_search(
            user_id,
            &request.query,
            &request.requested_kinds.to_string(),
            response.results.len(),
        )
        .await?;
    Ok(())
}

pub async fn run(cli: &Cli, query: &str, kinds: &[String], token: Option<&str>) -> Result<()> {
    let requested = parse_kinds(kinds)?;
    let config = load_config(cli)?;

    // A bad token costs the history entry, never the search
    let user_id = match token {
        Some(token) => match require_user(&config, Some(token)) {
            Ok(user_id) => Some(user_id),
            Err(e) => {
                warn!(error = %e, "Search will not be saved to history");
                None
            }
        },
        None => None,
    };

    let client = build_client(None)?;
    let gemini = GeminiClient::new(client.clone(), &config.gemini);
    let generator: Option<Arc<dyn TextGenerator>> = if gemini.has_api_key() {
        Some(Arc::new(gemini))
    } else {
        debug!("No Gemini API key; summaries and music search are off");
        None
    };

    // A broken database only costs the blog results
    let store = if requested.includes(Kind::Blog) || user_id.is_some() {
        match open_store(&config).await {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, "Blog store unavailable");
                None
            }
        }
    } else {
        None
    };

    let history = user_id.zip(store.clone());
    let deps = SourceDeps {
        client,
        generator,
        store: store.filter(|_| requested.includes(Kind::Blog)),
    };
    let aggregator = Aggregator::from_config(&config, &deps);
    let request = AggregationRequest::new(query).with_kinds(requested);

    let progress = spinner(format!("Searching for '{}'...", query.trim()));
    let response = aggregator.aggregate_request(&request).await;
    progress.finish_and_clear();

    if let Some((user_id, store)) = history {
        if let Err(e) = record_history(&store, &user_id, &request, &response).await {
            warn!(error = %e, "Failed to save search history");
        }
    }

    format_output(&OutputData::Aggregation(response), &cli.output)
}
