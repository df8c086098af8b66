//! Price search handler.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::SearchResultItem;
use crate::state::AppState;

/// `GET /api/search` query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub zipcode: Option<String>,
}

/// Ranked price results for a product query.
///
/// The zipcode only picks the site filters; an unrecognized one falls back
/// to the full catalogue.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResultItem>>> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::bad_request("query is required"))?;

    let sites = state.sites().select(params.zipcode.as_deref());
    let quotes = state.aggregator().search(query, &sites).await;

    let results = quotes
        .into_iter()
        .enumerate()
        .map(|(rank, quote)| SearchResultItem::from_quote(rank, quote))
        .collect();

    Ok(Json(results))
}
