//! Shopping list handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::ListKey;
use crate::state::AppState;

use super::{INVALID_ITEMS, json_body, parse_items, text_field};

/// Replace a shopping list.
///
/// Body: `{"items": [...], "list_id": "optional"}`. Without `list_id` the
/// default list is replaced.
#[instrument(skip(state, body))]
pub async fn save(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(body)?;
    let items = parse_items(&body).ok_or_else(|| AppError::bad_request(INVALID_ITEMS))?;
    let key = ListKey::shopping_list(text_field(&body, "list_id"));

    state
        .lists()
        .replace(&key, &items)
        .await
        .map_err(AppError::database("Failed to save"))?;

    tracing::info!(list = %key, items = items.len(), "Shopping list saved");
    Ok(Json(json!({ "message": "Shopping list saved!" })))
}

/// Load a shopping list. Unknown ids give an empty list.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> Result<Json<Value>> {
    let key = ListKey::shopping_list(Some(&list_id));
    let items = state
        .lists()
        .load(&key)
        .await
        .map_err(AppError::database("Failed to load shopping list"))?;

    Ok(Json(json!({ "items": items })))
}
