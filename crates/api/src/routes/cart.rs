//! Cart handlers. Carts are keyed by user id.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::ListKey;
use crate::state::AppState;

use super::{INVALID_ITEMS, json_body, parse_items};

/// `user_id` as text; numeric ids are accepted too.
fn user_id(body: &Value) -> Option<String> {
    match body.get("user_id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Replace a user's cart.
///
/// Body: `{"user_id": "...", "items": [...]}`.
#[instrument(skip(state, body))]
pub async fn save(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(body)?;
    let user_id = user_id(&body).ok_or_else(|| AppError::bad_request("Missing user_id"))?;
    let items = parse_items(&body).ok_or_else(|| AppError::bad_request(INVALID_ITEMS))?;
    let key = ListKey::cart(&user_id);

    state
        .lists()
        .replace(&key, &items)
        .await
        .map_err(AppError::database("Failed to save user cart"))?;

    tracing::info!(list = %key, items = items.len(), "Cart saved");
    Ok(Json(json!({ "message": "Cart saved!" })))
}

/// Load a user's cart. Users without one get an empty list.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let items = state
        .lists()
        .load(&ListKey::cart(&user_id))
        .await
        .map_err(AppError::database("Failed to load cart"))?;

    Ok(Json(json!({ "items": items })))
}
