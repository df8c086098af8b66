//! Shopping list email handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::instrument;

use price_comparer_core::Email;

use crate::error::{AppError, Result};
use crate::services::render_shopping_list;
use crate::state::AppState;

use super::{json_body, parse_items, text_field};

const INVALID_REQUEST: &str = "Invalid email or shopping list";

/// Email the posted items to the given address.
///
/// Body: `{"email": "...", "items": [...]}`; `items` must be non-empty.
#[instrument(skip(state, body))]
pub async fn send(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(body)?;
    let to = text_field(&body, "email")
        .and_then(|e| Email::parse(e).ok())
        .ok_or_else(|| AppError::bad_request(INVALID_REQUEST))?;
    let items = parse_items(&body)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| AppError::bad_request(INVALID_REQUEST))?;

    let email = render_shopping_list(&items)?;
    state.mailer().send(&to, &email).await?;

    Ok(Json(json!({ "message": "Email sent successfully" })))
}
