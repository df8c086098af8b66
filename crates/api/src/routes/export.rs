//! PDF export handler.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::export;

use super::{INVALID_ITEMS, json_body, parse_items};

/// Render the posted items as a PDF download.
///
/// A body without `items` renders an empty list.
#[instrument(skip(body))]
pub async fn pdf(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Response> {
    let body = json_body(body)?;
    let items = if body.get("items").is_none_or(Value::is_null) {
        Vec::new()
    } else {
        parse_items(&body).ok_or_else(|| AppError::bad_request(INVALID_ITEMS))?
    };

    let bytes = tokio::task::spawn_blocking(move || export::render_shopping_list(&items))
        .await
        .map_err(|e| AppError::Internal(format!("PDF task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=shopping_list.pdf",
            ),
        ],
        bytes,
    )
        .into_response())
}
