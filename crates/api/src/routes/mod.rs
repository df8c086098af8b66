//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database ping)
//!
//! # Prices
//! GET  /api/search             - Ranked prices for ?query=&zipcode=
//!
//! # Lists
//! POST /api/shopping/save      - Replace a shopping list
//! GET  /api/shopping/{list_id} - Load a shopping list
//! POST /api/cart/save          - Replace a user's cart
//! GET  /api/cart/{user_id}     - Load a user's cart
//!
//! # Output
//! POST /api/export/pdf         - Shopping list as PDF
//! POST /api/email              - Email a shopping list
//!
//! # Auth
//! POST /api/auth/sign-up       - Create account and sign in
//! POST /api/auth/sign-in       - Sign in
//! POST /api/auth/sign-out      - Sign out
//! GET  /api/auth/me            - Current user
//! ```

pub mod auth;
pub mod cart;
pub mod email;
pub mod export;
pub mod health;
pub mod search;
pub mod shopping;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::{get, post},
};
use serde_json::Value;

use price_comparer_core::ListItem;

use crate::error::AppError;
use crate::state::AppState;

/// Error for a missing, non-array or malformed `items` field.
pub const INVALID_ITEMS: &str = "Invalid items list";

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/me", get(auth::me))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/search", get(search::search))
        .route("/api/shopping/save", post(shopping::save))
        .route("/api/shopping/{list_id}", get(shopping::show))
        .route("/api/cart/save", post(cart::save))
        .route("/api/cart/{user_id}", get(cart::show))
        .route("/api/export/pdf", post(export::pdf))
        .route("/api/email", post(email::send))
        .nest("/api/auth", auth_routes())
}

// =============================================================================
// Body helpers
// =============================================================================

/// Unwrap a JSON body, reporting malformed input as `400`.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

/// Parse the `items` array of a request body.
///
/// Returns `None` when the field is missing, not an array, or any element
/// is not a valid item.
pub(crate) fn parse_items(body: &Value) -> Option<Vec<ListItem>> {
    let items = body.get("items")?;
    if !items.is_array() {
        return None;
    }
    serde_json::from_value(items.clone()).ok()
}

/// Text field of a request body, trimmed; `None` when missing or blank.
pub(crate) fn text_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
