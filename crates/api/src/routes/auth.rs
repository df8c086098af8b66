//! Account route handlers.
//!
//! Successful sign-up and sign-in store the user in the session.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::state::AppState;

use super::json_body;

/// User as returned to the client.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
}

impl From<&CurrentUser> for UserView {
    fn from(user: &CurrentUser) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.to_string(),
        }
    }
}

fn credentials(body: &Value) -> (&str, &str) {
    fn field<'a>(body: &'a Value, key: &str) -> &'a str {
        body.get(key).and_then(Value::as_str).unwrap_or_default()
    }
    (field(body, "email"), field(body, "password"))
}

async fn start_session(session: &Session, user: User) -> Result<Json<Value>> {
    let current = CurrentUser {
        id: user.id,
        email: user.email,
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    Ok(Json(json!({ "user": UserView::from(&current) })))
}

/// Create an account and sign in.
#[instrument(skip(state, session, body))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(body)?;
    let (email, password) = credentials(&body);

    let user = state
        .auth()
        .sign_up(email, password)
        .await
        .map_err(AppError::auth("Sign-up failed"))?;

    start_session(&session, user).await
}

/// Sign in with email and password.
#[instrument(skip(state, session, body))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let body = json_body(body)?;
    let (email, password) = credentials(&body);

    let user = state
        .auth()
        .sign_in(email, password)
        .await
        .map_err(AppError::auth("Sign-in failed"))?;

    start_session(&session, user).await
}

/// Sign out. Succeeds whether or not anyone was signed in.
#[instrument(skip(session))]
pub async fn sign_out(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "message": "Signed out" })))
}

/// The signed-in user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<Value> {
    Json(json!({ "user": UserView::from(&user) }))
}
