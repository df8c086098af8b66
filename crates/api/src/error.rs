//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Client errors become `400`/`401`
//! with a descriptive message; server errors are captured to Sentry and
//! answered with a fixed message that carries no upstream detail. Every
//! error body is `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, ExportError, MailError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed. `context` is the message shown to clients.
    #[error("{context}: {source}")]
    Database {
        /// Client-facing message.
        context: &'static str,
        /// Underlying failure.
        #[source]
        source: RepositoryError,
    },

    /// Authentication failed. `fallback` is shown for server-side causes.
    #[error("{fallback}: {source}")]
    Auth {
        /// Client-facing message for server-side failures.
        fallback: &'static str,
        /// Underlying failure.
        #[source]
        source: AuthError,
    },

    /// Email delivery failed.
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// PDF rendering failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a store failure, answering clients with `context`.
    #[must_use]
    pub fn database(context: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |source| Self::Database { context, source }
    }

    /// Wrap an auth failure, answering clients with `fallback` on server errors.
    #[must_use]
    pub fn auth(fallback: &'static str) -> impl FnOnce(AuthError) -> Self {
        move |source| Self::Auth { fallback, source }
    }

    /// Bad request with the given message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    const fn is_server_error(&self) -> bool {
        match self {
            Self::Auth { source, .. } => !source.is_client_error(),
            Self::Database { .. }
            | Self::Mail(_)
            | Self::Export(_)
            | Self::Session(_)
            | Self::Internal(_) => true,
            Self::Unauthorized(_) | Self::BadRequest(_) => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ if self.is_server_error() => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Message sent to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database { context, .. } => (*context).to_string(),
            Self::Auth { fallback, source } => {
                if source.is_client_error() {
                    source.to_string()
                } else {
                    (*fallback).to_string()
                }
            }
            Self::Mail(_) => "Failed to send email".to_string(),
            Self::Export(_) => "PDF generation failed".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
