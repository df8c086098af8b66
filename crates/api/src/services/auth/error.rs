//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password missing from the request.
    #[error("Email and password are required")]
    MissingFields,

    /// Invalid email format.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] price_comparer_core::EmailError),

    /// Password too weak or invalid.
    #[error("Password {0}")]
    WeakPassword(String),

    /// User already exists.
    #[error("User already exists")]
    UserAlreadyExists,

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the caller caused the error (reported as `400`).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repository(_) | Self::PasswordHash)
    }
}
