//! Persistence for the price cache, stored lists and user accounts.
//!
//! # Tables
//!
//! - `prices` - Append-only price cache
//! - `users` - Email/password accounts
//! - `list_items` - Shopping list and cart items
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p price-comparer-cli -- migrate
//! ```
//!
//! Each store is a trait so handlers and the aggregator can run against the
//! `PostgreSQL` repositories in production and the [`memory`] stores in tests.

pub mod lists;
pub mod memory;
pub mod prices;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use price_comparer_core::{Email, ListItem, PriceRecordId};

use crate::models::{CachedPrice, ListKey, NewPriceRecord, User};

pub use lists::ListRepository;
pub use memory::{MemoryListStore, MemoryPriceCache, MemoryUserStore};
pub use prices::PriceRepository;
pub use users::UserRepository;

/// Maximum rows returned by a cache lookup.
pub const CACHE_LOOKUP_LIMIT: i64 = 50;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Value can't be represented in the database.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Read and append access to cached prices.
#[async_trait]
pub trait PriceCache: Send + Sync {
    /// Rows whose title contains `query` (case-insensitive), cheapest first,
    /// at most [`CACHE_LOOKUP_LIMIT`].
    async fn lookup(&self, query: &str) -> Result<Vec<CachedPrice>, RepositoryError>;

    /// Append one observation. Never updates existing rows.
    async fn append(&self, record: &NewPriceRecord) -> Result<PriceRecordId, RepositoryError>;
}

/// Full-replace storage for shopping lists and carts.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Replace every item stored under `key` with `items`.
    async fn replace(&self, key: &ListKey, items: &[ListItem]) -> Result<(), RepositoryError>;

    /// Items stored under `key`, in saved order. Unknown keys are empty.
    async fn load(&self, key: &ListKey) -> Result<Vec<ListItem>, RepositoryError>;
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// The user and their password hash, if the email is registered.
    async fn find_by_email(&self, email: &Email)
    -> Result<Option<(User, String)>, RepositoryError>;

    /// Insert a new account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    async fn insert(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Escape `LIKE` wildcards so user text matches literally.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Map a unique-constraint violation to `Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("eggs"), "eggs");
        assert_eq!(escape_like("100%_juice"), "100\\%\\_juice");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
