//! User domain types.

use chrono::{DateTime, Utc};

use price_comparer_core::{Email, UserId};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique).
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
