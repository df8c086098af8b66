//! Domain models for the API.
//!
//! These are validated domain objects, separate from database row types and
//! from the JSON shapes the routes accept.

pub mod list;
pub mod price;
pub mod session;
pub mod user;

pub use list::ListKey;
pub use price::{CachedPrice, NewPriceRecord, PriceCandidate, PriceQuote, SearchResultItem};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
