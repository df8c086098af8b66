//! Domain types for Price Comparer.

pub mod email;
pub mod id;
pub mod item;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use item::{ListItem, Quantity, QuantityError};
pub use price::{Price, PriceError};
