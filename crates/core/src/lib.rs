//! Price Comparer Core - Shared domain types.
//!
//! This crate provides the types shared by every Price Comparer component:
//! - `api` - HTTP backend (search, lists, carts, auth, export, email)
//! - `cli` - Operator commands for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no database
//! access, no HTTP clients. Database encoding lives behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for emails, IDs, prices, quantities and list items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
