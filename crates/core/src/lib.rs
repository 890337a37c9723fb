//! OrderDesk Core - Shared domain types.
//!
//! This crate provides the types shared by every OrderDesk component:
//! - `api` - Order/address service and its HTTP surface
//! - `cli` - Migrations and seeding
//! - `integration-tests` - Database-backed behavioral tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access. The optional `postgres` feature adds `sqlx` encode/decode impls so
//! the types can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the order status lifecycle, and money arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
