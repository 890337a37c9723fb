//! OrderDesk API library.
//!
//! Order and shipping-address service over `PostgreSQL`: transactional order
//! placement with snapshotted prices, a single default address per user, and
//! order status kept in step with address availability.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
