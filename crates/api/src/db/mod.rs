//! Database operations for the order store `PostgreSQL`.
//!
//! # Database: `orderdesk`
//!
//! ## Tables
//!
//! - `users` - Owners of addresses and orders
//! - `roles` - Named roles with a description
//! - `products` - Catalog; the source of unit prices at order time
//! - `addresses` - Shipping addresses, at most one default per user
//! - `orders` - Orders with computed total, status, optional address
//! - `order_items` - Line items with snapshotted unit prices
//!
//! # Transactions
//!
//! Every multi-statement operation runs in a single `sqlx::Transaction`.
//! Returning early with `?` drops the transaction, which rolls it back, so no
//! operation here ever commits partially.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p orderdesk-cli -- migrate
//! ```

pub mod addresses;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod roles;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use orderdesk_core::ProductId;
use rust_decimal::Decimal;

pub use addresses::AddressRepository;
pub use orders::OrderRepository;
pub use pricing::UnknownProductPolicy;
pub use products::ProductRepository;
pub use roles::RoleRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An order line references a product that does not exist.
    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    /// The address is still referenced by at least one order.
    #[error("address is in use by one or more orders")]
    AddressInUse,

    /// A computed order total does not fit the stored money columns.
    #[error("order total {0} exceeds the largest storable amount")]
    AmountOutOfRange(Decimal),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_unique_violation(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }

    /// Map a foreign-key violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_foreign_key_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_foreign_key_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
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
