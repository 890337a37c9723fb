//! Catalog product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use orderdesk_core::ProductId;

/// A catalog product.
///
/// `price` is the current catalog price. Orders copy it onto their items at
/// creation time, so editing it later never changes a placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Free-form catalog status, e.g. `active` or `inactive`.
    pub status: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
