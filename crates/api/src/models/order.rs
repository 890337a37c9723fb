//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{AddressId, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::Address;

/// An order with its items and, when bound, its shipping address.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    /// Sum of item `price × quantity`, fixed at creation.
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// A line on an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price snapshotted when the order was placed.
    pub price: Decimal,
    /// Current catalog name/status, for display. `None` if the product is gone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
}

/// Denormalized product details shown next to an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub name: String,
    pub status: String,
}

/// A requested order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Result of placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub total_amount: Decimal,
}

/// Result of binding an address to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressAssignment {
    pub order_id: OrderId,
    pub address_id: AddressId,
    pub previous_status: OrderStatus,
    pub status: OrderStatus,
}

impl AddressAssignment {
    /// Whether the assignment moved the order forward in its lifecycle.
    #[must_use]
    pub fn advanced(&self) -> bool {
        self.previous_status != self.status
    }
}
