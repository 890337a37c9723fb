//! Order/address coordination.
//!
//! An order waits in `pending` until it has somewhere to ship to. Two things
//! can provide that:
//!
//! 1. The user saves an address. Every pending order of that user moves to
//!    `processing`. This runs as an [`AddressEventListener`] after the address
//!    transaction has committed.
//! 2. An address is assigned to one order. The order gets the address and,
//!    if it was pending, moves to `processing`, all in one transaction.
//!
//! Both are idempotent: repeating them leaves the orders where they are.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};

use orderdesk_core::{AddressId, OrderId, UserId};

use super::ServiceError;
use super::events::{AddressEvent, AddressEventListener};
use crate::db::{OrderRepository, RepositoryError};
use crate::models::AddressAssignment;

/// Keeps order status consistent with address availability.
#[derive(Debug, Clone)]
pub struct OrderAddressCoordinator {
    pool: PgPool,
}

impl OrderAddressCoordinator {
    /// Create a new coordinator.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Advance every pending order of `user_id` to `processing`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails; no order is
    /// advanced in that case.
    #[instrument(skip(self))]
    pub async fn on_address_saved(&self, user_id: UserId) -> Result<Vec<OrderId>, RepositoryError> {
        let advanced = OrderRepository::new(&self.pool)
            .advance_pending_for_user(user_id)
            .await?;

        if !advanced.is_empty() {
            info!(%user_id, count = advanced.len(), "Advanced pending orders to processing");
        }

        Ok(advanced)
    }

    /// Bind an address to an order, advancing it if it was pending.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for unassigned IDs.
    /// Returns `RepositoryError::NotFound` (wrapped) if the order or address
    /// doesn't exist.
    #[instrument(skip(self))]
    pub async fn assign_address_to_order(
        &self,
        order_id: OrderId,
        address_id: AddressId,
    ) -> Result<AddressAssignment, ServiceError> {
        if !order_id.is_assigned() {
            return Err(ServiceError::validation("order_id is required"));
        }
        if !address_id.is_assigned() {
            return Err(ServiceError::validation("address_id is required"));
        }

        let assignment = OrderRepository::new(&self.pool)
            .assign_address(order_id, address_id)
            .await?;

        info!(
            %order_id,
            %address_id,
            from = %assignment.previous_status,
            to = %assignment.status,
            "Assigned address to order"
        );

        Ok(assignment)
    }
}

#[async_trait]
impl AddressEventListener for OrderAddressCoordinator {
    fn name(&self) -> &'static str {
        "order_address_coordinator"
    }

    async fn on_address_event(&self, event: &AddressEvent) -> Result<Vec<OrderId>, RepositoryError> {
        self.on_address_saved(event.user_id).await
    }
}
