//! Order service.

use sqlx::PgPool;
use tracing::{info, instrument};

use orderdesk_core::{AddressId, MAX_LINE_QUANTITY, OrderId, OrderStatus, UserId};

use super::ServiceError;
use crate::db::{OrderRepository, RepositoryError, UnknownProductPolicy};
use crate::models::{CreatedOrder, NewOrderItem, Order};

/// Order service.
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: PgPool,
    unknown_products: UnknownProductPolicy,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: PgPool, unknown_products: UnknownProductPolicy) -> Self {
        Self {
            pool,
            unknown_products,
        }
    }

    /// Place an order for `user_id`.
    ///
    /// Unit prices come from the catalog at this moment and are stored on the
    /// items; the returned total is their sum. An `address_id` that is not
    /// assigned (zero or negative) is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a missing user, empty items, a
    /// quantity outside `1..=MAX_LINE_QUANTITY` or a missing product ID.
    /// Returns `RepositoryError::UnknownProduct` or `RepositoryError::NotFound`
    /// (wrapped) for missing products, users, or addresses.
    /// Returns `RepositoryError::AmountOutOfRange` (wrapped) if the priced
    /// total is too large to store.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn place(
        &self,
        user_id: UserId,
        items: &[NewOrderItem],
        address_id: Option<AddressId>,
    ) -> Result<CreatedOrder, ServiceError> {
        validate_new_order(user_id, items)?;
        let address_id = address_id.filter(AddressId::is_assigned);

        let created = OrderRepository::new(&self.pool)
            .create(user_id, items, address_id, self.unknown_products)
            .await?;

        info!(
            order_id = %created.id,
            %user_id,
            total = %created.total_amount,
            "Placed order"
        );

        Ok(created)
    }

    /// Get an order with its items and address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if it doesn't exist.
    pub async fn get(&self, id: OrderId) -> Result<Order, ServiceError> {
        OrderRepository::new(&self.pool)
            .get(id)
            .await?
            .ok_or(ServiceError::Repository(RepositoryError::NotFound("order")))
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<Order>, ServiceError> {
        Ok(OrderRepository::new(&self.pool).list(limit).await?)
    }

    /// List a user's pending orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unassigned user ID.
    pub async fn list_pending_by_user(&self, user_id: UserId) -> Result<Vec<Order>, ServiceError> {
        if !user_id.is_assigned() {
            return Err(ServiceError::validation("user_id is required"));
        }
        Ok(OrderRepository::new(&self.pool)
            .list_pending_by_user(user_id)
            .await?)
    }

    /// Set an order's status from its string form.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an empty or unknown status.
    /// Returns `RepositoryError::NotFound` (wrapped) if the order doesn't exist.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<OrderStatus, ServiceError> {
        let status = parse_status(status)?;

        let updated = OrderRepository::new(&self.pool)
            .update_status(id, status)
            .await?;
        if !updated {
            return Err(RepositoryError::NotFound("order").into());
        }

        info!(order_id = %id, %status, "Updated order status");
        Ok(status)
    }

    /// Set the status of many orders in one transaction.
    ///
    /// Returns how many orders were actually updated; unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an empty or unknown status.
    /// Returns a repository error if the update fails; nothing is changed.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn batch_update_status(
        &self,
        ids: &[OrderId],
        status: &str,
    ) -> Result<u64, ServiceError> {
        let status = parse_status(status)?;

        let updated = OrderRepository::new(&self.pool)
            .batch_update_status(ids, status)
            .await?;

        info!(%status, updated, "Batch updated order status");
        Ok(updated)
    }

    /// Delete an order and its items. Returns whether the order existed.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<bool, ServiceError> {
        let deleted = OrderRepository::new(&self.pool).delete(id).await?;
        if deleted {
            info!(order_id = %id, "Deleted order");
        }
        Ok(deleted)
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    raw.parse()
        .map_err(|e: orderdesk_core::ParseStatusError| ServiceError::validation(e.to_string()))
}

fn validate_new_order(user_id: UserId, items: &[NewOrderItem]) -> Result<(), ServiceError> {
    if !user_id.is_assigned() {
        return Err(ServiceError::validation("user_id is required"));
    }
    if items.is_empty() {
        return Err(ServiceError::validation("order must have at least one item"));
    }
    for item in items {
        if !item.product_id.is_assigned() {
            return Err(ServiceError::validation("product_id is required"));
        }
        if item.quantity <= 0 {
            return Err(ServiceError::validation(format!(
                "quantity for product {} must be positive",
                item.product_id
            )));
        }
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(ServiceError::validation(format!(
                "quantity for product {} must be at most {MAX_LINE_QUANTITY}",
                item.product_id
            )));
        }
    }
    Ok(())
}
