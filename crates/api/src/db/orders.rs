//! Order repository for database operations.
//!
//! Orders are created together with their items in one transaction, with unit
//! prices read from the catalog on that same transaction and copied onto the
//! items. Reads hydrate items (with current product details when the product
//! still exists) and the bound shipping address.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use orderdesk_core::{
    AddressId, OrderId, OrderItemId, OrderStatus, ProductId, UserId, fits_storage, order_total,
};

use super::RepositoryError;
use super::addresses::{fetch_addresses, lock_address_for_reference};
use super::pricing::{UnknownProductPolicy, resolve_unit_price};
use crate::models::address::Address;
use crate::models::order::{
    AddressAssignment, CreatedOrder, NewOrderItem, Order, OrderItem, ProductSummary,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    address_id: Option<i32>,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(
        self,
        items: Vec<OrderItem>,
        address: Option<Address>,
    ) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            address_id: self.address_id.map(AddressId::new),
            total_amount: self.total_amount,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
            address,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Decimal,
    product_name: Option<String>,
    product_status: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        let product = match (row.product_name, row.product_status) {
            (Some(name), Some(status)) => Some(ProductSummary { name, status }),
            _ => None,
        };

        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            price: row.price,
            product,
        }
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus, RepositoryError> {
    raw.parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid order status in database: {e}")))
}

const ORDER_COLUMNS: &str =
    "id, user_id, address_id, total_amount, status, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// Runs as one transaction: share-lock the address (if any), price each
    /// item from the catalog, insert the order as `pending`, insert the items
    /// with their snapshotted prices. Nothing is written unless every step
    /// succeeds.
    ///
    /// Input validation (non-empty items, positive quantities) belongs to the
    /// caller; the storage constraints still reject a non-positive quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address or user doesn't exist.
    /// Returns `RepositoryError::UnknownProduct` for a missing product under
    /// `UnknownProductPolicy::Reject`.
    /// Returns `RepositoryError::AmountOutOfRange` if the total would not fit
    /// the stored money columns; nothing is written.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        items: &[NewOrderItem],
        address_id: Option<AddressId>,
        policy: UnknownProductPolicy,
    ) -> Result<CreatedOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(address_id) = address_id {
            lock_address_for_reference(&mut *tx, address_id).await?;
        }

        let mut priced = Vec::with_capacity(items.len());
        for item in items {
            let unit_price = resolve_unit_price(&mut *tx, item.product_id, policy).await?;
            priced.push((item, unit_price));
        }
        let total_amount = order_total(priced.iter().map(|(item, price)| (*price, item.quantity)));
        if !fits_storage(total_amount) {
            return Err(RepositoryError::AmountOutOfRange(total_amount));
        }

        let order_id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO orders (user_id, address_id, total_amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .bind(total_amount)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound("user");
            }
            RepositoryError::Database(e)
        })?;

        for (item, unit_price) in &priced {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(*unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(order_id, %user_id, items = priced.len(), %total_amount, "Inserted order");

        Ok(CreatedOrder {
            id: OrderId::new(order_id),
            total_amount,
        })
    }

    /// Get an order with its items and address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let mut orders = hydrate(&mut *conn, vec![row]).await?;
                Ok(orders.pop())
            }
            None => Ok(None),
        }
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn list(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut *conn, rows).await
    }

    /// List a user's pending orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn list_pending_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE user_id = $1 AND status = $2
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut *conn, rows).await
    }

    /// Set an order's status.
    ///
    /// Returns `false` if the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an order and its items.
    ///
    /// Returns `false` if the order did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the status of many orders at once.
    ///
    /// IDs that match no order are skipped. Returns the number of orders
    /// updated, not the number of IDs requested: an ID listed twice is one
    /// row and counts once. On failure nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn batch_update_status(
        &self,
        ids: &[OrderId],
        status: OrderStatus,
    ) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// Move every pending order of a user to `processing`.
    ///
    /// One statement, so either every pending order advances or none does.
    /// Running it again finds nothing to advance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn advance_pending_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE user_id = $1 AND status = $3
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(OrderStatus::Processing.as_str())
        .bind(OrderStatus::Pending.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(OrderId::new).collect())
    }

    /// Bind an address to an order and advance it out of `pending`.
    ///
    /// Locks the order row, then share-locks the address, so a concurrent
    /// delete of the address waits for this transaction. An order that is
    /// already past `pending` keeps its status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order or address doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn assign_address(
        &self,
        order_id: OrderId,
        address_id: AddressId,
    ) -> Result<AddressAssignment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let raw_status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("order"))?;
        let previous_status = parse_status(&raw_status)?;

        lock_address_for_reference(&mut *tx, address_id).await?;

        set_address(&mut *tx, order_id, address_id).await?;

        let status = previous_status.with_address_bound();
        if status != previous_status {
            sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(order_id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(AddressAssignment {
            order_id,
            address_id,
            previous_status,
            status,
        })
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Bind an address to an order on an existing transaction.
///
/// The caller must already hold the order row lock and a share lock on the
/// address.
async fn set_address(
    conn: &mut PgConnection,
    id: OrderId,
    address_id: AddressId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE orders
        SET address_id = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(address_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Attach items and addresses to order rows, preserving row order.
async fn hydrate(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<Order>, RepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
               p.name AS product_name, p.status AS product_status
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.order_id, oi.id
        ",
    )
    .bind(&order_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut items_by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        items_by_order.entry(row.order_id).or_default().push(row.into());
    }

    let mut address_ids: Vec<i32> = rows.iter().filter_map(|r| r.address_id).collect();
    address_ids.sort_unstable();
    address_ids.dedup();
    let addresses: HashMap<i32, Address> = fetch_addresses(conn, &address_ids)
        .await?
        .into_iter()
        .map(|a| (a.id.as_i32(), a))
        .collect();

    rows.into_iter()
        .map(|row| {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            let address = row.address_id.and_then(|id| addresses.get(&id).cloned());
            row.into_order(items, address)
        })
        .collect()
}
