//! Address service.
//!
//! Validates input, performs the transactional write through
//! [`AddressRepository`], and after commit publishes an [`AddressEvent`] so
//! that listeners (the order coordinator) can react.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};

use orderdesk_core::{AddressId, OrderId, UserId};

use super::ServiceError;
use super::events::{AddressEvent, AddressEventBus, AddressEventKind};
use crate::db::{AddressRepository, RepositoryError};
use crate::models::{Address, AddressFields};

/// Outcome of a committed address write.
#[derive(Debug, Clone, Serialize)]
pub struct SavedAddress {
    pub address: Address,
    /// Orders moved from `pending` to `processing` as a consequence.
    pub advanced_orders: Vec<OrderId>,
}

/// Address service.
#[derive(Debug, Clone)]
pub struct AddressService {
    pool: PgPool,
    events: AddressEventBus,
}

impl AddressService {
    /// Create a new address service publishing to `events`.
    #[must_use]
    pub const fn new(pool: PgPool, events: AddressEventBus) -> Self {
        Self { pool, events }
    }

    /// List addresses ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<Address>, ServiceError> {
        Ok(AddressRepository::new(&self.pool).list(limit).await?)
    }

    /// Get an address by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if it doesn't exist.
    pub async fn get(&self, id: AddressId) -> Result<Address, ServiceError> {
        AddressRepository::new(&self.pool)
            .get(id)
            .await?
            .ok_or(ServiceError::Repository(RepositoryError::NotFound("address")))
    }

    /// List a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unassigned user ID.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Address>, ServiceError> {
        require_user(user_id)?;
        Ok(AddressRepository::new(&self.pool).list_by_user(user_id).await?)
    }

    /// Create an address and advance the user's pending orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for missing fields.
    /// Returns `RepositoryError::NotFound` (wrapped) if the user doesn't exist.
    /// Returns `ServiceError::Cascade` if the address was saved but the
    /// order update failed.
    #[instrument(skip(self, fields))]
    pub async fn create(
        &self,
        user_id: UserId,
        fields: &AddressFields,
    ) -> Result<SavedAddress, ServiceError> {
        validate(user_id, fields)?;

        let address = AddressRepository::new(&self.pool).create(user_id, fields).await?;
        info!(address_id = %address.id, %user_id, is_default = address.is_default, "Created address");

        self.publish(AddressEventKind::Created, address).await
    }

    /// Update an address owned by `user_id` and advance the user's pending orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for missing fields or an unassigned ID.
    /// Returns `RepositoryError::NotFound` (wrapped) if no address matches.
    /// Returns `ServiceError::Cascade` if the address was saved but the
    /// order update failed.
    #[instrument(skip(self, fields))]
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        fields: &AddressFields,
    ) -> Result<SavedAddress, ServiceError> {
        if !id.is_assigned() {
            return Err(ServiceError::validation("id is required"));
        }
        validate(user_id, fields)?;

        let address = AddressRepository::new(&self.pool)
            .update(id, user_id, fields)
            .await?;
        info!(address_id = %address.id, %user_id, is_default = address.is_default, "Updated address");

        self.publish(AddressEventKind::Updated, address).await
    }

    /// Delete an address owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::AddressInUse` (wrapped) if an order references it.
    /// Returns `RepositoryError::NotFound` (wrapped) if no address matches.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<(), ServiceError> {
        if !id.is_assigned() {
            return Err(ServiceError::validation("id is required"));
        }
        require_user(user_id)?;

        AddressRepository::new(&self.pool).delete(id, user_id).await?;
        info!(address_id = %id, %user_id, "Deleted address");

        Ok(())
    }

    async fn publish(
        &self,
        kind: AddressEventKind,
        address: Address,
    ) -> Result<SavedAddress, ServiceError> {
        let event = AddressEvent {
            kind,
            address_id: address.id,
            user_id: address.user_id,
        };
        let advanced_orders = self.events.publish(&event).await?;

        Ok(SavedAddress {
            address,
            advanced_orders,
        })
    }
}

fn require_user(user_id: UserId) -> Result<(), ServiceError> {
    if user_id.is_assigned() {
        Ok(())
    } else {
        Err(ServiceError::validation("user_id is required"))
    }
}

fn validate(user_id: UserId, fields: &AddressFields) -> Result<(), ServiceError> {
    require_user(user_id)?;
    match fields.first_missing() {
        Some(field) => Err(ServiceError::validation(format!("{field} is required"))),
        None => Ok(()),
    }
}
