//! User service.
//!
//! Identity only: a user is an id and an email. Credentials are not handled
//! here.

use sqlx::PgPool;
use tracing::{info, instrument};

use orderdesk_core::UserId;

use super::ServiceError;
use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// User service.
#[derive(Debug, Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List users ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<User>, ServiceError> {
        Ok(UserRepository::new(&self.pool).list(limit).await?)
    }

    /// Get one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if it doesn't exist.
    pub async fn get(&self, id: UserId) -> Result<User, ServiceError> {
        UserRepository::new(&self.pool)
            .get_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("user").into())
    }

    /// Create a user from an email address.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank email.
    /// Returns `RepositoryError::Conflict` (wrapped) if the email is taken.
    #[instrument(skip(self, email))]
    pub async fn create(&self, email: &str) -> Result<User, ServiceError> {
        let email = normalize_email(email)?;

        let user = UserRepository::new(&self.pool).create(email).await?;
        info!(user_id = %user.id, "Created user");

        Ok(user)
    }

    /// Change a user's email.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unassigned ID or blank email.
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Conflict` (wrapped).
    #[instrument(skip(self, email))]
    pub async fn update(&self, id: UserId, email: &str) -> Result<User, ServiceError> {
        require_id(id)?;
        let email = normalize_email(email)?;

        let user = UserRepository::new(&self.pool).update_email(id, email).await?;
        info!(user_id = %id, "Updated user");

        Ok(user)
    }

    /// Delete a user that owns no addresses or orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unassigned ID.
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Conflict` (wrapped).
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<(), ServiceError> {
        require_id(id)?;

        UserRepository::new(&self.pool).delete(id).await?;
        info!(user_id = %id, "Deleted user");

        Ok(())
    }
}

fn require_id(id: UserId) -> Result<(), ServiceError> {
    if id.is_assigned() {
        Ok(())
    } else {
        Err(ServiceError::validation("id is required"))
    }
}

fn normalize_email(email: &str) -> Result<&str, ServiceError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ServiceError::validation("email is required"));
    }
    Ok(email)
}
