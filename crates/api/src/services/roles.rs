//! Role service.

use sqlx::PgPool;
use tracing::{info, instrument};

use orderdesk_core::RoleId;

use super::ServiceError;
use crate::db::{RepositoryError, RoleRepository};
use crate::models::Role;

/// Role service.
#[derive(Debug, Clone)]
pub struct RoleService {
    pool: PgPool,
}

impl RoleService {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List roles ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<Role>, ServiceError> {
        Ok(RoleRepository::new(&self.pool).list(limit).await?)
    }

    /// Get one role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` (wrapped) if it doesn't exist.
    pub async fn get(&self, id: RoleId) -> Result<Role, ServiceError> {
        RoleRepository::new(&self.pool)
            .get(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("role").into())
    }

    /// Create a role. A blank description is stored as none.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank name.
    /// Returns `RepositoryError::Conflict` (wrapped) if the name is taken.
    #[instrument(skip(self, description))]
    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Role, ServiceError> {
        let name = require_name(name)?;

        let role = RoleRepository::new(&self.pool)
            .create(name, non_blank(description))
            .await?;
        info!(role_id = %role.id, name, "Created role");

        Ok(role)
    }

    /// Rename a role and replace its description.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unassigned ID or blank name.
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Conflict` (wrapped).
    #[instrument(skip(self, description))]
    pub async fn update(
        &self,
        id: RoleId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, ServiceError> {
        require_id(id)?;
        let name = require_name(name)?;

        let role = RoleRepository::new(&self.pool)
            .update(id, name, non_blank(description))
            .await?;
        info!(role_id = %id, name, "Updated role");

        Ok(role)
    }

    /// Delete a role.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an unassigned ID.
    /// Returns `RepositoryError::NotFound` (wrapped) if it doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: RoleId) -> Result<(), ServiceError> {
        require_id(id)?;

        RoleRepository::new(&self.pool).delete(id).await?;
        info!(role_id = %id, "Deleted role");

        Ok(())
    }
}

fn require_id(id: RoleId) -> Result<(), ServiceError> {
    if id.is_assigned() {
        Ok(())
    } else {
        Err(ServiceError::validation("id is required"))
    }
}

fn require_name(name: &str) -> Result<&str, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    Ok(name)
}

fn non_blank(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed_and_required() {
        assert_eq!(require_name(" Editor ").ok(), Some("Editor"));
        let err = require_name("");
        assert!(matches!(err, Err(ServiceError::Validation(ref m)) if m == "name is required"));
    }

    #[test]
    fn test_blank_description_becomes_none() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" Read-only ")), Some("Read-only"));
    }
}
