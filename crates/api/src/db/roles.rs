//! Role repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use orderdesk_core::RoleId;

use super::RepositoryError;
use crate::models::role::Role;

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: i32,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::new(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// Repository for role database operations.
pub struct RoleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoleRepository<'a> {
    /// Create a new role repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List roles ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<Role>, RepositoryError> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, created_at FROM roles ORDER BY id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a role by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RoleId) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, created_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a role, or return the existing one with the same name.
    ///
    /// Used by seeding, which must be safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure(&self, name: &str, description: Option<&str>) -> Result<Role, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(
            r"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, description, created_at
            ",
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Create a new role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Role, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(
            r"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            ",
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "role name"))?;

        Ok(row.into())
    }

    /// Rename a role and replace its description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the role doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: RoleId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>(
            r"
            UPDATE roles
            SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, name, description, created_at
            ",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "role name"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound("role"))
    }

    /// Delete a role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the role doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: RoleId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("role"));
        }
        Ok(())
    }
}
