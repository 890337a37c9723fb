//! Address repository for database operations.
//!
//! Owns the single-default-address invariant: clearing the other defaults and
//! writing the new default happen in one transaction, after the owning user's
//! row has been locked so that two concurrent default changes for the same
//! user are applied one after the other.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use orderdesk_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, AddressFields};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    street_line1: String,
    street_line2: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            street_line1: row.street_line1,
            street_line2: row.street_line2,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List addresses ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, street_line1, street_line2, city, state,
                   postal_code, country, is_default, created_at, updated_at
            FROM addresses
            ORDER BY id
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an address by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_address(&mut *conn, id).await
    }

    /// List a user's addresses, default first, then by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, street_line1, street_line2, city, state,
                   postal_code, country, is_default, created_at, updated_at
            FROM addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create an address for a user.
    ///
    /// When `fields.is_default` is set, every other address of the user loses
    /// its default flag in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut *tx, user_id).await?;

        if fields.is_default {
            let cleared = sqlx::query(
                r"
                UPDATE addresses
                SET is_default = FALSE, updated_at = NOW()
                WHERE user_id = $1 AND is_default
                ",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            debug!(%user_id, cleared = cleared.rows_affected(), "Cleared previous default address");
        }

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO addresses (
                user_id, street_line1, street_line2, city, state,
                postal_code, country, is_default
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, street_line1, street_line2, city, state,
                      postal_code, country, is_default, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&fields.street_line1)
        .bind(&fields.street_line2)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.postal_code)
        .bind(&fields.country)
        .bind(fields.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Update an address owned by `user_id`.
    ///
    /// When `fields.is_default` is set, the user's other addresses lose their
    /// default flag in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no address matches `(id, user_id)`;
    /// nothing is changed in that case.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut *tx, user_id).await?;

        if fields.is_default {
            sqlx::query(
                r"
                UPDATE addresses
                SET is_default = FALSE, updated_at = NOW()
                WHERE user_id = $1 AND id <> $2 AND is_default
                ",
            )
            .bind(user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE addresses
            SET street_line1 = $3, street_line2 = $4, city = $5, state = $6,
                postal_code = $7, country = $8, is_default = $9, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, street_line1, street_line2, city, state,
                      postal_code, country, is_default, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&fields.street_line1)
        .bind(&fields.street_line2)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.postal_code)
        .bind(&fields.country)
        .bind(fields.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("address"))?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Delete an address owned by `user_id`.
    ///
    /// The address row is locked before the reference check; order writes
    /// that bind an address take a share lock on it, so no reference can
    /// appear between the check and the delete.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no address matches `(id, user_id)`.
    /// Returns `RepositoryError::AddressInUse` if any order references it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>(
            r"
            SELECT id FROM addresses
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound("address"))?;

        let references = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE address_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if references > 0 {
            return Err(RepositoryError::AddressInUse);
        }

        sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::AddressInUse;
                }
                RepositoryError::Database(e)
            })?;

        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Fetch one address on an existing connection or transaction.
pub(crate) async fn fetch_address(
    conn: &mut PgConnection,
    id: AddressId,
) -> Result<Option<Address>, RepositoryError> {
    let row = sqlx::query_as::<_, AddressRow>(
        r"
        SELECT id, user_id, street_line1, street_line2, city, state,
               postal_code, country, is_default, created_at, updated_at
        FROM addresses
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Into::into))
}

/// Fetch several addresses by ID in one round trip. Missing IDs are skipped.
pub(crate) async fn fetch_addresses(
    conn: &mut PgConnection,
    ids: &[i32],
) -> Result<Vec<Address>, RepositoryError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, AddressRow>(
        r"
        SELECT id, user_id, street_line1, street_line2, city, state,
               postal_code, country, is_default, created_at, updated_at
        FROM addresses
        WHERE id = ANY($1)
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Take a share lock on an address that is about to be referenced.
///
/// Blocks a concurrent delete of the same address until the caller's
/// transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the address doesn't exist.
pub(crate) async fn lock_address_for_reference(
    conn: &mut PgConnection,
    id: AddressId,
) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM addresses WHERE id = $1 FOR SHARE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound("address"))?;
    Ok(())
}

/// Lock the user row, serializing default-address changes per user.
///
/// `FOR NO KEY UPDATE` conflicts with itself but not with the `KEY SHARE`
/// lock a foreign-key check takes, so orders can still be inserted for the
/// user while the lock is held.
async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = $1 FOR NO KEY UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound("user"))?;
    Ok(())
}
