//! Database migration commands.
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time. They never run on server start; apply them with `od-cli migrate`.

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::migrate::{Migrate, MigrateError, Migrator};
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("../api/migrations");

/// Apply every pending migration.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or a previously applied
/// migration has been modified.
pub async fn run(pool: &PgPool) -> Result<(), MigrateError> {
    info!(available = MIGRATOR.iter().count(), "Running migrations...");
    MIGRATOR.run(pool).await?;
    info!("Migrations complete!");
    Ok(())
}

/// Log each embedded migration with whether it has been applied.
///
/// # Errors
///
/// Returns `MigrateError` if the migrations table cannot be read.
pub async fn status(pool: &PgPool) -> Result<(), MigrateError> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;

    let applied: HashSet<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|m| m.version)
        .collect();

    let mut pending = 0_usize;
    for migration in MIGRATOR.iter() {
        let is_applied = applied.contains(&migration.version);
        if !is_applied {
            pending += 1;
        }
        info!(
            version = migration.version,
            description = %migration.description,
            applied = is_applied,
            "Migration"
        );
    }

    info!(pending, "Migration status");
    Ok(())
}
