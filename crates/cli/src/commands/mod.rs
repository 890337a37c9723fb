//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the database named by `ORDERDESK_DATABASE_URL` or `DATABASE_URL`.
///
/// # Errors
///
/// Returns `CommandError` if neither variable is set or the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ORDERDESK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("ORDERDESK_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(orderdesk_api::db::create_pool(&database_url).await?)
}
