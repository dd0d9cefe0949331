//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use stockpile_server::db::RepositoryError;
use stockpile_server::services::InventoryError;
use stockpile_server::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record store error.
    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Product or company operation failed.
    #[error("{0}")]
    Inventory(#[from] InventoryError),

    /// User operation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Connect using `STOCKPILE_DATABASE_URL`, falling back to `DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOCKPILE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOCKPILE_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(stockpile_server::db::create_pool(&database_url).await?)
}
