use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Establishes a connection pool to the SQLite database named in `[database]`.
///
/// File databases are created on first use. Connections are never recycled,
/// because an in-memory database (`sqlite::memory:`) only lives as long as
/// the connection that opened it.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .map_err(|e| {
            DbError::ConnectionConfigError(format!("invalid database url '{}': {e}", settings.url))
        })?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    tracing::debug!(
        url = %settings.url,
        max_connections = settings.max_connections,
        "Database pool established"
    );
    Ok(pool)
}

/// Applies the embedded migrations so the schema is up to date before the
/// first cycle touches it.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
