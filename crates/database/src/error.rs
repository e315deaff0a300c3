use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database configuration: {0}")]
    ConnectionConfigError(String),

    #[error("Database operation failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Stored row could not be decoded: {0}")]
    CorruptRow(String),
}

impl From<core_types::CoreError> for DbError {
    fn from(err: core_types::CoreError) -> Self {
        DbError::CorruptRow(err.to_string())
    }
}
