use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to create table {table}: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A booking pointed at a customer or service that does not exist.
    #[error("referential integrity violated: {0}")]
    ReferentialIntegrity(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::ReferentialIntegrity(db.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// SQLite reports an existing table as a generic error, so the message is all there is to go on.
pub(crate) fn is_already_exists(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.message().contains("already exists"),
        _ => false,
    }
}
