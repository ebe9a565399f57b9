use thiserror::Error;

/// Errors raised by the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not connect, prepare the schema, or begin a transaction
    #[error("failed to open durable store: {0}")]
    Open(#[source] sqlx::Error),

    /// A write statement or its commit failed
    #[error("failed to write to durable store: {0}")]
    Write(#[source] sqlx::Error),

    #[error("failed to read durable store: {0}")]
    Read(#[source] sqlx::Error),

    #[error("failed to create store directory: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
