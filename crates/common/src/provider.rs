use std::fmt::Debug;

use async_trait::async_trait;

use crate::content::FileRecord;

/// Durable key-value store holding one record per logical path.
///
/// Every operation is its own atomic transaction. Implementations must not
/// keep a transaction open across calls, so a failed call cannot wedge the
/// next one.
#[async_trait]
pub trait DurableStore: Send + Sync + Debug + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read every persisted record.
    async fn get_all(&self) -> Result<Vec<FileRecord>, Self::Error>;

    /// Write a single record, overwriting any record with the same path.
    async fn put(&self, record: FileRecord) -> Result<(), Self::Error>;

    /// Remove every record.
    async fn clear(&self) -> Result<(), Self::Error>;
}
