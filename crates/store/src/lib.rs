//! SQLite durable store for the localdrop file cache.
//!
//! Holds one record per logical path in a single `files` table. The store
//! keeps no connection open between operations: every call opens its own
//! connection, runs one transaction and closes it again.
//!
//! # Example
//!
//! ```rust,no_run
//! use common::FileRecord;
//! use store::Database;
//!
//! # async fn example() -> Result<(), store::StoreError> {
//! let db = Database::new("/tmp/localdrop/drop.sqlite").await?;
//!
//! db.put(FileRecord {
//!     path: "index.html".to_string(),
//!     bytes: "<h1>hello</h1>".into(),
//!     mime_type: "text/html".to_string(),
//! })
//! .await?;
//!
//! let records = db.get_all().await?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

mod database;
mod error;

pub use database::Database;
pub use error::{Result, StoreError};
