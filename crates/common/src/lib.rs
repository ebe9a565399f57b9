//! Core of the localdrop file cache.
//!
//! A [`FileCache`] serves files from an in-memory [`CacheState`] while a
//! background worker mirrors every installed generation into a
//! [`DurableStore`]. On activation the cache is rebuilt from that store, so
//! content survives a restart of the serving process.
//!
//! The crate is transport agnostic: the daemon wires [`FileCache::intercept`]
//! and [`FileCache::handle`] to HTTP, tests drive them directly.

pub mod cache;
pub mod content;
pub mod control;
pub mod intercept;
pub mod jobs;
pub mod mime;
pub mod provider;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStats, FileCache};
pub use content::{CacheState, ContentEntry, FileRecord, DEFAULT_MIME_TYPE};
pub use control::{normalize_files, ControlCommand};
pub use intercept::{logical_path, ViewResponse, VIEW_MARKER};
pub use jobs::{Job, JobDispatcher, JobReceiver, PersistCounters, PersistTelemetry};
pub use mime::content_type_for;
pub use provider::DurableStore;
pub use sync::{persist_all, rehydrate, PersistReport};

pub mod prelude {
    pub use crate::cache::FileCache;
    pub use crate::content::{CacheState, ContentEntry, FileRecord};
    pub use crate::control::ControlCommand;
    pub use crate::intercept::ViewResponse;
    pub use crate::provider::DurableStore;
}
