//! In-memory [`DurableStore`] with failure injection, for unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::content::FileRecord;
use crate::provider::DurableStore;

#[derive(Debug, thiserror::Error)]
#[error("memory store failure: {0}")]
pub(crate) struct MemoryStoreError(String);

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<String, FileRecord>,
    failing_paths: HashSet<String>,
    fail_clear: bool,
    fail_get_all: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = FileRecord>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            for record in records {
                inner.records.insert(record.path.clone(), record);
            }
        }
        store
    }

    /// Make every `put` for `path` fail.
    pub fn fail_put(&self, path: &str) {
        self.inner.lock().failing_paths.insert(path.to_string());
    }

    pub fn fail_clear(&self, fail: bool) {
        self.inner.lock().fail_clear = fail;
    }

    pub fn fail_get_all(&self, fail: bool) {
        self.inner.lock().fail_get_all = fail;
    }

    pub fn paths(&self) -> Vec<String> {
        self.inner.lock().records.keys().cloned().collect()
    }

    pub fn record(&self, path: &str) -> Option<FileRecord> {
        self.inner.lock().records.get(path).cloned()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn get_all(&self) -> Result<Vec<FileRecord>, Self::Error> {
        let inner = self.inner.lock();
        if inner.fail_get_all {
            return Err(MemoryStoreError("get_all".to_string()));
        }
        Ok(inner.records.values().cloned().collect())
    }

    async fn put(&self, record: FileRecord) -> Result<(), Self::Error> {
        let mut inner = self.inner.lock();
        if inner.failing_paths.contains(&record.path) {
            return Err(MemoryStoreError(format!("put {}", record.path)));
        }
        inner.records.insert(record.path.clone(), record);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        let mut inner = self.inner.lock();
        if inner.fail_clear {
            return Err(MemoryStoreError("clear".to_string()));
        }
        inner.records.clear();
        Ok(())
    }
}

/// Store whose writes never complete. Reads succeed with nothing.
#[derive(Debug, Clone, Default)]
pub(crate) struct StalledStore {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl StalledStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve once a write has started waiting.
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    async fn stall(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[async_trait]
impl DurableStore for StalledStore {
    type Error = MemoryStoreError;

    async fn get_all(&self) -> Result<Vec<FileRecord>, Self::Error> {
        Ok(Vec::new())
    }

    async fn put(&self, _record: FileRecord) -> Result<(), Self::Error> {
        self.stall().await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        self.stall().await;
        Ok(())
    }
}
