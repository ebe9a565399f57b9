//! Mirroring cache generations into the durable store, and reading them back.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::content::{CacheState, FileRecord};
use crate::provider::DurableStore;

/// How often a running persist logs its progress, in records.
const PROGRESS_INTERVAL: usize = 10;

/// Outcome of one [`persist_all`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    /// Entries in the generation being persisted
    pub total: usize,
    /// Entries written successfully
    pub persisted: usize,
    /// Entries whose write failed
    pub failed: usize,
    /// Whether the store was cleared before writing
    pub cleared: bool,
}

impl PersistReport {
    /// True iff every entry of the generation was written.
    pub fn is_success(&self) -> bool {
        self.persisted == self.total
    }
}

/// Replace the store's contents with `state`.
///
/// The store is cleared first. A failed clear is logged and tolerated: any
/// stale record sharing a path with the new generation is overwritten by the
/// put that follows. Each put failure is logged and counted and the loop
/// keeps going, so as much of the generation as possible lands on disk.
pub async fn persist_all<S: DurableStore>(store: &S, state: &CacheState) -> PersistReport {
    let total = state.len();
    info!(total, "persisting cache generation to durable store");

    let cleared = match store.clear().await {
        Ok(()) => {
            debug!("cleared previous durable generation");
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to clear durable store, writing over existing records");
            false
        }
    };

    let mut report = PersistReport {
        total,
        cleared,
        ..Default::default()
    };

    for (path, entry) in state {
        match store.put(FileRecord::from_entry(path, entry)).await {
            Ok(()) => {
                report.persisted += 1;
                if report.persisted % PROGRESS_INTERVAL == 0 {
                    debug!(persisted = report.persisted, total, "persist progress");
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!(path = %path, error = %e, "failed to persist file");
            }
        }
    }

    if report.is_success() {
        info!(persisted = report.persisted, total, "all files persisted");
    } else {
        warn!(
            persisted = report.persisted,
            failed = report.failed,
            total,
            "some files failed to persist"
        );
    }

    report
}

/// Rebuild a cache generation from the store.
///
/// A failed or empty read is not an error: it just means there is nothing
/// to recover, and the cache starts empty.
pub async fn rehydrate<S: DurableStore>(store: &S) -> CacheState {
    match store.get_all().await {
        Ok(records) if records.is_empty() => {
            info!("no persisted files found, starting with an empty cache");
            CacheState::new()
        }
        Ok(records) => {
            let state = CacheState::from_records(records);
            info!(files = state.len(), "loaded persisted files from durable store");
            state
        }
        Err(e) => {
            warn!(error = %e, "failed to load persisted files, starting with an empty cache");
            CacheState::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentEntry;
    use crate::testing::MemoryStore;

    fn state_of(files: &[(&str, &str, &str)]) -> CacheState {
        files
            .iter()
            .map(|(path, body, mime)| {
                (
                    path.to_string(),
                    ContentEntry::new(body.as_bytes().to_vec(), Some(mime.to_string())),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_persist_then_rehydrate_round_trip() {
        let store = MemoryStore::new();
        let mut state = state_of(&[("index.html", "<h1>hi</h1>", "text/html")]);
        state.insert("data/a.bin", ContentEntry::new(vec![0u8, 159, 146, 150], None));

        let report = persist_all(&store, &state).await;
        assert!(report.is_success());
        assert!(report.cleared);
        assert_eq!(report.persisted, 2);

        let restored = rehydrate(&store).await;
        assert_eq!(restored, state);
    }

    #[tokio::test]
    async fn test_persist_clears_previous_generation() {
        let store = MemoryStore::new();
        persist_all(&store, &state_of(&[("old.txt", "old", "text/plain")])).await;
        persist_all(&store, &state_of(&[("new.txt", "new", "text/plain")])).await;

        assert_eq!(store.paths(), vec!["new.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_failure_continues_and_reports_failure() {
        let store = MemoryStore::new();
        store.fail_put("b.txt");
        let state = state_of(&[
            ("a.txt", "a", "text/plain"),
            ("b.txt", "b", "text/plain"),
            ("c.txt", "c", "text/plain"),
        ]);

        let report = persist_all(&store, &state).await;
        assert!(!report.is_success());
        assert_eq!(report.total, 3);
        assert_eq!(report.persisted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(store.paths(), vec!["a.txt".to_string(), "c.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_clear_still_writes_and_overwrites_by_key() {
        let store = MemoryStore::with_records(vec![
            FileRecord {
                path: "a.txt".to_string(),
                bytes: bytes::Bytes::from_static(b"stale"),
                mime_type: "text/plain".to_string(),
            },
            FileRecord {
                path: "gone.txt".to_string(),
                bytes: bytes::Bytes::from_static(b"lingers"),
                mime_type: "text/plain".to_string(),
            },
        ]);
        store.fail_clear(true);

        let report = persist_all(&store, &state_of(&[("a.txt", "fresh", "text/plain")])).await;
        assert!(report.is_success());
        assert!(!report.cleared);
        assert_eq!(store.record("a.txt").unwrap().bytes.as_ref(), b"fresh");
        assert!(store.record("gone.txt").is_some());
    }

    #[tokio::test]
    async fn test_persist_empty_generation_is_success() {
        let store = MemoryStore::with_records(vec![FileRecord {
            path: "a.txt".to_string(),
            bytes: bytes::Bytes::from_static(b"a"),
            mime_type: "text/plain".to_string(),
        }]);

        let report = persist_all(&store, &CacheState::new()).await;
        assert!(report.is_success());
        assert!(store.paths().is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_empty_and_failing_store() {
        let store = MemoryStore::new();
        assert!(rehydrate(&store).await.is_empty());

        persist_all(&store, &state_of(&[("a.txt", "a", "text/plain")])).await;
        store.fail_get_all(true);
        assert!(rehydrate(&store).await.is_empty());
    }
}
