//! The in-memory file cache and its write-behind wiring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tracing::{info, warn};

use crate::content::{CacheState, ContentEntry};
use crate::jobs::{run_worker, JobDispatcher, PersistCounters, PersistTelemetry};
use crate::provider::DurableStore;
use crate::sync::rehydrate;

/// Snapshot of cache and persistence activity.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub replacements: u64,
    pub clears: u64,
    pub pending_jobs: usize,
    pub persistence: PersistCounters,
}

/// Owns the active cache generation.
///
/// The active [`CacheState`] is published through an [`ArcSwap`]: readers
/// load whichever generation is current and keep it for the duration of
/// their lookup, writers build a complete new generation and swap the
/// pointer. A reader therefore sees either the old mapping in full or the
/// new one in full. Durable store I/O is handed to the job queue and never
/// awaited here.
#[derive(Clone)]
pub struct FileCache {
    state: Arc<ArcSwap<CacheState>>,
    jobs: JobDispatcher,
    telemetry: Arc<PersistTelemetry>,
    replacements: Arc<AtomicU64>,
    clears: Arc<AtomicU64>,
}

impl FileCache {
    /// Rehydrate from `store`, then start the persistence worker for it.
    ///
    /// The cache does not exist until rehydration has resolved, so no
    /// replace or clear can be applied to it before recovery is complete.
    /// Must be called from within a tokio runtime.
    pub async fn activate<S: DurableStore>(store: S) -> Self {
        let state = rehydrate(&store).await;

        let (jobs, receiver) = JobDispatcher::new();
        let telemetry = Arc::new(PersistTelemetry::default());
        tokio::spawn(run_worker(store, receiver, telemetry.clone()));

        info!(files = state.len(), "file cache activated");
        Self::from_parts(state, jobs, telemetry)
    }

    /// Assemble a cache around an existing dispatcher; the caller owns the worker.
    pub fn from_parts(
        state: CacheState,
        jobs: JobDispatcher,
        telemetry: Arc<PersistTelemetry>,
    ) -> Self {
        Self {
            state: Arc::new(ArcSwap::from_pointee(state)),
            jobs,
            telemetry,
            replacements: Arc::new(AtomicU64::new(0)),
            clears: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish `state` as the active generation and queue its persistence.
    ///
    /// The swap is effective for the very next lookup.
    pub fn replace(&self, state: CacheState) {
        let state = Arc::new(state);
        self.state.store(state.clone());
        self.replacements.fetch_add(1, Ordering::Relaxed);
        info!(
            files = state.len(),
            "installed new cache generation, serving from memory"
        );

        if let Err(e) = self.jobs.dispatch_persist(state) {
            warn!(error = %e, "could not queue persistence for new generation");
        }
    }

    /// Drop every cached file and queue clearing the durable store.
    pub fn clear(&self) {
        self.state.store(Arc::new(CacheState::new()));
        self.clears.fetch_add(1, Ordering::Relaxed);
        info!("cleared in-memory cache");

        if let Err(e) = self.jobs.dispatch_clear() {
            warn!(error = %e, "could not queue durable store clear");
        }
    }

    pub fn get(&self, path: &str) -> Option<ContentEntry> {
        self.state.load().get(path).cloned()
    }

    /// The generation active right now.
    pub fn snapshot(&self) -> Arc<CacheState> {
        self.state.load_full()
    }

    pub fn len(&self) -> usize {
        self.state.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.load().is_empty()
    }

    /// Wait for every queued durable store job to finish.
    pub async fn flush(&self) -> anyhow::Result<()> {
        self.jobs.flush().await
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.load();
        CacheStats {
            entries: state.len(),
            total_bytes: state.total_bytes(),
            replacements: self.replacements.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            pending_jobs: self.jobs.pending(),
            persistence: self.telemetry.snapshot(),
        }
    }
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("entries", &self.len())
            .field("pending_jobs", &self.jobs.pending())
            .finish()
    }
}
