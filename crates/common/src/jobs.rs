//! Background job dispatcher for durable store I/O
//!
//! Cache mutations happen synchronously in memory; everything that touches
//! the durable store is queued here and executed by a single worker task, so
//! slow storage never holds up request serving or command handling.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::content::CacheState;
use crate::provider::DurableStore;
use crate::sync::{persist_all, PersistReport};

/// Jobs executed by the persistence worker, in submission order.
#[derive(Debug)]
pub enum Job {
    /// Mirror a freshly installed generation into the store
    Persist(Arc<CacheState>),
    /// Remove every persisted record
    Clear,
    /// Resolve the sender once every job queued before this one has run
    Flush(oneshot::Sender<()>),
}

/// Job dispatcher that can be cloned and shared across tasks
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    tx: flume::Sender<Job>,
}

impl JobDispatcher {
    /// Create a new job dispatcher and receiver pair
    ///
    /// The dispatcher can be cloned and shared, while the receiver should be
    /// given to the worker task.
    pub fn new() -> (Self, JobReceiver) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, JobReceiver { rx })
    }

    /// Dispatch a job to the background worker
    ///
    /// This is non-blocking and will succeed unless the receiver has been dropped.
    pub fn dispatch(&self, job: Job) -> Result<()> {
        self.tx
            .send(job)
            .map_err(|_| anyhow::anyhow!("job receiver has been dropped"))
    }

    pub fn dispatch_persist(&self, state: Arc<CacheState>) -> Result<()> {
        self.dispatch(Job::Persist(state))
    }

    pub fn dispatch_clear(&self) -> Result<()> {
        self.dispatch(Job::Clear)
    }

    /// Wait until every job dispatched so far has been processed.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.dispatch(Job::Flush(tx))?;
        rx.await
            .map_err(|_| anyhow::anyhow!("worker stopped before flushing"))
    }

    /// Number of jobs waiting for the worker.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Job receiver for the background worker
#[derive(Debug)]
pub struct JobReceiver {
    rx: flume::Receiver<Job>,
}

impl JobReceiver {
    /// Wait for the next job; `None` once every dispatcher has been dropped.
    pub async fn recv(&self) -> Option<Job> {
        self.rx.recv_async().await.ok()
    }

    /// Take every job queued right now without waiting.
    pub fn drain(&self) -> impl Iterator<Item = Job> + '_ {
        self.rx.drain()
    }

    #[cfg(test)]
    fn try_recv(&self) -> Option<Job> {
        self.rx.try_recv().ok()
    }
}

/// Running totals of persistence outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistCounters {
    pub runs: u64,
    pub failed_runs: u64,
    pub records_persisted: u64,
    pub records_failed: u64,
    pub clears: u64,
    pub failed_clears: u64,
    /// Persist jobs skipped because a newer persist or clear was queued
    pub superseded: u64,
    pub last_run: Option<PersistReport>,
}

/// Shared view of persistence outcomes. Updated by the worker, read by stats.
#[derive(Debug, Default)]
pub struct PersistTelemetry {
    counters: Mutex<PersistCounters>,
}

impl PersistTelemetry {
    pub fn snapshot(&self) -> PersistCounters {
        self.counters.lock().clone()
    }

    fn record_run(&self, report: &PersistReport) {
        let mut c = self.counters.lock();
        c.runs += 1;
        if !report.is_success() {
            c.failed_runs += 1;
        }
        c.records_persisted += report.persisted as u64;
        c.records_failed += report.failed as u64;
        if !report.cleared {
            c.failed_clears += 1;
        }
        c.last_run = Some(report.clone());
    }

    fn record_superseded(&self) {
        self.counters.lock().superseded += 1;
    }

    fn record_clear(&self, ok: bool) {
        let mut c = self.counters.lock();
        c.clears += 1;
        if !ok {
            c.failed_clears += 1;
        }
    }
}

/// Whether a persist at the head of the queue would be overwritten anyway.
///
/// A later persist or clear replaces the whole durable mirror, so the earlier
/// generation never needs writing. A flush in between keeps the persist, as
/// its waiter expects the store to reflect everything queued before it.
fn is_superseded(backlog: &VecDeque<Job>) -> bool {
    for job in backlog {
        match job {
            Job::Flush(_) => return false,
            Job::Persist(_) | Job::Clear => return true,
        }
    }
    false
}

/// Process jobs until every dispatcher has been dropped.
///
/// Jobs run in submission order. Queued generations that a newer persist or
/// clear makes obsolete are dropped without touching the store, which keeps
/// at most one stale generation alive while the store is slow.
pub async fn run_worker<S: DurableStore>(
    store: S,
    jobs: JobReceiver,
    telemetry: Arc<PersistTelemetry>,
) {
    let mut backlog = VecDeque::new();

    loop {
        if backlog.is_empty() {
            match jobs.recv().await {
                Some(job) => backlog.push_back(job),
                None => break,
            }
        }
        backlog.extend(jobs.drain());

        let Some(job) = backlog.pop_front() else {
            continue;
        };

        match job {
            Job::Persist(state) => {
                if is_superseded(&backlog) {
                    debug!(files = state.len(), "skipping superseded generation");
                    telemetry.record_superseded();
                    continue;
                }
                let report = persist_all(&store, &state).await;
                telemetry.record_run(&report);
            }
            Job::Clear => {
                info!("clearing persisted files from durable store");
                match store.clear().await {
                    Ok(()) => {
                        info!("cleared all persisted files");
                        telemetry.record_clear(true);
                    }
                    Err(e) => {
                        error!(error = %e, "failed to clear persisted files");
                        telemetry.record_clear(false);
                    }
                }
            }
            Job::Flush(done) => {
                // the waiter may have given up, nothing to do then
                let _ = done.send(());
            }
        }
    }

    debug!("all job dispatchers dropped, persistence worker exiting");
}
