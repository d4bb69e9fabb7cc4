//! Change tracking service
//!
//! Owns the watcher, the debouncer, and the bounded history, and drives
//! the symbol index's incremental update path from a bounded worker pool.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use codescope_core::config::Config;
use codescope_core::error::Result;
use codescope_core::model::{ChangeKind, ChangeRecord};
use codescope_index::SymbolIndex;
use dashmap::DashMap;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::debouncer::{Debouncer, spawn_drain};
use crate::history::ChangeLog;
use crate::watcher::{EventFilter, FileWatcher};

struct Running {
    event_loop: JoinHandle<()>,
    drain: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

/// Watches directory trees and keeps the symbol index current.
///
/// State machine per tracker: Stopped → Watching → Stopped, nothing in
/// between. The watcher tasks are isolated from the query path: a task
/// failure is contained and logged, and readers of the index never depend
/// on watcher liveness.
pub struct ChangeTracker {
    index: Arc<SymbolIndex>,
    config: Arc<Config>,
    history: Arc<ChangeLog>,
    running: Mutex<Option<Running>>,
}

impl ChangeTracker {
    pub fn new(index: Arc<SymbolIndex>, config: Arc<Config>) -> Self {
        let history = Arc::new(ChangeLog::new(config.watching.history_capacity));
        Self {
            index,
            config,
            history,
            running: Mutex::new(None),
        }
    }

    /// Begin watching. A second call while watching is a no-op.
    ///
    /// Must run inside a tokio runtime: one task drives the event loop,
    /// one drains the debouncer, and one dispatches re-index work to a
    /// bounded worker pool.
    pub fn start(&self, roots: &[PathBuf]) -> Result<()> {
        let mut running = self.lock_running();
        if running.is_some() {
            warn!("change tracker already watching");
            return Ok(());
        }

        let filter = EventFilter::from_config(&self.config.indexing)?;
        let mut watcher = FileWatcher::new(roots, filter)?;

        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(
            self.config.watching.debounce_ms,
        )));
        let (ready_tx, ready_rx) = mpsc::unbounded_channel();

        let event_loop = {
            let debouncer = Arc::clone(&debouncer);
            tokio::spawn(async move {
                while let Some(event) = watcher.recv().await {
                    debouncer.observe(&event.path, event.kind);
                }
                info!("watch event stream ended");
            })
        };

        let drain = spawn_drain(
            Arc::clone(&debouncer),
            ready_tx,
            Duration::from_millis(self.config.watching.poll_interval_ms),
        );

        let dispatcher = spawn_dispatcher(
            ready_rx,
            Arc::clone(&self.index),
            Arc::clone(&self.history),
            self.config.watching.worker_count,
        );

        *running = Some(Running {
            event_loop,
            drain,
            dispatcher,
        });
        info!("change tracker watching {} root(s)", roots.len());
        Ok(())
    }

    /// Stop watching and tear down the tasks. History is retained.
    pub fn stop(&self) {
        let mut running = self.lock_running();
        if let Some(tasks) = running.take() {
            tasks.event_loop.abort();
            tasks.drain.abort();
            tasks.dispatcher.abort();
            info!("change tracker stopped");
        }
    }

    pub fn is_watching(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Changes recorded within the look-back window, oldest first.
    pub fn recent_changes(&self, since: chrono::Duration) -> Vec<ChangeRecord> {
        self.history.recent(since)
    }

    pub fn history(&self) -> &ChangeLog {
        &self.history
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        match self.running.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for ChangeTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Consume coalesced changes: append the history record, then hand the
/// index update to a worker. The two actions are deliberately not
/// transactional; a failed re-index still leaves the record for
/// observability.
fn spawn_dispatcher(
    mut ready_rx: mpsc::UnboundedReceiver<(PathBuf, ChangeKind)>,
    index: Arc<SymbolIndex>,
    history: Arc<ChangeLog>,
    worker_count: usize,
) -> JoinHandle<()> {
    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let path_locks: Arc<DashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>> = Arc::new(DashMap::new());

    tokio::spawn(async move {
        while let Some((path, kind)) = ready_rx.recv().await {
            history.record(ChangeRecord {
                path: path.clone(),
                kind,
                timestamp: Utc::now(),
            });

            let index = Arc::clone(&index);
            let semaphore = Arc::clone(&semaphore);
            let path_lock = Arc::clone(
                &path_locks
                    .entry(path.clone())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            );

            tokio::spawn(async move {
                // Same-path changes serialize in arrival order; distinct
                // paths only contend for the pool.
                let _ordered = path_lock.lock().await;
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                apply_change(&index, &path, kind);
            });
        }
        debug!("dispatcher channel closed");
    })
}

fn apply_change(index: &SymbolIndex, path: &Path, kind: ChangeKind) {
    match kind {
        ChangeKind::Deleted => {
            if index.remove_file(path) {
                debug!("dropped deleted file {}", path.display());
            }
        }
        ChangeKind::Created | ChangeKind::Modified => {
            if let Err(e) = index.index_file(path) {
                // Left stale in the index; the history record above still
                // exists for observability.
                warn!("re-index of {} failed: {}", path.display(), e);
            }
        }
    }
}
