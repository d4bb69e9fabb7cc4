//! Per-path event debouncing
//!
//! Each raw event resets the path's expiry timer and overwrites its kind,
//! so a create+modify+modify burst collapses into one "modified"
//! notification once the quiet period elapses. An explicit timer map
//! drained by a polling task avoids callback re-entrancy.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use codescope_core::model::ChangeKind;
use dashmap::DashMap;
use tokio::sync::mpsc;

struct Pending {
    kind: ChangeKind,
    last_event: Instant,
}

/// Coalesces bursts of raw events per path.
pub struct Debouncer {
    pending: DashMap<PathBuf, Pending>,
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            window,
        }
    }

    /// Record a raw event. The last event's kind within the window wins.
    pub fn observe(&self, path: &Path, kind: ChangeKind) {
        self.pending.insert(
            path.to_path_buf(),
            Pending {
                kind,
                last_event: Instant::now(),
            },
        );
    }

    /// Remove and return every path whose quiet period has elapsed.
    pub fn drain_ready(&self) -> Vec<(PathBuf, ChangeKind)> {
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|entry| entry.last_event.elapsed() >= self.window)
            .map(|entry| entry.key().clone())
            .collect();

        ready
            .into_iter()
            .filter_map(|path| {
                self.pending
                    .remove(&path)
                    .map(|(path, pending)| (path, pending.kind))
            })
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&self) {
        self.pending.clear();
    }
}

/// Poll the debouncer and forward coalesced changes onto a channel.
/// Returns the task handle for cancellation.
pub fn spawn_drain(
    debouncer: Arc<Debouncer>,
    tx: mpsc::UnboundedSender<(PathBuf, ChangeKind)>,
    poll_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            for change in debouncer.drain_ready() {
                if tx.send(change).is_err() {
                    // Receiver gone, watching has stopped.
                    return;
                }
            }
        }
    })
}
