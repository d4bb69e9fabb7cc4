//! Codescope Watcher — debounced filesystem change tracking
//!
//! Watches directory trees, coalesces bursts of raw events into single
//! logical changes, retains a bounded history, and drives the symbol
//! index's incremental update path.

mod debouncer;
mod history;
mod tracker;
mod watcher;

pub use debouncer::{Debouncer, spawn_drain};
pub use history::ChangeLog;
pub use tracker::ChangeTracker;
pub use watcher::{EventFilter, FileWatcher, RawEvent};
