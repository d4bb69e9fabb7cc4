//! Bounded change history

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use codescope_core::model::ChangeRecord;

/// Fixed-capacity ring buffer of recent changes. Insertion past capacity
/// evicts the oldest record first. Records are read-only once stored.
pub struct ChangeLog {
    records: Mutex<VecDeque<ChangeRecord>>,
    capacity: usize,
}

impl ChangeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, record: ChangeRecord) {
        let mut records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Records observed within the given look-back window, oldest first.
    pub fn recent(&self, since: Duration) -> Vec<ChangeRecord> {
        let cutoff = Utc::now() - since;
        let records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        match self.records.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
