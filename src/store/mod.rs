//! Concurrent per-operation call counters.
//!
//! Existing counters are bumped under a shared read lock with an atomic
//! add, so increments for unrelated (and related) operations never
//! serialize on each other. The write lock is only taken the first time an
//! operation is seen.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::operation::OperationId;

/// Mapping of operation identifier to the number of observed calls.
///
/// Entries are created lazily on first increment and never removed; counts
/// only ever grow.
#[derive(Debug, Default)]
pub struct CounterStore {
    counters: RwLock<HashMap<OperationId, AtomicU64>>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-increment the counter for `operation`, returning the new value.
    pub fn increment_and_get(&self, operation: &OperationId) -> u64 {
        {
            let counters = self.read();
            if let Some(counter) = counters.get(operation.as_str()) {
                return counter.fetch_add(1, Ordering::Relaxed) + 1;
            }
        }

        // Another writer may have inserted between dropping the read lock and
        // taking the write lock; entry() covers both cases.
        let mut counters = self.write();
        counters
            .entry(operation.clone())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed)
            + 1
    }

    /// Current count for `operation`, zero if it was never counted.
    pub fn get(&self, operation: &str) -> u64 {
        self.read()
            .get(operation)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Point-in-time copy of every counter.
    ///
    /// Each value is read atomically. Increments racing with the copy may or
    /// may not be included.
    pub fn snapshot(&self) -> BTreeMap<OperationId, u64> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// Number of distinct operations counted so far.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave a counter half-written
    // (all mutation is atomic), so poisoning is safe to ignore.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<OperationId, AtomicU64>> {
        self.counters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OperationId, AtomicU64>> {
        self.counters.write().unwrap_or_else(PoisonError::into_inner)
    }
}
