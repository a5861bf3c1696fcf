//! Read-only access to call counts.
//!
//! Queries take the counter store's read lock only long enough to copy
//! atomics, so they never hold up writers for long.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::advice::{registered_operations, CountedOperation};
use crate::operation::OperationId;
use crate::store::CounterStore;

/// Point-in-time copy of all call counts.
///
/// Serializes as a plain JSON object: `{"doWork": 2, "sayHello": 3}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountSnapshot(BTreeMap<OperationId, u64>);

impl CountSnapshot {
    /// Count for `operation`, `None` if it had not been called when the
    /// snapshot was taken.
    pub fn get(&self, operation: &str) -> Option<u64> {
        self.0.get(operation).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Plain string-keyed map, for collaborators that want their own format.
    pub fn into_map(self) -> BTreeMap<String, u64> {
        self.0
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<BTreeMap<OperationId, u64>> for CountSnapshot {
    fn from(counts: BTreeMap<OperationId, u64>) -> Self {
        Self(counts)
    }
}

/// Query handle over the counter store.
///
/// Cheap to clone; hand one to each reporting collaborator.
#[derive(Debug, Clone)]
pub struct CallStats {
    store: Arc<CounterStore>,
}

impl CallStats {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }

    /// Number of counted calls of `operation`; zero for unknown operations.
    pub fn count_of(&self, operation: &str) -> u64 {
        self.store.get(operation)
    }

    /// Snapshot of every operation counted at least once.
    pub fn all_counts(&self) -> CountSnapshot {
        CountSnapshot::from(self.store.snapshot())
    }

    /// Operations marked `#[counted]` in this binary, called or not.
    pub fn registered_operations(&self) -> Vec<&'static CountedOperation> {
        registered_operations()
    }
}
