//! Test handlers for exercising the call bus.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::bus::{CallHandler, HandlerError};
use crate::operation::CallEvent;

/// Handler that records every event it receives.
pub struct CountingHandler {
    name: String,
    calls: AtomicUsize,
    seen: Mutex<Vec<CallEvent>>,
}

impl CountingHandler {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Operation names in delivery order.
    pub fn operations(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.operation.to_string())
            .collect()
    }
}

impl CallHandler for CountingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, event: &CallEvent) -> Result<(), HandlerError> {
        self.seen.lock().unwrap().push(event.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handler that always returns an error.
pub struct FailingHandler {
    name: String,
}

impl FailingHandler {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl CallHandler for FailingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, _event: &CallEvent) -> Result<(), HandlerError> {
        Err(HandlerError::Failed("test failure".to_string()))
    }
}

/// Handler that always panics.
pub struct PanickingHandler {
    name: String,
}

impl PanickingHandler {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl CallHandler for PanickingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, event: &CallEvent) -> Result<(), HandlerError> {
        panic!("handler exploded on {}", event.operation);
    }
}
