//! Subscriber registry and isolated fan-out.
//!
//! Shared by every bus implementation: each published event is stamped with
//! a sequence number, and each subscription remembers the sequence number
//! current at registration so late subscribers never see earlier events.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use super::{BusError, CallHandler, HandlerError, Result};
use crate::operation::CallEvent;

/// Point-in-time delivery counters for a bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events accepted by `publish`.
    pub published: u64,
    /// Events fanned out to subscribers.
    pub dispatched: u64,
    /// Events `publish` could not accept (queue full or closed).
    pub dropped: u64,
    /// Handler invocations that returned an error or panicked.
    pub handler_failures: u64,
}

struct Subscription {
    handler: Arc<dyn CallHandler>,
    since: u64,
}

/// Registered handlers for one bus.
///
/// The list is written at startup and read on every dispatch.
pub(crate) struct HandlerSet {
    subscriptions: RwLock<Vec<Subscription>>,
    next_seq: AtomicU64,
    published: AtomicU64,
    dispatched: AtomicU64,
    dropped: AtomicU64,
    handler_failures: AtomicU64,
}

impl HandlerSet {
    pub(crate) fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            published: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            handler_failures: AtomicU64::new(0),
        }
    }

    /// Add a handler; it receives events stamped from now on.
    pub(crate) fn subscribe(&self, handler: Arc<dyn CallHandler>) -> Result<usize> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if subscriptions
            .iter()
            .any(|s| s.handler.name() == handler.name())
        {
            return Err(BusError::DuplicateHandler(handler.name().to_string()));
        }

        let since = self.next_seq.load(Ordering::SeqCst);
        info!(handler = %handler.name(), since, "Call handler subscribed");
        subscriptions.push(Subscription { handler, since });
        Ok(subscriptions.len())
    }

    /// Assign the next sequence number to an event about to be published.
    pub(crate) fn stamp(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Deliver `event` to every handler subscribed before `seq` was stamped.
    ///
    /// Returns `true` if all handlers succeeded. Failures and panics are
    /// logged and counted, and never stop delivery to the remaining handlers.
    pub(crate) fn dispatch(&self, seq: u64, event: &CallEvent) -> bool {
        // Collect under the read lock, then release before calling handlers
        let handlers: Vec<Arc<dyn CallHandler>> = {
            let guard = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            guard
                .iter()
                .filter(|s| s.since <= seq)
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        let mut all_succeeded = true;
        for handler in handlers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event)))
                .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(&payload))));

            match outcome {
                Ok(()) => {}
                Err(e @ HandlerError::Panicked(_)) => {
                    error!(
                        handler = %handler.name(),
                        operation = %event.operation,
                        error = %e,
                        "Call handler panicked"
                    );
                    self.record_handler_failure(handler.name());
                    all_succeeded = false;
                }
                Err(e) => {
                    warn!(
                        handler = %handler.name(),
                        operation = %event.operation,
                        error = %e,
                        "Call handler failed"
                    );
                    self.record_handler_failure(handler.name());
                    all_succeeded = false;
                }
            }
        }

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        debug!(operation = %event.operation, seq, "Dispatched call event");
        all_succeeded
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self, bus_type: &'static str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "otel")]
        {
            use crate::utils::metrics::{bus_type_attr, PUBLISH_DROPPED_TOTAL};
            PUBLISH_DROPPED_TOTAL.add(1, &[bus_type_attr(bus_type)]);
        }
        #[cfg(not(feature = "otel"))]
        let _ = bus_type;
    }

    fn record_handler_failure(&self, name: &str) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "otel")]
        {
            use crate::utils::metrics::{handler_attr, HANDLER_FAILURE_TOTAL};
            HANDLER_FAILURE_TOTAL.add(1, &[handler_attr(name)]);
        }
        #[cfg(not(feature = "otel"))]
        let _ = name;
    }

    pub(crate) fn stats(&self) -> BusStats {
        BusStats {
            published: self.published.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for HandlerSet {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
