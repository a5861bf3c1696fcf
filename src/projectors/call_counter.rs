//! Aggregator turning call events into counts.

use std::sync::Arc;

use tracing::trace;

use crate::bus::{CallHandler, HandlerError};
use crate::operation::CallEvent;
use crate::store::CounterStore;

/// Subscription name of the counting handler.
///
/// Fixed so that a second registration on the same bus is rejected as a
/// duplicate instead of double counting.
pub const CALL_COUNTER_NAME: &str = "call-counter";

/// Handler that increments the counter of each event's operation.
pub struct CallCounter {
    store: Arc<CounterStore>,
}

impl CallCounter {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self { store }
    }

    /// Get a handle to the store this handler writes to.
    pub fn store(&self) -> Arc<CounterStore> {
        Arc::clone(&self.store)
    }
}

impl CallHandler for CallCounter {
    fn name(&self) -> &str {
        CALL_COUNTER_NAME
    }

    fn handle(&self, event: &CallEvent) -> Result<(), HandlerError> {
        let count = self.store.increment_and_get(&event.operation);
        trace!(operation = %event.operation, count, "Call counted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusError, CallBus, DirectCallBus};

    #[test]
    fn test_counts_per_operation() {
        let store = Arc::new(CounterStore::new());
        let counter = CallCounter::new(Arc::clone(&store));

        counter.handle(&CallEvent::new("sayHello".into())).unwrap();
        counter.handle(&CallEvent::new("sayHello".into())).unwrap();
        counter.handle(&CallEvent::new("doWork".into())).unwrap();

        assert_eq!(store.get("sayHello"), 2);
        assert_eq!(store.get("doWork"), 1);
    }

    #[test]
    fn test_store_handle_sees_counts() {
        let counter = CallCounter::new(Arc::new(CounterStore::new()));
        let store = counter.store();

        counter.handle(&CallEvent::new("doWork".into())).unwrap();

        assert_eq!(store.get("doWork"), 1);
        assert_eq!(counter.store().snapshot(), store.snapshot());
    }

    #[test]
    fn test_double_registration_rejected() {
        let store = Arc::new(CounterStore::new());
        let bus = DirectCallBus::new();
        bus.subscribe(Arc::new(CallCounter::new(Arc::clone(&store))))
            .unwrap();

        let err = bus
            .subscribe(Arc::new(CallCounter::new(Arc::clone(&store))))
            .unwrap_err();
        assert!(matches!(err, BusError::DuplicateHandler(_)));

        bus.publish(CallEvent::new("sayHello".into())).unwrap();
        assert_eq!(store.get("sayHello"), 1);
    }
}
