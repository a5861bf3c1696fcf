//! Call-counting advice for instrumented operations.
//!
//! Counting is applied where operations are wired, not inside them:
//!
//! ```ignore
//! // Declarative: mark methods on a type that exposes a publisher
//! impl DemoService {
//!     #[counted]
//!     fn say_hello(&self, name: &str) -> String { format!("Hello, {}!", name) }
//! }
//!
//! // Explicit: wrap any closure or function
//! let parse = publisher.instrument("parse", |s: &str| s.parse::<u32>());
//! parse.call("42")?;
//! ```
//!
//! Either way, exactly one call event is published when the operation
//! finishes, whether it returned, failed or panicked. The operation's result
//! reaches the caller untouched, and a failed publish never fails the call.

mod counted;
mod guard;
mod registry;

pub use counted::Counted;
pub use guard::InvocationGuard;
pub use registry::{registered_operations, CountedOperation};

use std::sync::Arc;

use tracing::warn;

use crate::bus::CallBus;
use crate::operation::{CallEvent, OperationId};

/// Handle used by instrumented operations to announce completed calls.
///
/// Cheap to clone; all clones publish to the same bus.
#[derive(Clone)]
pub struct CallPublisher {
    bus: Arc<dyn CallBus>,
}

impl CallPublisher {
    pub fn new(bus: Arc<dyn CallBus>) -> Self {
        Self { bus }
    }

    /// Publish one call event for `operation`.
    pub fn notify(&self, operation: &OperationId) {
        self.publish(CallEvent::new(operation.clone()));
    }

    /// Publish a call event. A bus error is logged and swallowed so the
    /// instrumented call is never affected.
    pub fn publish(&self, event: CallEvent) {
        let operation = event.operation.clone();
        if let Err(e) = self.bus.publish(event) {
            warn!(
                operation = %operation,
                bus_type = self.bus.bus_type(),
                error = %e,
                "Failed to publish call event, count will be low"
            );
        }
    }

    /// Start observing one call of `operation`; the event is published when
    /// the returned guard drops.
    pub fn guard(&self, operation: impl Into<OperationId>) -> InvocationGuard {
        InvocationGuard::new(self.clone(), operation.into())
    }

    /// Wrap `op` so that every call through the wrapper is counted as
    /// `operation`.
    pub fn instrument<F>(&self, operation: impl Into<OperationId>, op: F) -> Counted<F> {
        Counted::new(operation.into(), self.clone(), op)
    }

    pub fn bus(&self) -> &Arc<dyn CallBus> {
        &self.bus
    }
}

impl std::fmt::Debug for CallPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallPublisher")
            .field("bus_type", &self.bus.bus_type())
            .finish()
    }
}

/// Types whose methods can carry the `#[counted]` marker.
pub trait HasPublisher {
    fn call_publisher(&self) -> &CallPublisher;
}

impl HasPublisher for CallPublisher {
    fn call_publisher(&self) -> &CallPublisher {
        self
    }
}
