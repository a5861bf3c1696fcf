//! Drop guard that publishes a call event on every exit path.

use uuid::Uuid;

use super::CallPublisher;
use crate::operation::{CallEvent, OperationId};

/// Publishes one call event when dropped.
///
/// Created at the start of an instrumented call. Because publication runs in
/// `Drop`, it happens on normal return, early return, `?` propagation and
/// panic unwinding alike, and for futures also when the future is dropped
/// before completing.
#[must_use = "the call is counted when the guard drops; bind it to a variable"]
pub struct InvocationGuard {
    publisher: CallPublisher,
    operation: OperationId,
    correlation_id: Option<Uuid>,
}

impl InvocationGuard {
    pub fn new(publisher: CallPublisher, operation: OperationId) -> Self {
        Self {
            publisher,
            operation,
            correlation_id: None,
        }
    }

    /// Attach a correlation token to the event this guard will publish.
    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn operation(&self) -> &OperationId {
        &self.operation
    }
}

impl Drop for InvocationGuard {
    fn drop(&mut self) {
        let mut event = CallEvent::new(self.operation.clone());
        event.correlation_id = self.correlation_id;
        self.publisher.publish(event);
    }
}
