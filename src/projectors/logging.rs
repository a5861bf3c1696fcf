//! Logging handler for debugging call flow.

use tracing::info;

use crate::bus::{CallHandler, HandlerError};
use crate::operation::CallEvent;

/// Handler that logs every call event it receives.
pub struct LoggingHandler {
    name: String,
}

impl LoggingHandler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LoggingHandler {
    fn default() -> Self {
        Self::new("call-logger")
    }
}

impl CallHandler for LoggingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, event: &CallEvent) -> Result<(), HandlerError> {
        match event.correlation_id {
            Some(correlation_id) => info!(
                operation = %event.operation,
                correlation_id = %correlation_id,
                "Operation called"
            ),
            None => info!(operation = %event.operation, "Operation called"),
        }
        Ok(())
    }
}
