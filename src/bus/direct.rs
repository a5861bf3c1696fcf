//! Synchronous call bus.
//!
//! Dispatches each event on the publishing thread before `publish` returns,
//! so counts are visible to queries immediately after the instrumented call.
//! The caller pays the aggregation cost.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{BusStats, CallBus, CallHandler, HandlerSet, Result};
use crate::operation::CallEvent;

/// Call bus that delivers on the caller's thread.
pub struct DirectCallBus {
    handlers: HandlerSet,
}

impl DirectCallBus {
    pub fn new() -> Self {
        info!("Direct call bus initialized");
        Self {
            handlers: HandlerSet::new(),
        }
    }
}

impl Default for DirectCallBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallBus for DirectCallBus {
    fn publish(&self, event: CallEvent) -> Result<()> {
        let seq = self.handlers.stamp();
        self.handlers.record_published();
        self.handlers.dispatch(seq, &event);
        Ok(())
    }

    fn subscribe(&self, handler: Arc<dyn CallHandler>) -> Result<()> {
        self.handlers.subscribe(handler).map(|_| ())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn stats(&self) -> BusStats {
        self.handlers.stats()
    }

    fn bus_type(&self) -> &'static str {
        "direct"
    }
}
