//! In-process event channel for call notifications.
//!
//! This module contains:
//! - `CallBus` trait: publish/subscribe for [`CallEvent`]s
//! - `CallHandler` trait: subscribers reacting to call events
//! - Implementations: `DirectCallBus` (dispatch on the caller's thread) and
//!   `ChannelCallBus` (dispatch on a tokio worker)
//!
//! Subscribers only see events published after they registered. A failing or
//! panicking handler is isolated: it is logged and counted, and never reaches
//! the publisher or the other handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::operation::CallEvent;

pub mod channel;
pub mod direct;
mod dispatch;

pub use channel::{ChannelCallBus, ChannelConfig};
pub use direct::DirectCallBus;
pub use dispatch::BusStats;
pub(crate) use dispatch::HandlerSet;

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Handler '{0}' is already subscribed to this bus")]
    DuplicateHandler(String),

    #[error("Call event queue is full (capacity {capacity})")]
    Saturated { capacity: usize },

    #[error("Call event queue is closed")]
    Closed,

    #[error("Asynchronous dispatch requires a running tokio runtime")]
    NoRuntime,
}

/// Errors reported by a [`CallHandler`].
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Subscriber for call events.
pub trait CallHandler: Send + Sync {
    /// Name used for duplicate detection and logging.
    fn name(&self) -> &str;

    /// Process one call event.
    fn handle(&self, event: &CallEvent) -> std::result::Result<(), HandlerError>;
}

/// Publish/subscribe channel for call events.
#[async_trait]
pub trait CallBus: Send + Sync {
    /// Hand an event to every subscriber registered before this call.
    ///
    /// Never blocks on subscribers when dispatch is asynchronous; an error
    /// means the event was dropped, not that a subscriber failed.
    fn publish(&self, event: CallEvent) -> Result<()>;

    /// Register a subscriber. Names must be unique per bus.
    fn subscribe(&self, handler: Arc<dyn CallHandler>) -> Result<()>;

    /// Resolve once every event published before this call has been
    /// delivered to subscribers.
    async fn flush(&self) -> Result<()>;

    /// Delivery counters for this bus.
    fn stats(&self) -> BusStats;

    /// Short label for logs ("direct", "channel").
    fn bus_type(&self) -> &'static str;
}
