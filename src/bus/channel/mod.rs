//! Asynchronous call bus backed by a tokio mpsc queue.
//!
//! `publish` only enqueues; a single worker task drains the queue and fans
//! events out to subscribers. Events from one publisher reach each
//! subscriber in publish order. Queries made right after an instrumented
//! call returns may not reflect it until the queue is drained; `flush`
//! waits for that.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::{BusError, BusStats, CallBus, CallHandler, HandlerSet, Result};
use crate::operation::CallEvent;

/// Configuration for the channel call bus.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Queue capacity.
    /// - `None` queues without limit
    /// - `Some(n)` drops events once `n` are waiting; `Some(0)` is treated
    ///   as `Some(1)`
    pub capacity: Option<usize>,
}

impl ChannelConfig {
    pub fn unbounded() -> Self {
        Self { capacity: None }
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
        }
    }
}

enum Envelope {
    Call { seq: u64, event: CallEvent },
    Flush(oneshot::Sender<()>),
}

enum QueueSender {
    Bounded {
        sender: mpsc::Sender<Envelope>,
        capacity: usize,
    },
    Unbounded(mpsc::UnboundedSender<Envelope>),
}

enum QueueReceiver {
    Bounded(mpsc::Receiver<Envelope>),
    Unbounded(mpsc::UnboundedReceiver<Envelope>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<Envelope> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }
}

/// Call bus that dispatches on a background tokio task.
pub struct ChannelCallBus {
    sender: QueueSender,
    handlers: Arc<HandlerSet>,
}

impl ChannelCallBus {
    /// Create the bus and spawn its consumer on the current tokio runtime.
    pub fn new(config: ChannelConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| BusError::NoRuntime)?;
        Ok(Self::with_runtime(config, &runtime))
    }

    /// Create the bus with its consumer on an explicit runtime.
    pub fn with_runtime(config: ChannelConfig, runtime: &Handle) -> Self {
        let handlers = Arc::new(HandlerSet::new());

        let (sender, receiver) = match config.capacity {
            Some(capacity) => {
                // tokio rejects zero-capacity channels
                let capacity = capacity.max(1);
                let (tx, rx) = mpsc::channel(capacity);
                (
                    QueueSender::Bounded {
                        sender: tx,
                        capacity,
                    },
                    QueueReceiver::Bounded(rx),
                )
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
            }
        };

        runtime.spawn(consume(receiver, Arc::clone(&handlers)));

        info!(capacity = ?config.capacity, "Channel call bus initialized");

        Self { sender, handlers }
    }

    pub fn unbounded() -> Result<Self> {
        Self::new(ChannelConfig::unbounded())
    }

    pub fn bounded(capacity: usize) -> Result<Self> {
        Self::new(ChannelConfig::bounded(capacity))
    }

    fn enqueue(&self, envelope: Envelope) -> Result<()> {
        match &self.sender {
            QueueSender::Bounded { sender, capacity } => {
                sender.try_send(envelope).map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => BusError::Saturated {
                        capacity: *capacity,
                    },
                    mpsc::error::TrySendError::Closed(_) => BusError::Closed,
                })
            }
            QueueSender::Unbounded(sender) => sender.send(envelope).map_err(|_| BusError::Closed),
        }
    }
}

async fn consume(mut receiver: QueueReceiver, handlers: Arc<HandlerSet>) {
    while let Some(envelope) = receiver.recv().await {
        match envelope {
            Envelope::Call { seq, event } => {
                handlers.dispatch(seq, &event);
            }
            Envelope::Flush(ack) => {
                // Flusher may have given up waiting
                let _ = ack.send(());
            }
        }
    }
    debug!("Call event queue closed, stopping consumer");
}

#[async_trait]
impl CallBus for ChannelCallBus {
    fn publish(&self, event: CallEvent) -> Result<()> {
        let seq = self.handlers.stamp();

        match self.enqueue(Envelope::Call { seq, event }) {
            Ok(()) => {
                self.handlers.record_published();
                Ok(())
            }
            Err(e) => {
                self.handlers.record_dropped(self.bus_type());
                Err(e)
            }
        }
    }

    fn subscribe(&self, handler: Arc<dyn CallHandler>) -> Result<()> {
        let count = self.handlers.subscribe(handler)?;
        debug!(handler_count = count, "Handler subscribed to channel bus");
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();

        // Flush markers wait for room instead of being dropped
        match &self.sender {
            QueueSender::Bounded { sender, .. } => sender
                .send(Envelope::Flush(ack))
                .await
                .map_err(|_| BusError::Closed)?,
            QueueSender::Unbounded(sender) => sender
                .send(Envelope::Flush(ack))
                .map_err(|_| BusError::Closed)?,
        }

        done.await.map_err(|_| BusError::Closed)
    }

    fn stats(&self) -> BusStats {
        self.handlers.stats()
    }

    fn bus_type(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests;
