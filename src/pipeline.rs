//! Wiring for the call-counting pipeline.
//!
//! Builds the bus for the configured dispatch mode, registers the counting
//! handler exactly once, and hands out the publisher (for instrumented
//! operations) and the stats handle (for reporting).

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;

use crate::advice::{CallPublisher, HasPublisher};
use crate::bus::{BusStats, CallBus, CallHandler, ChannelCallBus, DirectCallBus, Result};
use crate::config::{Config, DispatchConfig, DispatchMode};
use crate::projectors::{CallCounter, LoggingHandler};
use crate::query::CallStats;
use crate::store::CounterStore;

/// Builder for a [`CallCounting`] pipeline.
///
/// # Example
///
/// ```ignore
/// let counting = CallCounting::builder()
///     .with_channel_capacity(4096)
///     .build()?;
///
/// let service = DemoService::new(counting.publisher());
/// service.say_hello("Ada");
///
/// counting.settle().await?;
/// println!("{}", counting.stats().all_counts().to_json()?);
/// ```
pub struct CallCountingBuilder {
    dispatch: DispatchConfig,
    log_invocations: bool,
    handlers: Vec<Arc<dyn CallHandler>>,
    runtime: Option<Handle>,
}

impl Default for CallCountingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallCountingBuilder {
    /// Defaults: asynchronous dispatch on an unbounded queue, no call logging.
    pub fn new() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            log_invocations: false,
            handlers: Vec::new(),
            runtime: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_dispatch(config.dispatch.clone())
            .log_invocations(config.log_invocations)
    }

    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Count on the calling thread.
    pub fn sync(mut self) -> Self {
        self.dispatch.mode = DispatchMode::Sync;
        self
    }

    /// Count on a background task.
    pub fn asynchronous(mut self) -> Self {
        self.dispatch.mode = DispatchMode::Async;
        self
    }

    /// Bound the async queue; events beyond it are dropped and logged.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.dispatch.channel_capacity = Some(capacity);
        self
    }

    /// Runtime for the async consumer. Defaults to the current runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Also subscribe a [`LoggingHandler`].
    pub fn log_invocations(mut self, enabled: bool) -> Self {
        self.log_invocations = enabled;
        self
    }

    /// Subscribe an additional handler alongside the counter.
    pub fn with_handler(mut self, handler: Arc<dyn CallHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> Result<CallCounting> {
        let bus: Arc<dyn CallBus> = match self.dispatch.mode {
            DispatchMode::Sync => Arc::new(DirectCallBus::new()),
            DispatchMode::Async => {
                let channel = self.dispatch.channel_config();
                match &self.runtime {
                    Some(runtime) => Arc::new(ChannelCallBus::with_runtime(channel, runtime)),
                    None => Arc::new(ChannelCallBus::new(channel)?),
                }
            }
        };

        let store = Arc::new(CounterStore::new());
        bus.subscribe(Arc::new(CallCounter::new(Arc::clone(&store))))?;

        if self.log_invocations {
            bus.subscribe(Arc::new(LoggingHandler::default()))?;
        }
        for handler in self.handlers {
            bus.subscribe(handler)?;
        }

        info!(
            bus_type = bus.bus_type(),
            mode = ?self.dispatch.mode,
            capacity = ?self.dispatch.channel_capacity,
            "Call counting pipeline started"
        );

        Ok(CallCounting {
            publisher: CallPublisher::new(Arc::clone(&bus)),
            stats: CallStats::new(store),
            bus,
        })
    }
}

/// Running call-counting pipeline.
pub struct CallCounting {
    bus: Arc<dyn CallBus>,
    publisher: CallPublisher,
    stats: CallStats,
}

impl CallCounting {
    pub fn builder() -> CallCountingBuilder {
        CallCountingBuilder::new()
    }

    /// Publisher for instrumented operations.
    pub fn publisher(&self) -> CallPublisher {
        self.publisher.clone()
    }

    /// Query handle for counts.
    pub fn stats(&self) -> CallStats {
        self.stats.clone()
    }

    /// Subscribe another handler after startup. It only sees calls that
    /// complete from now on.
    pub fn subscribe(&self, handler: Arc<dyn CallHandler>) -> Result<()> {
        self.bus.subscribe(handler)
    }

    /// Wait until every call completed so far is reflected in the counts.
    pub async fn settle(&self) -> Result<()> {
        self.bus.flush().await
    }

    pub fn bus_stats(&self) -> BusStats {
        self.bus.stats()
    }

    pub fn bus(&self) -> &Arc<dyn CallBus> {
        &self.bus
    }
}

impl HasPublisher for CallCounting {
    fn call_publisher(&self) -> &CallPublisher {
        &self.publisher
    }
}
