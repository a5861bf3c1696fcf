use super::*;
use crate::test_utils::{CountingHandler, FailingHandler};
use std::sync::atomic::{AtomicBool, Ordering};

fn event(name: &str) -> CallEvent {
    CallEvent::new(name.into())
}

#[test]
fn test_new_outside_runtime_fails() {
    let result = ChannelCallBus::unbounded();
    assert!(matches!(result, Err(BusError::NoRuntime)));
}

#[tokio::test]
async fn test_publish_no_subscribers() {
    let bus = ChannelCallBus::unbounded().unwrap();

    assert!(bus.publish(event("sayHello")).is_ok());
    bus.flush().await.unwrap();
    assert_eq!(bus.stats().published, 1);
}

#[tokio::test]
async fn test_subscribe_and_receive() {
    let bus = ChannelCallBus::unbounded().unwrap();
    let handler = Arc::new(CountingHandler::named("counter"));
    bus.subscribe(handler.clone()).unwrap();

    bus.publish(event("sayHello")).unwrap();
    bus.publish(event("doWork")).unwrap();
    bus.flush().await.unwrap();

    assert_eq!(handler.calls(), 2);
}

#[tokio::test]
async fn test_preserves_publish_order() {
    let bus = ChannelCallBus::unbounded().unwrap();
    let handler = Arc::new(CountingHandler::named("ordered"));
    bus.subscribe(handler.clone()).unwrap();

    let names: Vec<String> = (0..50).map(|i| format!("op-{}", i)).collect();
    for name in &names {
        bus.publish(event(name)).unwrap();
    }
    bus.flush().await.unwrap();

    assert_eq!(handler.operations(), names);
}

#[tokio::test]
async fn test_failing_handler_isolated() {
    let bus = ChannelCallBus::unbounded().unwrap();
    let counter = Arc::new(CountingHandler::named("counter"));
    bus.subscribe(Arc::new(FailingHandler::named("failing")))
        .unwrap();
    bus.subscribe(counter.clone()).unwrap();

    assert!(bus.publish(event("doWork")).is_ok());
    bus.flush().await.unwrap();

    assert_eq!(counter.calls(), 1);
    assert_eq!(bus.stats().handler_failures, 1);
}

#[tokio::test]
async fn test_queued_event_not_replayed_to_late_subscriber() {
    let bus = ChannelCallBus::unbounded().unwrap();

    // Current-thread runtime: the consumer cannot run until we yield, so the
    // first event is still queued when the handler subscribes.
    bus.publish(event("before")).unwrap();
    let handler = Arc::new(CountingHandler::named("late"));
    bus.subscribe(handler.clone()).unwrap();
    bus.publish(event("after")).unwrap();
    bus.flush().await.unwrap();

    assert_eq!(handler.operations(), vec!["after".to_string()]);
}

struct BlockingHandler {
    released: Arc<AtomicBool>,
}

impl CallHandler for BlockingHandler {
    fn name(&self) -> &str {
        "blocking"
    }

    fn handle(&self, _event: &CallEvent) -> std::result::Result<(), crate::bus::HandlerError> {
        while !self.released.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bounded_queue_drops_when_full() {
    let bus = ChannelCallBus::bounded(2).unwrap();
    let released = Arc::new(AtomicBool::new(false));
    bus.subscribe(Arc::new(BlockingHandler {
        released: Arc::clone(&released),
    }))
    .unwrap();

    // First event occupies the consumer, the next two fill the queue.
    bus.publish(event("work")).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    bus.publish(event("work")).unwrap();
    bus.publish(event("work")).unwrap();

    let err = bus.publish(event("work")).unwrap_err();
    assert!(matches!(err, BusError::Saturated { capacity: 2 }));
    assert_eq!(bus.stats().dropped, 1);

    released.store(true, Ordering::SeqCst);
    bus.flush().await.unwrap();
    assert_eq!(bus.stats().dispatched, 3);
}

#[test]
fn test_with_runtime_outside_async_context() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let bus = ChannelCallBus::with_runtime(ChannelConfig::unbounded(), runtime.handle());
    let handler = Arc::new(CountingHandler::named("counter"));
    bus.subscribe(handler.clone()).unwrap();

    bus.publish(event("sayHello")).unwrap();
    runtime.block_on(bus.flush()).unwrap();

    assert_eq!(handler.calls(), 1);
}

#[test]
fn test_channel_config_constructors() {
    assert_eq!(ChannelConfig::unbounded().capacity, None);
    assert_eq!(ChannelConfig::bounded(16).capacity, Some(16));
    assert_eq!(ChannelConfig::default(), ChannelConfig::unbounded());
}

#[tokio::test]
async fn test_zero_capacity_holds_one_event() {
    // Current-thread runtime: the consumer cannot run until this task yields
    let bus = ChannelCallBus::bounded(0).unwrap();

    bus.publish(event("work")).unwrap();
    let err = bus.publish(event("work")).unwrap_err();

    assert!(matches!(err, BusError::Saturated { capacity: 1 }));
    assert_eq!(bus.stats().dropped, 1);
}

#[test]
fn test_publish_after_runtime_shutdown_is_closed() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let bus = ChannelCallBus::with_runtime(ChannelConfig::unbounded(), runtime.handle());
    drop(runtime);

    let err = bus.publish(event("sayHello")).unwrap_err();

    assert!(matches!(err, BusError::Closed));
    assert_eq!(bus.stats().dropped, 1);
    assert_eq!(bus.stats().published, 0);
}
