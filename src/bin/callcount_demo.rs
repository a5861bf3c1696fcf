//! callcount-demo: call counting walkthrough
//!
//! Wires a demo service with counted and uncounted methods, calls them,
//! and prints the resulting counts as JSON. A failing counted method runs
//! after the report to show that failures are counted too.
//!
//! ## Configuration
//! - First argument: optional path to a YAML config file
//! - CALLCOUNT_CONFIG / CALLCOUNT__DISPATCH__MODE etc.: see `callcount::config`
//! - CALLCOUNT_LOG: log filter (default: info)

use std::time::Duration;

use tracing::{info, warn};

use callcount::config::Config;
use callcount::utils::bootstrap::init_tracing;
use callcount::{counted, CallCountingBuilder, CallPublisher, HasPublisher};

/// Errors returned by the demo service.
#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("rejected: {0}")]
    Rejected(String),
}

struct DemoService {
    publisher: CallPublisher,
}

impl HasPublisher for DemoService {
    fn call_publisher(&self) -> &CallPublisher {
        &self.publisher
    }
}

impl DemoService {
    fn new(publisher: CallPublisher) -> Self {
        Self { publisher }
    }

    #[counted(name = "sayHello")]
    fn say_hello(&self, name: &str) -> String {
        format!("Hello, {}!", name)
    }

    #[counted(name = "doWork")]
    async fn do_work(&self) -> String {
        tokio::time::sleep(Duration::from_millis(100)).await;
        "Work done!".to_string()
    }

    fn not_counted_method(&self) -> String {
        "This call won't be counted".to_string()
    }

    #[counted(name = "alwaysFails")]
    fn always_fails(&self, input: &str) -> Result<String, DemoError> {
        Err(DemoError::Rejected(input.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let path = std::env::args().nth(1);
    let config = Config::load(path.as_deref())?;
    let counting = CallCountingBuilder::from_config(&config).build()?;

    let service = DemoService::new(counting.publisher());

    for name in ["Ada", "Grace", "Linus"] {
        let reply = service.say_hello(name);
        info!(reply = %reply, "sayHello");
    }
    for _ in 0..2 {
        let reply = service.do_work().await;
        info!(reply = %reply, "doWork");
    }
    for _ in 0..2 {
        let reply = service.not_counted_method();
        info!(reply = %reply, "notCountedMethod");
    }

    counting.settle().await?;

    let stats = counting.stats();
    let registered: Vec<&str> = stats
        .registered_operations()
        .iter()
        .map(|op| op.name)
        .collect();
    info!(operations = ?registered, "Counted operations");
    info!(bus = ?counting.bus_stats(), "Bus stats");

    println!("{}", stats.all_counts().to_json()?);

    if let Err(e) = service.always_fails("demo") {
        warn!(error = %e, "alwaysFails returned an error");
    }
    counting.settle().await?;
    info!(count = stats.count_of("alwaysFails"), "Failed calls are counted");

    Ok(())
}
