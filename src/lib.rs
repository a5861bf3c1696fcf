//! Callcount - call instrumentation and counting
//!
//! Counts calls of selected operations without touching their bodies.
//! Instrumented operations publish a call event when they finish; a
//! subscriber aggregates events into per-operation counters that can be
//! queried while calls keep arriving.
//!
//! ```ignore
//! use callcount::{counted, CallCounting, CallPublisher, HasPublisher};
//!
//! struct DemoService {
//!     publisher: CallPublisher,
//! }
//!
//! impl HasPublisher for DemoService {
//!     fn call_publisher(&self) -> &CallPublisher {
//!         &self.publisher
//!     }
//! }
//!
//! impl DemoService {
//!     #[counted(name = "sayHello")]
//!     fn say_hello(&self, name: &str) -> String {
//!         format!("Hello, {}!", name)
//!     }
//! }
//!
//! let counting = CallCounting::builder().build()?;
//! let service = DemoService { publisher: counting.publisher() };
//! service.say_hello("Ada");
//! counting.settle().await?;
//! assert_eq!(counting.stats().count_of("sayHello"), 1);
//! ```

// Lets `#[counted]` expansions refer to `::callcount` from inside this crate.
extern crate self as callcount;

pub mod advice;
pub mod bus;
pub mod config;
pub mod operation;
pub mod pipeline;
pub mod projectors;
pub mod query;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use advice::{CallPublisher, Counted, HasPublisher, InvocationGuard};
pub use callcount_macros::counted;
pub use operation::{CallEvent, OperationId};
pub use pipeline::{CallCounting, CallCountingBuilder};
pub use query::{CallStats, CountSnapshot};

#[doc(hidden)]
pub use inventory;
