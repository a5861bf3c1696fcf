//! Call-event subscribers.
//!
//! - `CallCounter`: aggregates call events into the counter store
//! - `LoggingHandler`: logs every call event (debugging)

mod call_counter;
mod logging;

pub use call_counter::{CallCounter, CALL_COUNTER_NAME};
pub use logging::LoggingHandler;
