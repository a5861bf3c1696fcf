//! Dispatch mode configuration.

use serde::Deserialize;

use crate::bus::ChannelConfig;

/// How call events reach the counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Queue events and count them on a background task. Counts trail the
    /// calls slightly; callers never wait on counting.
    #[default]
    Async,
    /// Count on the calling thread before the instrumented call returns.
    Sync,
}

/// Dispatch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    /// Queue bound for async mode; `None` is unbounded. Ignored in sync mode.
    pub channel_capacity: Option<usize>,
}

impl DispatchConfig {
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            capacity: self.channel_capacity,
        }
    }
}
