//! Relay configuration.

use std::time::Duration;

/// Messages kept per identity in the cache and replayed on connect.
pub const HISTORY_LIMIT: usize = 10;

/// Maximum accepted message text length in bytes.
pub const MAX_TEXT_BYTES: usize = 4096;

/// Runtime tunables for the relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Pub/sub channel for message events.
    pub bus_channel: String,
    /// Deadline for each store, cache and bus call.
    pub call_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bus_channel: common::DEFAULT_BUS_CHANNEL.to_string(),
            call_timeout: Duration::from_secs(5),
        }
    }
}
