//! Realtime feed configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Per-group broadcast buffer. A subscriber further behind than this lags and
/// must resynchronise.
const fn default_capacity() -> usize {
    256
}

/// Snapshot poll interval used when no subscription can be established.
const fn default_poll_interval_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl FeedConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid("feed.capacity", "must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "feed.poll_interval_ms",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
