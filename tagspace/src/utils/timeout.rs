// tagspace-rs/tagspace/src/utils/timeout.rs

//! Timeout helpers for the card-presence wait loop.

use std::time::{Duration, Instant};

/// Default time `mount` waits for a tag to answer, in milliseconds.
pub const DEFAULT_CARD_WAIT_MS: u64 = 5000;

/// Default delay between two presence polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Convenience: default card wait as Duration.
pub fn default_card_wait() -> Duration {
    ms(DEFAULT_CARD_WAIT_MS)
}

/// A point in time after which polling gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.0
    }
}
