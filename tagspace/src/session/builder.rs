// tagspace-rs/tagspace/src/session/builder.rs

use std::time::Duration;

use crate::session::{Session, SessionConfig};
use crate::transport::Transport;
use crate::types::{AuthKey, ProtectionMode};
use crate::{Error, Result};

/// Helper to construct a Session with optional configuration.
pub struct SessionBuilder {
    transport: Option<Box<dyn Transport>>,
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            config: SessionConfig::default(),
        }
    }

    /// Provide an already-created transport instance (e.g. MockTransport)
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sectors(mut self, min: u16, max: u16) -> Self {
        self.config.min_sector = min;
        self.config.max_sector = max;
        self
    }

    pub fn min_page(mut self, page: u16) -> Self {
        self.config.min_page = page;
        self
    }

    pub fn key_a(mut self, key: AuthKey) -> Self {
        self.config.keys.key_a = key;
        self
    }

    pub fn key_b(mut self, key: AuthKey) -> Self {
        self.config.keys.key_b = key;
        self
    }

    pub fn key_b_default(mut self, key: AuthKey) -> Self {
        self.config.keys.key_b_default = key;
        self
    }

    pub fn card_wait(mut self, wait: Duration) -> Self {
        self.config.card_wait = wait;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn default_mode(mut self, mode: ProtectionMode) -> Self {
        self.config.default_mode = mode;
        self
    }

    /// Validate the configuration and return an unmounted Session.
    pub fn build(self) -> Result<Session> {
        let transport = self
            .transport
            .ok_or_else(|| Error::InvalidConfig("no transport provided".into()))?;
        Session::with_config(transport, self.config)
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
