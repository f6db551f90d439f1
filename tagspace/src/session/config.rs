// tagspace-rs/tagspace/src/session/config.rs

use std::time::Duration;

use crate::constants::{FIRST_USER_PAGE, MAX_SECTOR};
use crate::types::{AuthKey, KeySlot, ProtectionMode};
use crate::utils::{DEFAULT_POLL_INTERVAL_MS, default_card_wait, ms};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Keys held by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyRing {
    /// Open access; never changed by the crate
    pub key_a: AuthKey,
    /// Password-gated access (Classic KeyB, NTAG PWD + PACK)
    pub key_b: AuthKey,
    /// Installed when no key is supplied to a protection change
    pub key_b_default: AuthKey,
}

impl KeyRing {
    /// Slot and key used for data access under `mode`.
    pub fn key_for(&self, mode: ProtectionMode) -> (KeySlot, &AuthKey) {
        match mode.key_slot() {
            KeySlot::A => (KeySlot::A, &self.key_a),
            KeySlot::B => (KeySlot::B, &self.key_b),
        }
    }
}

impl Default for KeyRing {
    fn default() -> Self {
        Self {
            key_a: AuthKey::FACTORY,
            key_b: AuthKey::FACTORY,
            key_b_default: AuthKey::FACTORY,
        }
    }
}

/// Session configuration. Bounds are applied at mount.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    pub keys: KeyRing,
    /// First usable Classic sector; sector 0 holds manufacturer data
    pub min_sector: u16,
    pub max_sector: u16,
    /// First usable NTAG page
    pub min_page: u16,
    /// How long `mount` waits for a tag
    pub card_wait: Duration,
    pub poll_interval: Duration,
    /// Mode assumed at mount when the caller passes `Inherit`
    pub default_mode: ProtectionMode,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_sector > self.max_sector || self.max_sector > MAX_SECTOR {
            return Err(Error::InvalidConfig(format!(
                "sector bounds {}..={} outside 0..={}",
                self.min_sector, self.max_sector, MAX_SECTOR
            )));
        }
        if self.min_page < FIRST_USER_PAGE as u16 {
            return Err(Error::InvalidConfig(format!(
                "min_page {} below first user page {}",
                self.min_page, FIRST_USER_PAGE
            )));
        }
        if self.default_mode == ProtectionMode::Inherit {
            return Err(Error::InvalidConfig(
                "default mode must be a concrete mode".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll interval must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keys: KeyRing::default(),
            min_sector: 1,
            max_sector: MAX_SECTOR,
            min_page: 5,
            card_wait: default_card_wait(),
            poll_interval: ms(DEFAULT_POLL_INTERVAL_MS),
            default_mode: ProtectionMode::OpenReadWrite,
        }
    }
}
