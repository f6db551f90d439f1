// tagspace-rs/tagspace/src/session/info.rs

use crate::types::{CapacityClass, CardFamily, ProtectionMode, Uid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Snapshot describing the mounted tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CardInfo {
    pub uid: Option<Uid>,
    pub family: CardFamily,
    pub capacity_class: CapacityClass,
    /// Virtual capacity in bytes
    pub capacity: u32,
    pub active_mode: ProtectionMode,
}

impl CardInfo {
    /// UID as `04:A1:...`, empty when unknown.
    pub fn uid_string(&self) -> String {
        self.uid
            .as_ref()
            .map(Uid::to_colon_string)
            .unwrap_or_default()
    }
}
