// tagspace-rs/tagspace/src/prelude.rs

pub use crate::protection::{ProtectionConfig, ProtectionWindow, SectorProtection, UltralightConfig};
pub use crate::session::{CardInfo, KeyRing, Session, SessionBuilder, SessionConfig, SessionState};
pub use crate::transport::{MockTransport, Transport};
pub use crate::{
    AuthKey, BlockData, CapacityClass, CardFamily, Error, KeySlot, ProtectionMode, Result, Uid,
};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_colon, bytes_to_hex_spaced, ms, parse_hex};
