// tagspace-rs/tagspace/src/protection/mod.rs
//! Protection codec: native on-card encodings of a [`ProtectionMode`].
//!
//! [`ProtectionMode`]: crate::types::ProtectionMode

pub mod access_bits;
pub mod trailer;
pub mod ultralight;

pub use access_bits::{AccessConditions, DataRights, KeySet, TrailerRights};
pub use trailer::{SectorProtection, SectorTrailer};
pub use ultralight::{ProtectionWindow, UltralightConfig};

/// Decoded protection state of a mounted card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionConfig {
    /// One entry per usable sector
    Classic(Vec<SectorProtection>),
    Ultralight(UltralightConfig),
}
