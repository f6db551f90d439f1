// tagspace-rs/tagspace/src/types.rs

use crate::Error;
use crate::constants::{SAK_CLASSIC_1K, SAK_CLASSIC_4K, SAK_ULTRALIGHT};
use derive_more::Display;
use std::convert::TryFrom;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Memory organisation of the mounted tag.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CardFamily {
    #[default]
    #[display(fmt = "unknown")]
    Unknown,
    /// MIFARE Classic: 16-byte blocks, 4 per sector, last one is the trailer
    #[display(fmt = "classic")]
    Classic,
    /// NTAG21x / Ultralight: linear 4-byte pages
    #[display(fmt = "ultralight")]
    Ultralight,
}

impl CardFamily {
    /// Classify the SAK byte reported during anticollision.
    pub fn from_sak(sak: u8) -> Self {
        match sak & 0x7F {
            SAK_CLASSIC_1K | SAK_CLASSIC_4K => Self::Classic,
            SAK_ULTRALIGHT => Self::Ultralight,
            _ => Self::Unknown,
        }
    }
}

/// NTAG21x size class, detected from the capability container.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CapacityClass {
    #[default]
    #[display(fmt = "unknown")]
    Unknown,
    /// NTAG213
    #[display(fmt = "small")]
    Small,
    /// NTAG215
    #[display(fmt = "medium")]
    Medium,
    /// NTAG216
    #[display(fmt = "large")]
    Large,
}

impl CapacityClass {
    /// Map the size byte (page 3, byte 2) of the capability container.
    pub fn from_capability(byte: u8) -> Self {
        match byte {
            0x12 => Self::Small,
            0x3E => Self::Medium,
            0x6D => Self::Large,
            _ => Self::Unknown,
        }
    }

    /// Capability container size byte for this class (0 when unknown).
    pub fn capability(&self) -> u8 {
        match self {
            Self::Small => 0x12,
            Self::Medium => 0x3E,
            Self::Large => 0x6D,
            Self::Unknown => 0,
        }
    }

    /// Last user data page.
    pub fn max_page(&self) -> u8 {
        match self {
            Self::Small => 39,
            Self::Medium => 129,
            Self::Large => 225,
            Self::Unknown => 0,
        }
    }

    /// First page of the 4-page configuration block.
    pub fn config_page(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            _ => self.max_page() + 2,
        }
    }

    /// Total number of pages on the tag (configuration block included).
    pub fn total_pages(&self) -> u16 {
        match self {
            Self::Unknown => 0,
            _ => self.config_page() as u16 + 4,
        }
    }
}

/// Access policy applied to a range of the virtual address space.
///
/// `Inherit` is only a caller-side sentinel; it is resolved against the
/// session's active mode before any card I/O and is never stored.
#[repr(u8)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProtectionMode {
    #[default]
    #[display(fmt = "inherit")]
    Inherit = 0,
    #[display(fmt = "open-read-write")]
    OpenReadWrite = 1,
    #[display(fmt = "open-read-only")]
    OpenReadOnly = 2,
    #[display(fmt = "password-read-write")]
    PasswordReadWrite = 3,
    #[display(fmt = "password-read-only")]
    PasswordReadOnly = 4,
}

impl ProtectionMode {
    /// Substitute `active` for `Inherit`.
    pub fn resolve(self, active: ProtectionMode) -> ProtectionMode {
        match self {
            Self::Inherit => active,
            other => other,
        }
    }

    pub fn is_password_gated(&self) -> bool {
        matches!(self, Self::PasswordReadWrite | Self::PasswordReadOnly)
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::OpenReadOnly | Self::PasswordReadOnly)
    }

    /// Key slot used for data access under this mode.
    pub fn key_slot(&self) -> KeySlot {
        if self.is_password_gated() {
            KeySlot::B
        } else {
            KeySlot::A
        }
    }

    /// Tag byte stored in the general-purpose byte of a sector trailer.
    pub fn tag_byte(&self) -> u8 {
        *self as u8
    }

    pub fn from_tag_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::OpenReadWrite),
            2 => Some(Self::OpenReadOnly),
            3 => Some(Self::PasswordReadWrite),
            4 => Some(Self::PasswordReadOnly),
            _ => None,
        }
    }
}

/// MIFARE Classic key slot.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeySlot {
    #[display(fmt = "A")]
    A,
    #[display(fmt = "B")]
    B,
}

/// 6-byte secret. Classic uses all of it as a Crypto1 key; NTAG uses the
/// first 4 bytes as PWD and the last 2 as the expected PACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AuthKey([u8; 6]);

impl AuthKey {
    pub const FACTORY: Self = Self([0xFF; 6]);

    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn password(&self) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], self.0[3]]
    }

    pub fn pack(&self) -> [u8; 2] {
        [self.0[4], self.0[5]]
    }
}

impl Default for AuthKey {
    fn default() -> Self {
        Self::FACTORY
    }
}

impl TryFrom<&[u8]> for AuthKey {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 6 {
            return Err(Error::InvalidLength {
                expected: 6,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 6];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// Tag UID (4, 7 or 10 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Uid(Vec<u8>);

impl Uid {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(self.as_bytes())
    }

    /// `04:A1:B2:...` form.
    pub fn to_colon_string(&self) -> String {
        crate::utils::bytes_to_hex_colon(self.as_bytes())
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            4 | 7 | 10 => Ok(Self(bytes.to_vec())),
            n => Err(Error::InvalidLength {
                expected: 7,
                actual: n,
            }),
        }
    }
}

/// One 16-byte physical read unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockData([u8; 16]);

impl BlockData {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex_spaced(self.as_bytes())
    }

    pub fn to_ascii_safe(&self) -> String {
        self.0
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect()
    }
}
