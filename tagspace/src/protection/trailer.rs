// tagspace-rs/tagspace/src/protection/trailer.rs

use crate::constants::{BLOCK_SIZE, FACTORY_TRAILER};
use crate::protection::access_bits::AccessConditions;
use crate::types::{AuthKey, ProtectionMode};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decoded 16-byte sector trailer: `KeyA | access[3] | tag | KeyB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorTrailer {
    pub key_a: AuthKey,
    pub access: AccessConditions,
    /// General purpose byte; holds the mode tag once a mode was installed
    pub tag: u8,
    pub key_b: AuthKey,
}

impl SectorTrailer {
    /// Trailer installing `mode` with the given keys.
    pub fn for_mode(mode: ProtectionMode, key_a: AuthKey, key_b: AuthKey) -> Result<Self> {
        Ok(Self {
            key_a,
            access: AccessConditions::for_mode(mode)?,
            tag: mode.tag_byte(),
            key_b,
        })
    }

    /// Factory trailer (transport configuration).
    pub fn factory() -> Self {
        Self {
            key_a: AuthKey::FACTORY,
            access: AccessConditions::TRANSPORT,
            tag: FACTORY_TRAILER[9],
            key_b: AuthKey::FACTORY,
        }
    }

    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        out[..6].copy_from_slice(self.key_a.as_bytes());
        out[6..9].copy_from_slice(&self.access.encode());
        out[9] = self.tag;
        out[10..].copy_from_slice(self.key_b.as_bytes());
        out
    }

    /// Parse a trailer as read back from the card. KeyA always reads as
    /// zeros, and KeyB does too unless the trailer code makes it data.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BLOCK_SIZE {
            return Err(Error::InvalidLength {
                expected: BLOCK_SIZE,
                actual: bytes.len(),
            });
        }
        let access = AccessConditions::decode([bytes[6], bytes[7], bytes[8]])?;
        Ok(Self {
            key_a: AuthKey::try_from(&bytes[..6])?,
            access,
            tag: bytes[9],
            key_b: AuthKey::try_from(&bytes[10..])?,
        })
    }
}

/// Protection state of one sector as reported by `read_protection_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SectorProtection {
    pub sector: u16,
    /// Raw access bytes 6..9 of the trailer
    pub access_bytes: [u8; 3],
    pub tag: u8,
    /// Mode whose access conditions match the trailer, if any
    pub mode: Option<ProtectionMode>,
}

impl SectorProtection {
    pub fn from_trailer(sector: u16, trailer: &SectorTrailer) -> Self {
        Self {
            sector,
            access_bytes: trailer.access.encode(),
            tag: trailer.tag,
            mode: trailer.access.mode(),
        }
    }

    /// Mode recorded in the general purpose byte.
    pub fn tagged_mode(&self) -> Option<ProtectionMode> {
        ProtectionMode::from_tag_byte(self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_trailer_bytes() {
        assert_eq!(SectorTrailer::factory().to_bytes(), FACTORY_TRAILER);
        assert_eq!(
            SectorTrailer::parse(&FACTORY_TRAILER).unwrap(),
            SectorTrailer::factory()
        );
    }

    #[test]
    fn password_read_only_layout() {
        let key_b = AuthKey::from_bytes([0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
        let t = SectorTrailer::for_mode(ProtectionMode::PasswordReadOnly, AuthKey::FACTORY, key_b)
            .unwrap();
        let bytes = t.to_bytes();
        assert_eq!(&bytes[..6], &[0xFF; 6]);
        assert_eq!(&bytes[6..9], &[0x78, 0x70, 0xF8]);
        assert_eq!(bytes[9], 4);
        assert_eq!(&bytes[10..], key_b.as_bytes());
    }

    #[test]
    fn parse_rejects_broken_access_bits() {
        let mut raw = FACTORY_TRAILER;
        raw[7] = 0x00;
        assert!(matches!(
            SectorTrailer::parse(&raw),
            Err(Error::InvalidAccessBits(_))
        ));
        assert!(matches!(
            SectorTrailer::parse(&raw[..10]),
            Err(Error::InvalidLength { .. })
        ));
    }

    #[test]
    fn sector_protection_reports_mode_and_tag() {
        let t = SectorTrailer::for_mode(
            ProtectionMode::OpenReadOnly,
            AuthKey::FACTORY,
            AuthKey::FACTORY,
        )
        .unwrap();
        let p = SectorProtection::from_trailer(3, &t);
        assert_eq!(p.mode, Some(ProtectionMode::OpenReadOnly));
        assert_eq!(p.tagged_mode(), Some(ProtectionMode::OpenReadOnly));

        let factory = SectorProtection::from_trailer(1, &SectorTrailer::factory());
        assert_eq!(factory.mode, Some(ProtectionMode::OpenReadWrite));
        assert_eq!(factory.tagged_mode(), None);
    }
}
