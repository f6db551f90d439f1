// tagspace-rs/tagspace/src/protection/access_bits.rs
//! MIFARE Classic access conditions.
//!
//! Each block of a sector is governed by a 3-bit code `C1C2C3` (bit 2 = C1).
//! The trailer stores the four codes twice, once inverted, in bytes 6..9:
//!
//! ```text
//! byte 6: !C2[3..0] << 4 | !C1[3..0]
//! byte 7:  C1[3..0] << 4 | !C3[3..0]
//! byte 8:  C3[3..0] << 4 |  C2[3..0]
//! ```
//!
//! A trailer whose inverted copies disagree locks the sector for good, so
//! `decode` refuses such bytes instead of guessing.

use crate::types::{KeySlot, ProtectionMode};
use crate::{Error, Result};

/// Which keys hold a given right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySet {
    pub a: bool,
    pub b: bool,
}

impl KeySet {
    pub const NEVER: Self = Self { a: false, b: false };
    pub const A: Self = Self { a: true, b: false };
    pub const B: Self = Self { a: false, b: true };
    pub const AB: Self = Self { a: true, b: true };

    pub fn allows(&self, slot: KeySlot) -> bool {
        match slot {
            KeySlot::A => self.a,
            KeySlot::B => self.b,
        }
    }

    pub fn any(&self) -> bool {
        self.a || self.b
    }
}

/// Rights on a data block for one access code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRights {
    pub read: KeySet,
    pub write: KeySet,
}

/// Rights on the trailer itself for one access code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerRights {
    pub key_a_write: KeySet,
    pub access_read: KeySet,
    pub access_write: KeySet,
    pub key_b_read: KeySet,
    pub key_b_write: KeySet,
}

impl TrailerRights {
    /// A readable KeyB is plain data and cannot be used to authenticate.
    pub fn key_b_is_data(&self) -> bool {
        self.key_b_read.any()
    }
}

/// Data block rights for code `C1C2C3`.
pub fn data_rights(code: u8) -> DataRights {
    let (read, write) = match code & 0b111 {
        0b000 => (KeySet::AB, KeySet::AB),
        0b010 => (KeySet::AB, KeySet::NEVER),
        0b100 => (KeySet::AB, KeySet::B),
        0b110 => (KeySet::AB, KeySet::B),
        0b001 => (KeySet::AB, KeySet::NEVER),
        0b011 => (KeySet::B, KeySet::B),
        0b101 => (KeySet::B, KeySet::NEVER),
        _ => (KeySet::NEVER, KeySet::NEVER),
    };
    DataRights { read, write }
}

/// Trailer rights for code `C1C2C3`.
pub fn trailer_rights(code: u8) -> TrailerRights {
    let n = KeySet::NEVER;
    let (key_a_write, access_read, access_write, key_b_read, key_b_write) = match code & 0b111 {
        0b000 => (KeySet::A, KeySet::A, n, KeySet::A, KeySet::A),
        0b010 => (n, KeySet::A, n, KeySet::A, n),
        0b100 => (KeySet::B, KeySet::AB, n, n, KeySet::B),
        0b110 => (n, KeySet::AB, n, n, n),
        0b001 => (KeySet::A, KeySet::A, KeySet::A, KeySet::A, KeySet::A),
        0b011 => (KeySet::B, KeySet::AB, KeySet::B, n, KeySet::B),
        0b101 => (n, KeySet::AB, KeySet::B, n, n),
        _ => (n, KeySet::AB, n, n, n),
    };
    TrailerRights {
        key_a_write,
        access_read,
        access_write,
        key_b_read,
        key_b_write,
    }
}

/// Access codes of the three data blocks and the trailer of one sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessConditions {
    pub blocks: [u8; 3],
    pub trailer: u8,
}

impl AccessConditions {
    /// Factory setting: data `000`, trailer `001`.
    pub const TRANSPORT: Self = Self {
        blocks: [0b000; 3],
        trailer: 0b001,
    };

    pub fn uniform(data: u8, trailer: u8) -> Self {
        Self {
            blocks: [data & 0b111; 3],
            trailer: trailer & 0b111,
        }
    }

    /// Codes installed for `mode`. `Inherit` must be resolved first.
    pub fn for_mode(mode: ProtectionMode) -> Result<Self> {
        match mode {
            ProtectionMode::OpenReadWrite => Ok(Self::uniform(0b000, 0b001)),
            ProtectionMode::OpenReadOnly => Ok(Self::uniform(0b010, 0b001)),
            ProtectionMode::PasswordReadWrite => Ok(Self::uniform(0b011, 0b011)),
            ProtectionMode::PasswordReadOnly => Ok(Self::uniform(0b101, 0b011)),
            ProtectionMode::Inherit => Err(Error::UnsupportedMode(mode)),
        }
    }

    /// Mode whose encoding these codes match, if any.
    pub fn mode(&self) -> Option<ProtectionMode> {
        [
            ProtectionMode::OpenReadWrite,
            ProtectionMode::OpenReadOnly,
            ProtectionMode::PasswordReadWrite,
            ProtectionMode::PasswordReadOnly,
        ]
        .into_iter()
        .find(|&m| Self::for_mode(m).is_ok_and(|c| c == *self))
    }

    /// Code governing block `block` (0..=3) of the sector.
    pub fn code_for(&self, block: u16) -> u8 {
        match block {
            0..=2 => self.blocks[block as usize],
            _ => self.trailer,
        }
    }

    pub fn encode(&self) -> [u8; 3] {
        let g = [self.blocks[0], self.blocks[1], self.blocks[2], self.trailer];
        let (mut c1, mut c2, mut c3) = (0u8, 0u8, 0u8);
        for (i, code) in g.iter().enumerate() {
            c1 |= ((code >> 2) & 1) << i;
            c2 |= ((code >> 1) & 1) << i;
            c3 |= (code & 1) << i;
        }
        [
            (!c2 & 0x0F) << 4 | (!c1 & 0x0F),
            c1 << 4 | (!c3 & 0x0F),
            c3 << 4 | c2,
        ]
    }

    pub fn decode(bytes: [u8; 3]) -> Result<Self> {
        let c1 = bytes[1] >> 4;
        let c2 = bytes[2] & 0x0F;
        let c3 = bytes[2] >> 4;
        let inv_c1 = bytes[0] & 0x0F;
        let inv_c2 = bytes[0] >> 4;
        let inv_c3 = bytes[1] & 0x0F;
        if c1 ^ inv_c1 != 0x0F || c2 ^ inv_c2 != 0x0F || c3 ^ inv_c3 != 0x0F {
            return Err(Error::InvalidAccessBits(bytes));
        }
        let code = |i: u8| ((c1 >> i) & 1) << 2 | ((c2 >> i) & 1) << 1 | ((c3 >> i) & 1);
        Ok(Self {
            blocks: [code(0), code(1), code(2)],
            trailer: code(3),
        })
    }
}
