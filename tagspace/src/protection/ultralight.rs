// tagspace-rs/tagspace/src/protection/ultralight.rs
//! NTAG21x configuration record.
//!
//! Four pages starting at the class's config page:
//!
//! | page | bytes                              |
//! |------|------------------------------------|
//! | +0   | MIRROR, RFUI, MIRROR_PAGE, AUTH0   |
//! | +1   | ACCESS, RFUI, RFUI, RFUI           |
//! | +2   | PWD (4)                            |
//! | +3   | PACK (2), RFUI, RFUI               |
//!
//! `ACCESS.bit7` (PROT) and `AUTH0` only make sense together and are handled
//! as one [`ProtectionWindow`].

use crate::constants::{AUTH0_DISABLED, FACTORY_ULTRALIGHT_CONFIG, PAGE_SIZE};
use crate::types::{AuthKey, ProtectionMode};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const AUTH0: usize = 3;
const ACCESS: usize = 4;
const PWD: usize = 8;
const PACK: usize = 12;

const PROT_BIT: u8 = 0x80;
const CFGLCK_BIT: u8 = 0x40;
const AUTHLIM_MASK: u8 = 0x07;

/// Joint value of `ACCESS.PROT` and `AUTH0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProtectionWindow {
    /// No page requires the password
    Open,
    /// Reads and writes from `from_page` onward require the password
    Protected { from_page: u8 },
    /// Only writes from `from_page` onward require the password. Never
    /// produced by this crate, but a card may carry it.
    WriteProtected { from_page: u8 },
}

impl ProtectionWindow {
    /// Window installed for `mode`, starting at `from_page`.
    ///
    /// There is no password-less read lock on this family, so
    /// `OpenReadOnly` is refused. `Inherit` must be resolved first.
    pub fn for_mode(mode: ProtectionMode, from_page: u8) -> Result<Self> {
        match mode {
            ProtectionMode::OpenReadWrite => Ok(Self::Open),
            ProtectionMode::PasswordReadWrite | ProtectionMode::PasswordReadOnly => {
                Ok(Self::Protected { from_page })
            }
            ProtectionMode::OpenReadOnly | ProtectionMode::Inherit => {
                Err(Error::UnsupportedMode(mode))
            }
        }
    }

    pub fn from_fields(access: u8, auth0: u8) -> Self {
        match (auth0, access & PROT_BIT != 0) {
            (AUTH0_DISABLED, _) => Self::Open,
            (from_page, true) => Self::Protected { from_page },
            (from_page, false) => Self::WriteProtected { from_page },
        }
    }

    /// `(PROT, AUTH0)`
    pub fn to_fields(&self) -> (bool, u8) {
        match *self {
            Self::Open => (false, AUTH0_DISABLED),
            Self::Protected { from_page } => (true, from_page),
            Self::WriteProtected { from_page } => (false, from_page),
        }
    }

    pub fn is_password_gated(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Whether reading `page` needs the password.
    pub fn guards_read(&self, page: u16) -> bool {
        matches!(*self, Self::Protected { from_page } if page >= from_page as u16)
    }

    /// Whether writing `page` needs the password.
    pub fn guards_write(&self, page: u16) -> bool {
        match *self {
            Self::Open => false,
            Self::Protected { from_page } | Self::WriteProtected { from_page } => {
                page >= from_page as u16
            }
        }
    }
}

/// The 16-byte configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UltralightConfig([u8; 16]);

impl UltralightConfig {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn factory() -> Self {
        Self(FACTORY_ULTRALIGHT_CONFIG)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn mirror(&self) -> u8 {
        self.0[0]
    }

    pub fn mirror_page(&self) -> u8 {
        self.0[2]
    }

    pub fn auth0(&self) -> u8 {
        self.0[AUTH0]
    }

    pub fn access(&self) -> u8 {
        self.0[ACCESS]
    }

    /// Read access is password protected too
    pub fn prot(&self) -> bool {
        self.access() & PROT_BIT != 0
    }

    /// Configuration pages are locked
    pub fn cfglck(&self) -> bool {
        self.access() & CFGLCK_BIT != 0
    }

    /// Allowed failed password attempts (0 = unlimited)
    pub fn auth_limit(&self) -> u8 {
        self.access() & AUTHLIM_MASK
    }

    /// PWD as stored. The card itself always reads it back as zeros.
    pub fn password(&self) -> [u8; 4] {
        [self.0[PWD], self.0[PWD + 1], self.0[PWD + 2], self.0[PWD + 3]]
    }

    pub fn pack(&self) -> [u8; 2] {
        [self.0[PACK], self.0[PACK + 1]]
    }

    pub fn window(&self) -> ProtectionWindow {
        ProtectionWindow::from_fields(self.access(), self.auth0())
    }

    /// Install `window`, touching only PROT and AUTH0.
    pub fn set_window(&mut self, window: ProtectionWindow) {
        let (prot, auth0) = window.to_fields();
        self.0[AUTH0] = auth0;
        if prot {
            self.0[ACCESS] |= PROT_BIT;
        } else {
            self.0[ACCESS] &= !PROT_BIT;
        }
    }

    /// Overwrite PWD and PACK from `key`.
    pub fn set_credentials(&mut self, key: &AuthKey) {
        self.0[PWD..PWD + 4].copy_from_slice(&key.password());
        self.0[PACK..PACK + 2].copy_from_slice(&key.pack());
    }

    /// Rewrite the record for `mode` protecting from `from_page` with `key`.
    pub fn apply(&mut self, mode: ProtectionMode, from_page: u8, key: &AuthKey) -> Result<()> {
        let window = ProtectionWindow::for_mode(mode, from_page)?;
        self.set_window(window);
        self.set_credentials(key);
        Ok(())
    }

    /// The record split into its four pages, in write order.
    pub fn pages(&self) -> impl ExactSizeIterator<Item = &[u8]> {
        self.0.chunks_exact(PAGE_SIZE)
    }
}

impl Default for UltralightConfig {
    fn default() -> Self {
        Self::factory()
    }
}
