// tagspace-rs/tagspace/src/layout/mod.rs
//! Per-family strategy objects.
//!
//! A mounted session holds exactly one `CardLayout`, picked by
//! [`create_layout_for`] from the detected family. Everything family
//! specific (translation, the unit loops, the protection encoding) lives
//! behind it so the session never branches on the family again.

use log::warn;

use crate::address::PhysicalAddress;
use crate::protection::{ProtectionConfig, UltralightConfig};
use crate::session::{KeyRing, SessionConfig};
use crate::transport::Transport;
use crate::types::{AuthKey, CapacityClass, CardFamily, ProtectionMode};
use crate::{Error, Result};

pub mod classic;
pub mod ultralight;

pub use classic::ClassicLayout;
pub use ultralight::UltralightLayout;

/// Largest chunk the zero fill of `format` hands to `write` at once.
pub const FORMAT_CHUNK: usize = 48;

/// A resolved protection change. Both modes are concrete (never `Inherit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectRequest {
    pub mode: ProtectionMode,
    /// Mode the card is currently protected with; selects the credential
    pub previous: ProtectionMode,
    /// KeyB / password installed by the change
    pub key: AuthKey,
    pub vaddr: u32,
    /// Ignored by layouts that protect "from here to the end"
    pub len: usize,
}

pub trait CardLayout {
    fn family(&self) -> CardFamily;

    fn capacity_class(&self) -> CapacityClass {
        CapacityClass::Unknown
    }

    /// Bytes per physical write; write offsets must be multiples of it.
    fn unit_size(&self) -> usize;

    /// Size of the virtual address space in bytes.
    fn capacity(&self) -> u32;

    fn translate(&self, vaddr: u32) -> PhysicalAddress;

    fn read(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        vaddr: u32,
        len: usize,
        mode: ProtectionMode,
    ) -> Result<Vec<u8>>;

    fn write(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        vaddr: u32,
        data: &[u8],
        mode: ProtectionMode,
    ) -> Result<()>;

    fn apply_protection(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        request: &ProtectRequest,
    ) -> Result<()>;

    fn read_protection(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<ProtectionConfig>;

    /// Family specific preparation run by `format` before the optional
    /// zero fill.
    fn prepare_format(
        &self,
        _transport: &mut dyn Transport,
        _keys: &KeyRing,
        _mode: ProtectionMode,
    ) -> Result<()> {
        Ok(())
    }

    /// Zero the whole virtual space, reusing one bounded buffer.
    fn zero_fill(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<()> {
        let zeros = [0u8; FORMAT_CHUNK];
        let capacity = self.capacity() as usize;
        let mut offset = 0usize;
        while offset < capacity {
            let n = (capacity - offset).min(FORMAT_CHUNK);
            self.write(transport, keys, offset as u32, &zeros[..n], mode)?;
            offset += n;
        }
        Ok(())
    }

    fn read_ultralight_config(
        &self,
        _transport: &mut dyn Transport,
        _keys: &KeyRing,
        _mode: ProtectionMode,
    ) -> Result<UltralightConfig> {
        Err(Error::UnsupportedOperation(format!(
            "configuration record on a {} card",
            self.family()
        )))
    }

    fn write_ultralight_config(
        &self,
        _transport: &mut dyn Transport,
        _keys: &KeyRing,
        _config: &UltralightConfig,
        _mode: ProtectionMode,
    ) -> Result<()> {
        Err(Error::UnsupportedOperation(format!(
            "configuration record on a {} card",
            self.family()
        )))
    }
}

/// Factory to create the layout for a detected family. `class` is only
/// consulted for Ultralight tags.
pub fn create_layout_for(
    family: CardFamily,
    class: CapacityClass,
    config: &SessionConfig,
) -> Result<Box<dyn CardLayout>> {
    match family {
        CardFamily::Classic => Ok(Box::new(ClassicLayout::new(
            config.min_sector,
            config.max_sector,
        ))),
        CardFamily::Ultralight => Ok(Box::new(UltralightLayout::new(class, config.min_page)?)),
        CardFamily::Unknown => Err(Error::UnsupportedFamily { signature: 0 }),
    }
}

/// A transport error raised by an authentication exchange is an
/// authentication failure of `unit`.
pub(crate) fn auth_failure(unit: u16) -> impl FnOnce(Error) -> Error {
    move |err| match err {
        Error::TransportFailed { .. } => Error::AuthenticationFailed { unit },
        other => other,
    }
}

/// Tear down the Crypto1 session exactly once, whatever `result` is.
pub(crate) fn finish<T>(transport: &mut dyn Transport, result: Result<T>) -> Result<T> {
    let teardown = transport.end_auth_session();
    match (result, teardown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(teardown_err)) => {
            warn!("end_auth_session failed after error: {}", teardown_err);
            Err(err)
        }
    }
}

/// Password-authenticate with `key` and check the returned PACK. A refused
/// challenge is an authentication failure of `unit`, the PWD page when known.
pub(crate) fn password_auth(
    transport: &mut dyn Transport,
    key: &AuthKey,
    unit: u16,
) -> Result<()> {
    let pack = transport
        .password_challenge(key.password())
        .map_err(auth_failure(unit))?;
    if pack != key.pack() {
        return Err(Error::PackMismatch {
            expected: key.pack(),
            actual: pack,
        });
    }
    Ok(())
}
