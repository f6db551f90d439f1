// tagspace-rs/tagspace/src/session/mod.rs
//! Card session: mount/unmount, detection and the public read, write and
//! protect entry points.
//!
//! `Inherit` is resolved exactly once, at the top of each public method;
//! layouts only ever see concrete modes.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::layout::ultralight::detect_capacity;
use crate::layout::{CardLayout, ProtectRequest, create_layout_for};
use crate::protection::{ProtectionConfig, UltralightConfig};
use crate::transport::Transport;
use crate::types::{AuthKey, CapacityClass, CardFamily, ProtectionMode, Uid};
use crate::utils::Deadline;
use crate::{Error, Result};

mod builder;
mod config;
mod info;

pub use builder::SessionBuilder;
pub use config::{KeyRing, SessionConfig};
pub use info::CardInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unmounted,
    Mounted,
}

/// Everything derived at mount; dropped as a whole on unmount.
pub(crate) struct Mounted {
    pub(crate) layout: Box<dyn CardLayout>,
    pub(crate) uid: Option<Uid>,
}

pub struct Session {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) config: SessionConfig,
    pub(crate) active_mode: ProtectionMode,
    pub(crate) mounted: Option<Mounted>,
}

impl Session {
    /// Session over `transport` with the default configuration.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        let config = SessionConfig::default();
        Self {
            transport,
            active_mode: config.default_mode,
            config,
            mounted: None,
        }
    }

    pub fn with_config(transport: Box<dyn Transport>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            active_mode: config.default_mode,
            config,
            mounted: None,
        })
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the configuration. Only allowed while unmounted.
    pub fn reconfigure(&mut self, config: SessionConfig) -> Result<()> {
        if self.mounted.is_some() {
            return Err(Error::InvalidConfig(
                "cannot reconfigure a mounted session".into(),
            ));
        }
        config.validate()?;
        self.active_mode = config.default_mode;
        self.config = config;
        Ok(())
    }

    /// Wait up to the configured card wait for a tag and mount it.
    pub fn mount(&mut self, mode: ProtectionMode) -> Result<()> {
        self.mount_with_timeout(self.config.card_wait, mode)
    }

    /// Mount with an explicit wait budget. `mode` is the protection the tag
    /// is expected to carry; `Inherit` means the configured default.
    pub fn mount_with_timeout(&mut self, wait: Duration, mode: ProtectionMode) -> Result<()> {
        if self.mounted.is_some() {
            self.unmount();
        }
        let mode = mode.resolve(self.config.default_mode);
        self.wait_for_card(wait)?;

        let signature = self.transport.family_signature()?;
        let family = CardFamily::from_sak(signature);
        let class = match family {
            CardFamily::Unknown => return Err(Error::UnsupportedFamily { signature }),
            CardFamily::Classic => CapacityClass::Unknown,
            CardFamily::Ultralight => {
                detect_capacity(&mut *self.transport, &self.config.keys, mode)?
            }
        };
        let layout = create_layout_for(family, class, &self.config)?;
        let uid = self.transport.uid();
        info!(
            "mounted {} tag {} (class {}, {} bytes, mode {})",
            family,
            uid.as_ref().map(Uid::to_colon_string).unwrap_or_default(),
            class,
            layout.capacity(),
            mode
        );
        self.active_mode = mode;
        self.mounted = Some(Mounted { layout, uid });
        Ok(())
    }

    fn wait_for_card(&mut self, wait: Duration) -> Result<()> {
        let deadline = Deadline::after(wait);
        loop {
            if self.transport.detect_and_select()? {
                return Ok(());
            }
            if deadline.expired() {
                debug!("no tag within {:?}", wait);
                return Err(Error::Timeout);
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Halt the tag and forget everything derived at mount. Never fails;
    /// a halt error is only logged.
    pub fn unmount(&mut self) {
        if let Err(err) = self.transport.halt() {
            warn!("halt failed during unmount: {}", err);
        }
        if self.mounted.take().is_some() {
            info!("unmounted");
        }
        self.active_mode = self.config.default_mode;
    }

    /// Halt and re-mount so an NTAG drops its password authentication.
    pub fn reset_authentication(&mut self, mode: ProtectionMode) -> Result<()> {
        self.unmount();
        self.mount(mode)
    }

    pub fn state(&self) -> SessionState {
        match self.mounted {
            Some(_) => SessionState::Mounted,
            None => SessionState::Unmounted,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn family(&self) -> CardFamily {
        self.mounted
            .as_ref()
            .map(|m| m.layout.family())
            .unwrap_or_default()
    }

    pub fn capacity_class(&self) -> CapacityClass {
        self.mounted
            .as_ref()
            .map(|m| m.layout.capacity_class())
            .unwrap_or_default()
    }

    pub fn is_classic(&self) -> bool {
        self.family() == CardFamily::Classic
    }

    pub fn is_ultralight(&self) -> bool {
        self.family() == CardFamily::Ultralight
    }

    /// Virtual capacity in bytes; 0 when unmounted.
    pub fn capacity(&self) -> u32 {
        self.mounted
            .as_ref()
            .map(|m| m.layout.capacity())
            .unwrap_or(0)
    }

    pub fn uid(&self) -> Option<&Uid> {
        self.mounted.as_ref().and_then(|m| m.uid.as_ref())
    }

    /// Colon separated upper-case UID; empty when unmounted.
    pub fn uid_string(&self) -> String {
        self.uid().map(Uid::to_colon_string).unwrap_or_default()
    }

    pub fn card_info(&self) -> Option<CardInfo> {
        let mounted = self.mounted.as_ref()?;
        Some(CardInfo {
            uid: mounted.uid.clone(),
            family: mounted.layout.family(),
            capacity_class: mounted.layout.capacity_class(),
            capacity: mounted.layout.capacity(),
            active_mode: self.active_mode,
        })
    }

    pub fn active_mode(&self) -> ProtectionMode {
        self.active_mode
    }

    /// Declare the protection currently on the tag without touching it.
    /// `Inherit` leaves the mode unchanged.
    pub fn set_active_mode(&mut self, mode: ProtectionMode) {
        self.active_mode = mode.resolve(self.active_mode);
    }

    /// Replace KeyB (Classic KeyB, NTAG password + PACK).
    pub fn set_auth_key(&mut self, key: AuthKey) {
        self.config.keys.key_b = key;
    }

    pub fn auth_key(&self) -> &AuthKey {
        &self.config.keys.key_b
    }

    /// Split borrows for a layout call.
    pub(crate) fn parts(&mut self) -> Result<(&dyn CardLayout, &mut dyn Transport, &KeyRing)> {
        let mounted = self.mounted.as_ref().ok_or(Error::NotMounted)?;
        Ok((
            mounted.layout.as_ref(),
            &mut *self.transport,
            &self.config.keys,
        ))
    }

    /// Read `len` bytes at virtual offset `vaddr`.
    pub fn read(&mut self, vaddr: u32, len: usize, mode: ProtectionMode) -> Result<Vec<u8>> {
        let mode = mode.resolve(self.active_mode);
        let (layout, transport, keys) = self.parts()?;
        layout.read(transport, keys, vaddr, len, mode)
    }

    /// Write `data` at virtual offset `vaddr`. A trailing partial unit is
    /// zero padded on the card.
    pub fn write(&mut self, vaddr: u32, data: &[u8], mode: ProtectionMode) -> Result<()> {
        let mode = mode.resolve(self.active_mode);
        let (layout, transport, keys) = self.parts()?;
        layout.write(transport, keys, vaddr, data, mode)
    }

    /// Protect `[vaddr, vaddr + len)` with `mode`, authenticating with the
    /// active mode's credential. See [`Session::apply_protection_from`].
    pub fn apply_protection(
        &mut self,
        mode: ProtectionMode,
        key: Option<AuthKey>,
        vaddr: u32,
        len: usize,
    ) -> Result<()> {
        self.apply_protection_from(mode, key, vaddr, len, ProtectionMode::Inherit)
    }

    /// Protect a range, authenticating with the credential of `previous`.
    ///
    /// `key` becomes the new KeyB (NTAG: password and PACK); `None`
    /// installs the configured KeyB default. Classic ranges must be whole
    /// sectors; NTAG protection always runs from `vaddr` to the end of
    /// memory and ignores `len`. On success the active mode becomes `mode`
    /// and, for password modes, the session KeyB becomes the installed key.
    /// Classic sectors rewritten before a failure stay rewritten.
    pub fn apply_protection_from(
        &mut self,
        mode: ProtectionMode,
        key: Option<AuthKey>,
        vaddr: u32,
        len: usize,
        previous: ProtectionMode,
    ) -> Result<()> {
        let request = ProtectRequest {
            mode: mode.resolve(self.active_mode),
            previous: previous.resolve(self.active_mode),
            key: key.unwrap_or(self.config.keys.key_b_default),
            vaddr,
            len,
        };
        let (layout, transport, keys) = self.parts()?;
        layout.apply_protection(transport, keys, &request)?;
        info!(
            "protection {} -> {} applied from offset {}",
            request.previous, request.mode, vaddr
        );
        self.active_mode = request.mode;
        if request.mode.is_password_gated() {
            self.config.keys.key_b = request.key;
        }
        Ok(())
    }

    /// Decode the protection currently installed on the tag.
    pub fn read_protection_config(&mut self, mode: ProtectionMode) -> Result<ProtectionConfig> {
        let mode = mode.resolve(self.active_mode);
        let (layout, transport, keys) = self.parts()?;
        layout.read_protection(transport, keys, mode)
    }

    /// NTAG only: read the raw configuration record.
    pub fn read_ultralight_config(&mut self, mode: ProtectionMode) -> Result<UltralightConfig> {
        let mode = mode.resolve(self.active_mode);
        let (layout, transport, keys) = self.parts()?;
        layout.read_ultralight_config(transport, keys, mode)
    }

    /// NTAG only: write a configuration record verbatim.
    pub fn write_ultralight_config(
        &mut self,
        config: &UltralightConfig,
        mode: ProtectionMode,
    ) -> Result<()> {
        let mode = mode.resolve(self.active_mode);
        let (layout, transport, keys) = self.parts()?;
        layout.write_ultralight_config(transport, keys, config, mode)
    }

    /// Clear the data area. NTAG tags get a terminator TLV on page 4 first;
    /// `format_all` zero-fills the whole virtual space.
    pub fn format(&mut self, format_all: bool) -> Result<()> {
        let mode = self.active_mode;
        let (layout, transport, keys) = self.parts()?;
        layout.prepare_format(transport, keys, mode)?;
        if format_all {
            layout.zero_fill(transport, keys, mode)?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.mounted.is_some() {
            self.unmount();
        }
    }
}
