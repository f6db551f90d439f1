// tagspace-rs/tagspace/src/layout/ultralight/mod.rs
//! NTAG21x: linear 4-byte pages, one password challenge per operation, one
//! configuration record for the whole tag.

use log::{debug, trace};

use crate::address::{PhysicalAddress, translate_page};
use crate::constants::{
    BLOCK_SIZE, CAPABILITY_MAGIC, CAPABILITY_PAGE, FIRST_USER_PAGE, PAGE_SIZE, TERMINATOR_TLV,
};
use crate::io::{check_aligned, check_in_capacity, chunks, padded};
use crate::layout::{CardLayout, ProtectRequest, password_auth};
use crate::protection::{ProtectionConfig, UltralightConfig};
use crate::session::KeyRing;
use crate::transport::Transport;
use crate::types::{CapacityClass, CardFamily, ProtectionMode};
use crate::utils::bytes_to_hex_spaced;
use crate::{Error, Result};

/// Read the capability container and classify the tag.
///
/// A password-gated `mode` authenticates with the session KeyB first so the
/// size of a protected tag can still be queried.
pub fn detect_capacity(
    transport: &mut dyn Transport,
    keys: &KeyRing,
    mode: ProtectionMode,
) -> Result<CapacityClass> {
    if mode.is_password_gated() {
        // the PWD page is unknown until the class is
        password_auth(transport, &keys.key_b, 0)?;
    }
    // READ 0 returns pages 0..=3; the capability container is the last one
    let raw = transport.read_unit(0)?;
    let cc = &raw[CAPABILITY_PAGE as usize * PAGE_SIZE..BLOCK_SIZE];
    trace!("capability container: {}", bytes_to_hex_spaced(cc));
    if cc[0] != CAPABILITY_MAGIC {
        return Err(Error::UnknownCapacity { capability: cc[2] });
    }
    match CapacityClass::from_capability(cc[2]) {
        CapacityClass::Unknown => Err(Error::UnknownCapacity { capability: cc[2] }),
        class => Ok(class),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UltralightLayout {
    class: CapacityClass,
    min_page: u16,
    max_page: u16,
    config_page: u16,
}

impl UltralightLayout {
    pub fn new(class: CapacityClass, min_page: u16) -> Result<Self> {
        if class == CapacityClass::Unknown {
            return Err(Error::UnknownCapacity {
                capability: class.capability(),
            });
        }
        let max_page = class.max_page() as u16;
        if min_page > max_page {
            return Err(Error::InvalidConfig(format!(
                "min_page {} beyond last user page {}",
                min_page, max_page
            )));
        }
        Ok(Self {
            class,
            min_page,
            max_page,
            config_page: class.config_page() as u16,
        })
    }

    pub fn min_page(&self) -> u16 {
        self.min_page
    }

    pub fn max_page(&self) -> u16 {
        self.max_page
    }

    pub fn config_page(&self) -> u16 {
        self.config_page
    }

    fn page_of(&self, vaddr: u32) -> u16 {
        match self.translate(vaddr) {
            PhysicalAddress::Page { page } => page,
            other => other.unit(),
        }
    }

    fn check_page(&self, page: u16) -> Result<()> {
        if page < self.min_page || page > self.max_page {
            return Err(Error::UnitOutOfRange {
                unit: page,
                min: self.min_page,
                max: self.max_page,
            });
        }
        Ok(())
    }

    fn authenticate_for(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<()> {
        if mode.is_password_gated() {
            debug!("password authentication for {}", mode);
            password_auth(transport, &keys.key_b, self.config_page + 2)?;
        }
        Ok(())
    }

    fn read_config(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<UltralightConfig> {
        self.authenticate_for(transport, keys, mode)?;
        let raw = transport.read_unit(self.config_page)?;
        trace!("config page {}: {}", self.config_page, bytes_to_hex_spaced(&raw));
        Ok(UltralightConfig::from_bytes(raw))
    }

    /// Write the record page by page. Once a page has landed, a later
    /// failure is a `PartialFailure` counting the pages written.
    fn write_config(&self, transport: &mut dyn Transport, config: &UltralightConfig) -> Result<()> {
        let total = config.pages().len();
        for (updated, (page, data)) in (self.config_page..).zip(config.pages()).enumerate() {
            debug!("write config page {}", page);
            match transport.write_unit(page, data) {
                Ok(()) => {}
                Err(source) if updated > 0 => {
                    return Err(Error::PartialFailure {
                        updated,
                        total,
                        source: Box::new(source),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

impl CardLayout for UltralightLayout {
    fn family(&self) -> CardFamily {
        CardFamily::Ultralight
    }

    fn capacity_class(&self) -> CapacityClass {
        self.class
    }

    fn unit_size(&self) -> usize {
        PAGE_SIZE
    }

    fn capacity(&self) -> u32 {
        (self.max_page - self.min_page + 1) as u32 * PAGE_SIZE as u32
    }

    fn translate(&self, vaddr: u32) -> PhysicalAddress {
        translate_page(vaddr, self.min_page)
    }

    fn read(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        vaddr: u32,
        len: usize,
        mode: ProtectionMode,
    ) -> Result<Vec<u8>> {
        check_aligned(vaddr, PAGE_SIZE)?;
        check_in_capacity(vaddr, len, self.capacity())?;
        self.authenticate_for(transport, keys, mode)?;
        let mut out = Vec::with_capacity(len);
        // READ returns four pages at once
        for chunk in chunks(vaddr, len, BLOCK_SIZE) {
            let first = self.page_of(chunk.vaddr);
            self.check_page(first)?;
            self.check_page(self.page_of(chunk.last_vaddr()))?;
            debug!("read pages {}..{}", first, first + 4);
            let data = transport.read_unit(first)?;
            trace!("page {}: {}", first, bytes_to_hex_spaced(&data));
            out.extend_from_slice(&data[..chunk.len]);
        }
        Ok(out)
    }

    fn write(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        vaddr: u32,
        data: &[u8],
        mode: ProtectionMode,
    ) -> Result<()> {
        check_aligned(vaddr, PAGE_SIZE)?;
        check_in_capacity(vaddr, data.len(), self.capacity())?;
        self.authenticate_for(transport, keys, mode)?;
        for chunk in chunks(vaddr, data.len(), PAGE_SIZE) {
            let page = self.page_of(chunk.vaddr);
            self.check_page(page)?;
            let buf: [u8; PAGE_SIZE] = padded(&data[chunk.offset..chunk.offset + chunk.len]);
            debug!("write page {}", page);
            trace!("page {}: {}", page, bytes_to_hex_spaced(&buf));
            transport.write_unit(page, &buf)?;
        }
        Ok(())
    }

    fn apply_protection(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        request: &ProtectRequest,
    ) -> Result<()> {
        if request.mode == ProtectionMode::OpenReadOnly {
            return Err(Error::UnsupportedMode(request.mode));
        }
        check_aligned(request.vaddr, PAGE_SIZE)?;
        check_in_capacity(request.vaddr, 0, self.capacity())?;
        let from_page = self.page_of(request.vaddr);
        self.check_page(from_page)?;

        let mut config = self.read_config(transport, keys, request.previous)?;
        config.apply(request.mode, from_page as u8, &request.key)?;
        debug!(
            "protect from page {} as {} (window {:?})",
            from_page,
            request.mode,
            config.window()
        );
        self.write_config(transport, &config)
    }

    fn read_protection(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<ProtectionConfig> {
        self.read_config(transport, keys, mode)
            .map(ProtectionConfig::Ultralight)
    }

    fn prepare_format(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<()> {
        self.authenticate_for(transport, keys, mode)?;
        // empty message area for NDEF readers
        debug!("write terminator TLV to page {}", FIRST_USER_PAGE);
        transport.write_unit(FIRST_USER_PAGE as u16, &[TERMINATOR_TLV, 0, 0, 0])
    }

    fn read_ultralight_config(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<UltralightConfig> {
        self.read_config(transport, keys, mode)
    }

    fn write_ultralight_config(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        config: &UltralightConfig,
        mode: ProtectionMode,
    ) -> Result<()> {
        self.authenticate_for(transport, keys, mode)?;
        self.write_config(transport, config)
    }
}
