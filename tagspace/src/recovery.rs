// tagspace-rs/tagspace/src/recovery.rs
//! Emergency repair and raw dumps.
//!
//! These bypass mode validation and write factory records with an explicit
//! credential. Normal code never needs them.

use log::{debug, warn};

use crate::address::trailer_block;
use crate::constants::{BLOCKS_PER_SECTOR, FACTORY_TRAILER, MAX_SECTOR, TRAILER_BLOCK};
use crate::layout::{auth_failure, finish, password_auth};
use crate::protection::UltralightConfig;
use crate::session::Session;
use crate::transport::Transport;
use crate::types::{AuthKey, BlockData, CardFamily, KeySlot, ProtectionMode};
use crate::{Error, Result};

impl Session {
    fn require_family(&self, family: CardFamily) -> Result<()> {
        if !self.is_mounted() {
            return Err(Error::NotMounted);
        }
        if self.family() != family {
            return Err(Error::UnsupportedOperation(format!(
                "{} repair on a {} card",
                family,
                self.family()
            )));
        }
        Ok(())
    }

    /// Write the factory trailer to `sector` (1..=15), authenticating with
    /// `key` in `slot`. Sector 0 is never touched.
    pub fn repair_sector_trailer(
        &mut self,
        sector: u16,
        key: &AuthKey,
        slot: KeySlot,
    ) -> Result<()> {
        self.require_family(CardFamily::Classic)?;
        let block = trailer_block(sector);
        if sector == 0 || sector > MAX_SECTOR {
            return Err(Error::UnitOutOfRange {
                unit: block,
                min: trailer_block(1),
                max: trailer_block(MAX_SECTOR),
            });
        }
        warn!("rewriting factory trailer of sector {} with key {}", sector, slot);
        let transport = &mut *self.transport;
        let result = transport
            .authenticate(slot, key, block)
            .map_err(auth_failure(block))
            .and_then(|()| transport.write_unit(block, &FACTORY_TRAILER));
        finish(transport, result)
    }

    /// Write the factory configuration record (no password window).
    ///
    /// With `key`, that password is used for this call only in place of the
    /// session KeyB when `previous` is password gated.
    pub fn repair_ultralight_config(
        &mut self,
        key: Option<AuthKey>,
        previous: ProtectionMode,
    ) -> Result<()> {
        self.require_family(CardFamily::Ultralight)?;
        let previous = previous.resolve(self.active_mode);
        let config_page = self.capacity_class().config_page() as u16;
        warn!("rewriting factory configuration at page {}", config_page);
        let transport = &mut *self.transport;
        if previous.is_password_gated() {
            password_auth(
                transport,
                key.as_ref().unwrap_or(&self.config.keys.key_b),
                config_page + 2,
            )?;
        }
        let record = UltralightConfig::factory();
        for (page, data) in (config_page..).zip(record.pages()) {
            transport.write_unit(page, data)?;
        }
        self.active_mode = ProtectionMode::OpenReadWrite;
        Ok(())
    }

    /// Every physical unit readable under `mode`, in order.
    ///
    /// Classic dumps read the usable data blocks with `mode`'s key and
    /// everything else with KeyA; NTAG dumps read four pages at a time.
    /// The dump stops at the first refused unit.
    pub fn raw_dump(&mut self, mode: ProtectionMode) -> Result<Vec<(u16, BlockData)>> {
        let mode = mode.resolve(self.active_mode);
        match self.family() {
            CardFamily::Classic => self.dump_classic(mode),
            CardFamily::Ultralight => self.dump_ultralight(mode),
            CardFamily::Unknown => Err(Error::NotMounted),
        }
    }

    fn dump_classic(&mut self, mode: ProtectionMode) -> Result<Vec<(u16, BlockData)>> {
        let keys = self.config.keys;
        let (min, max) = (self.config.min_sector, self.config.max_sector);
        let transport = &mut *self.transport;
        let mut out = Vec::new();
        'sectors: for sector in 0..=MAX_SECTOR {
            for offset in 0..BLOCKS_PER_SECTOR {
                let block = sector * BLOCKS_PER_SECTOR + offset;
                let in_range = (min..=max).contains(&sector) && offset != TRAILER_BLOCK;
                let (slot, key) = if in_range {
                    keys.key_for(mode)
                } else {
                    (KeySlot::A, &keys.key_a)
                };
                let data = transport
                    .authenticate(slot, key, block)
                    .and_then(|()| transport.read_unit(block));
                match data {
                    Ok(bytes) => out.push((block, BlockData::from_bytes(bytes))),
                    Err(err) => {
                        debug!("dump stopped at block {}: {}", block, err);
                        break 'sectors;
                    }
                }
            }
        }
        finish(transport, Ok(out))
    }

    fn dump_ultralight(&mut self, mode: ProtectionMode) -> Result<Vec<(u16, BlockData)>> {
        let class = self.capacity_class();
        let total = class.total_pages();
        let transport: &mut dyn Transport = &mut *self.transport;
        if mode.is_password_gated() {
            let pwd_page = class.config_page() as u16 + 2;
            password_auth(transport, &self.config.keys.key_b, pwd_page)?;
        }
        let mut out = Vec::new();
        for page in (0..total).step_by(4) {
            match transport.read_unit(page) {
                Ok(bytes) => out.push((page, BlockData::from_bytes(bytes))),
                Err(err) => {
                    debug!("dump stopped at page {}: {}", page, err);
                    break;
                }
            }
        }
        Ok(out)
    }
}
