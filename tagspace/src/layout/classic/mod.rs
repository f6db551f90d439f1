// tagspace-rs/tagspace/src/layout/classic/mod.rs
//! MIFARE Classic: 48 virtual bytes per sector, one Crypto1 authentication
//! per block, trailer rewritten per sector by `apply_protection`.

use log::{debug, trace};

use crate::address::{PhysicalAddress, trailer_block, translate_block};
use crate::constants::{BLOCK_SIZE, BLOCKS_PER_SECTOR, DATA_BLOCKS_PER_SECTOR, SECTOR_PAYLOAD};
use crate::io::{check_aligned, check_in_capacity, chunks, padded};
use crate::layout::{CardLayout, ProtectRequest, auth_failure, finish};
use crate::protection::{ProtectionConfig, SectorProtection, SectorTrailer};
use crate::session::KeyRing;
use crate::transport::Transport;
use crate::types::{AuthKey, CardFamily, KeySlot, ProtectionMode};
use crate::utils::bytes_to_hex_spaced;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicLayout {
    min_sector: u16,
    max_sector: u16,
}

impl ClassicLayout {
    pub fn new(min_sector: u16, max_sector: u16) -> Self {
        Self {
            min_sector,
            max_sector,
        }
    }

    pub fn min_sector(&self) -> u16 {
        self.min_sector
    }

    pub fn max_sector(&self) -> u16 {
        self.max_sector
    }

    fn out_of_range(&self, unit: u16) -> Error {
        Error::UnitOutOfRange {
            unit,
            min: self.min_sector * BLOCKS_PER_SECTOR,
            max: self.max_sector * BLOCKS_PER_SECTOR + DATA_BLOCKS_PER_SECTOR - 1,
        }
    }

    fn check_sector(&self, sector: u16, unit: u16) -> Result<()> {
        if sector < self.min_sector || sector > self.max_sector {
            return Err(self.out_of_range(unit));
        }
        Ok(())
    }

    /// `(sector, linear block)` holding `vaddr`, inside the usable sectors.
    fn locate(&self, vaddr: u32) -> Result<(u16, u16)> {
        match self.translate(vaddr) {
            PhysicalAddress::Block { sector, linear, .. } => {
                self.check_sector(sector, linear)?;
                Ok((sector, linear))
            }
            other => Err(self.out_of_range(other.unit())),
        }
    }

    /// Authenticate `block` and report a refusal against it.
    fn authenticate(
        &self,
        transport: &mut dyn Transport,
        slot: KeySlot,
        key: &AuthKey,
        block: u16,
    ) -> Result<()> {
        transport
            .authenticate(slot, key, block)
            .map_err(auth_failure(block))
    }

    fn read_blocks(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        vaddr: u32,
        out: &mut Vec<u8>,
        len: usize,
        mode: ProtectionMode,
    ) -> Result<()> {
        let (slot, key) = keys.key_for(mode);
        for chunk in chunks(vaddr, len, BLOCK_SIZE) {
            let (sector, linear) = self.locate(chunk.vaddr)?;
            debug!("read block {} (sector {}) with key {}", linear, sector, slot);
            self.authenticate(transport, slot, key, linear)?;
            let data = transport.read_unit(linear)?;
            trace!("block {}: {}", linear, bytes_to_hex_spaced(&data));
            out.extend_from_slice(&data[..chunk.len]);
        }
        Ok(())
    }

    fn write_blocks(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        vaddr: u32,
        data: &[u8],
        mode: ProtectionMode,
    ) -> Result<()> {
        let (slot, key) = keys.key_for(mode);
        for chunk in chunks(vaddr, data.len(), BLOCK_SIZE) {
            let (sector, linear) = self.locate(chunk.vaddr)?;
            let buf: [u8; BLOCK_SIZE] = padded(&data[chunk.offset..chunk.offset + chunk.len]);
            debug!("write block {} (sector {}) with key {}", linear, sector, slot);
            trace!("block {}: {}", linear, bytes_to_hex_spaced(&buf));
            self.authenticate(transport, slot, key, linear)?;
            transport.write_unit(linear, &buf)?;
        }
        Ok(())
    }

    /// Sectors covered by a sector-aligned virtual range.
    fn sectors(&self, vaddr: u32, len: usize) -> impl Iterator<Item = u16> + '_ {
        let first = vaddr as usize / SECTOR_PAYLOAD;
        let count = len / SECTOR_PAYLOAD;
        (first..first + count).map(move |rel| self.min_sector + rel as u16)
    }

    /// Rewrite the trailers of `sectors`, counting the ones updated.
    fn write_trailers(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        request: &ProtectRequest,
        updated: &mut usize,
    ) -> Result<()> {
        let trailer = SectorTrailer::for_mode(request.mode, keys.key_a, request.key)?.to_bytes();
        let (slot, key) = keys.key_for(request.previous);
        for sector in self.sectors(request.vaddr, request.len) {
            let block = trailer_block(sector);
            self.check_sector(sector, block)?;
            debug!(
                "protect sector {} as {} (trailer {}, key {})",
                sector, request.mode, block, slot
            );
            self.authenticate(transport, slot, key, block)?;
            transport.write_unit(block, &trailer)?;
            *updated += 1;
        }
        Ok(())
    }

    fn read_trailers(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<Vec<SectorProtection>> {
        let (slot, key) = keys.key_for(mode);
        let mut out = Vec::new();
        for sector in self.min_sector..=self.max_sector {
            let block = trailer_block(sector);
            self.authenticate(transport, slot, key, block)?;
            let raw = transport.read_unit(block)?;
            trace!("trailer {}: {}", block, bytes_to_hex_spaced(&raw));
            let trailer = SectorTrailer::parse(&raw)?;
            out.push(SectorProtection::from_trailer(sector, &trailer));
        }
        Ok(out)
    }
}

impl CardLayout for ClassicLayout {
    fn family(&self) -> CardFamily {
        CardFamily::Classic
    }

    fn unit_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn capacity(&self) -> u32 {
        // an inverted range is empty
        let sectors = self.max_sector.saturating_add(1).saturating_sub(self.min_sector);
        sectors as u32 * SECTOR_PAYLOAD as u32
    }

    fn translate(&self, vaddr: u32) -> PhysicalAddress {
        translate_block(vaddr, self.min_sector)
    }

    fn read(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        vaddr: u32,
        len: usize,
        mode: ProtectionMode,
    ) -> Result<Vec<u8>> {
        check_aligned(vaddr, BLOCK_SIZE)?;
        check_in_capacity(vaddr, len, self.capacity())?;
        let mut out = Vec::with_capacity(len);
        let result = self.read_blocks(transport, keys, vaddr, &mut out, len, mode);
        finish(transport, result)?;
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
        check_aligned(vaddr, BLOCK_SIZE)?;
        check_in_capacity(vaddr, data.len(), self.capacity())?;
        let result = self.write_blocks(transport, keys, vaddr, data, mode);
        finish(transport, result)
    }

    fn apply_protection(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        request: &ProtectRequest,
    ) -> Result<()> {
        check_aligned(request.vaddr, SECTOR_PAYLOAD)?;
        if request.len % SECTOR_PAYLOAD != 0 {
            return Err(Error::Misaligned {
                offset: request.vaddr + request.len as u32,
                unit: SECTOR_PAYLOAD,
            });
        }
        check_in_capacity(request.vaddr, request.len, self.capacity())?;
        let total = request.len / SECTOR_PAYLOAD;
        let mut updated = 0usize;
        let result = self.write_trailers(transport, keys, request, &mut updated);
        match finish(transport, result) {
            Ok(()) => Ok(()),
            Err(source) if updated > 0 => Err(Error::PartialFailure {
                updated,
                total,
                source: Box::new(source),
            }),
            Err(err) => Err(err),
        }
    }

    fn read_protection(
        &self,
        transport: &mut dyn Transport,
        keys: &KeyRing,
        mode: ProtectionMode,
    ) -> Result<ProtectionConfig> {
        let result = self.read_trailers(transport, keys, mode);
        finish(transport, result).map(ProtectionConfig::Classic)
    }
}
