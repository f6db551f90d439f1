// tagspace-rs/tagspace/src/address.rs
//! Virtual-to-physical address translation.
//!
//! Pure arithmetic, no I/O. Callers range-check the virtual offset against
//! the mounted capacity first; the functions here never fail.

use crate::constants::{
    BLOCK_SIZE, BLOCKS_PER_SECTOR, MAX_PAGE_INDEX, PAGE_SIZE, SECTOR_PAYLOAD, TRAILER_BLOCK,
};

/// Physical location of a virtual byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalAddress {
    /// Classic data block
    Block {
        sector: u16,
        /// 0..=2, the trailer is never produced
        block: u16,
        /// `sector * 4 + block`
        linear: u16,
    },
    /// NTAG page
    Page { page: u16 },
}

impl PhysicalAddress {
    /// Linear block or page index handed to the transport.
    pub fn unit(&self) -> u16 {
        match *self {
            Self::Block { linear, .. } => linear,
            Self::Page { page } => page,
        }
    }
}

/// Classic: 48 usable bytes per sector, 16 per block.
pub fn translate_block(vaddr: u32, min_sector: u16) -> PhysicalAddress {
    let rel_sector = vaddr / SECTOR_PAYLOAD as u32;
    let block = ((vaddr % SECTOR_PAYLOAD as u32) / BLOCK_SIZE as u32) as u16;
    let sector = u16::try_from(rel_sector)
        .unwrap_or(u16::MAX)
        .saturating_add(min_sector);
    PhysicalAddress::Block {
        sector,
        block,
        linear: sector.saturating_mul(BLOCKS_PER_SECTOR).saturating_add(block),
    }
}

/// NTAG: 4 bytes per page, clamped to the highest addressable page.
pub fn translate_page(vaddr: u32, min_page: u16) -> PhysicalAddress {
    let page = (vaddr / PAGE_SIZE as u32).saturating_add(min_page as u32);
    PhysicalAddress::Page {
        page: page.min(MAX_PAGE_INDEX as u32) as u16,
    }
}

/// Trailer block of `sector`.
pub fn trailer_block(sector: u16) -> u16 {
    sector * BLOCKS_PER_SECTOR + TRAILER_BLOCK
}

/// Inverse of [`translate_block`]: first virtual byte of a data block.
/// Sectors below `min_sector` clamp to 0.
pub fn block_to_vaddr(sector: u16, block: u16, min_sector: u16) -> u32 {
    let rel = sector.saturating_sub(min_sector) as u32;
    rel * SECTOR_PAYLOAD as u32 + block as u32 * BLOCK_SIZE as u32
}

/// Inverse of [`translate_page`]: first virtual byte of a page.
pub fn page_to_vaddr(page: u16, min_page: u16) -> u32 {
    page.saturating_sub(min_page) as u32 * PAGE_SIZE as u32
}
