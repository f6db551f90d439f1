// tagspace-rs/tagspace/src/constants.rs
//! Physical layout constants shared by the address translator, the layouts
//! and the simulated tag.

/// MIFARE Classic block size and the common 16-byte read unit
pub const BLOCK_SIZE: usize = 16;

/// Blocks per Classic sector (3 data blocks + trailer)
pub const BLOCKS_PER_SECTOR: u16 = 4;

/// Data blocks per Classic sector
pub const DATA_BLOCKS_PER_SECTOR: u16 = 3;

/// Virtual bytes exposed by one Classic sector
pub const SECTOR_PAYLOAD: usize = 48;

/// Index of the trailer block within a sector
pub const TRAILER_BLOCK: u16 = 3;

/// Highest sector index of a Classic 1K
pub const MAX_SECTOR: u16 = 15;

/// NTAG page size
pub const PAGE_SIZE: usize = 4;

/// Highest page index addressable by the READ/WRITE commands
pub const MAX_PAGE_INDEX: u16 = 255;

/// First NTAG user memory page (the capability container is page 3)
pub const FIRST_USER_PAGE: u8 = 4;

/// Page holding the capability container
pub const CAPABILITY_PAGE: u8 = 3;

/// Magic number opening the capability container
pub const CAPABILITY_MAGIC: u8 = 0xE1;

/// AUTH0 value meaning "no page requires the password"
pub const AUTH0_DISABLED: u8 = 0xFF;

/// Terminator TLV written to the first user page by `format`
pub const TERMINATOR_TLV: u8 = 0xFE;

/// SAK reported by a Classic 1K
pub const SAK_CLASSIC_1K: u8 = 0x08;

/// SAK reported by a Classic 4K
pub const SAK_CLASSIC_4K: u8 = 0x18;

/// SAK reported by Ultralight/NTAG
pub const SAK_ULTRALIGHT: u8 = 0x00;

/// Factory sector trailer: KeyA FF.., access bits FF 07 80, GPB 69, KeyB FF..
pub const FACTORY_TRAILER: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x80, 0x69, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Factory NTAG21x configuration record (CFG0, CFG1, PWD, PACK)
pub const FACTORY_ULTRALIGHT_CONFIG: [u8; 16] = [
    0x04, 0x00, 0x00, 0xFF, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
