// tagspace-rs/tagspace/src/transport/traits.rs

use crate::Result;
use crate::types::{AuthKey, KeySlot, Uid};

/// Transport trait abstracts the reader and its radio link away from the
/// layouts. One implementation drives one tag at a time.
pub trait Transport {
    /// One-shot presence check. Selects the tag when one is in the field.
    fn detect_and_select(&mut self) -> Result<bool>;

    /// UID of the selected tag
    fn uid(&self) -> Option<Uid>;

    /// Family type code (SAK) of the selected tag
    fn family_signature(&self) -> Result<u8>;

    /// Read 16 bytes starting at a block (Classic) or page (NTAG) index
    fn read_unit(&mut self, index: u16) -> Result<[u8; 16]>;

    /// Write one unit: 16 bytes on Classic, 4 bytes on NTAG
    fn write_unit(&mut self, index: u16, data: &[u8]) -> Result<()>;

    /// Crypto1 authentication of `block` with the key held in `slot`
    fn authenticate(&mut self, slot: KeySlot, key: &AuthKey, block: u16) -> Result<()>;

    /// NTAG PWD_AUTH. Returns the PACK sent back by the tag.
    fn password_challenge(&mut self, password: [u8; 4]) -> Result<[u8; 2]>;

    /// Drop the Crypto1 session opened by `authenticate`. Transports without
    /// such state keep the default no-op.
    fn end_auth_session(&mut self) -> Result<()> {
        Ok(())
    }

    /// HLTA. The tag has to be re-selected afterwards.
    fn halt(&mut self) -> Result<()>;
}
