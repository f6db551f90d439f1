// tagspace-rs/tagspace/src/io.rs
//! Chunk planning for the I/O engine.
//!
//! A request `[vaddr, vaddr + len)` is cut into unit-sized chunks. Every
//! chunk starts on a unit boundary when `vaddr` does; only the last chunk may
//! be shorter than the unit.

use crate::{Error, Result};

/// One unit-sized slice of a caller's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Virtual address of the first byte of the chunk
    pub vaddr: u32,
    /// Offset of the chunk inside the caller's buffer
    pub offset: usize,
    /// Bytes of the caller's buffer covered by this chunk (1..=unit)
    pub len: usize,
}

impl Chunk {
    /// Virtual address of the last byte covered.
    pub fn last_vaddr(&self) -> u32 {
        self.vaddr + self.len as u32 - 1
    }
}

/// Iterator over the chunks of a request.
#[derive(Debug, Clone)]
pub struct Chunks {
    vaddr: u32,
    offset: usize,
    remaining: usize,
    unit: usize,
}

/// Split `len` bytes starting at `vaddr` into chunks of `unit` bytes.
pub fn chunks(vaddr: u32, len: usize, unit: usize) -> Chunks {
    Chunks {
        vaddr,
        offset: 0,
        remaining: len,
        unit: unit.max(1),
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let len = self.remaining.min(self.unit);
        let chunk = Chunk {
            vaddr: self.vaddr + self.offset as u32,
            offset: self.offset,
            len,
        };
        self.offset += len;
        self.remaining -= len;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(self.unit);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}

/// Copy `src` into a zeroed unit buffer so a short final chunk never carries
/// leftover bytes onto the card.
pub fn padded<const N: usize>(src: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    let n = src.len().min(N);
    buf[..n].copy_from_slice(&src[..n]);
    buf
}

/// Reject offsets that do not sit on a unit boundary.
pub fn check_aligned(vaddr: u32, unit: usize) -> Result<()> {
    if unit == 0 || vaddr as usize % unit != 0 {
        return Err(Error::Misaligned { offset: vaddr, unit });
    }
    Ok(())
}

/// Reject requests that start or end outside `[0, capacity)`.
pub fn check_in_capacity(vaddr: u32, len: usize, capacity: u32) -> Result<()> {
    let end = vaddr as u64 + len as u64;
    if vaddr >= capacity || end > capacity as u64 {
        return Err(Error::OutOfRange {
            offset: vaddr,
            len,
            capacity,
        });
    }
    Ok(())
}
