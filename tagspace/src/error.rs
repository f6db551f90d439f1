// tagspace-rs/tagspace/src/error.rs

use thiserror::Error;

use crate::types::ProtectionMode;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("no card mounted")]
    NotMounted,

    #[error("unsupported card family: signature={signature:#04x}")]
    UnsupportedFamily { signature: u8 },

    #[error("unknown capacity class: capability byte={capability:#04x}")]
    UnknownCapacity { capability: u8 },

    #[error("misaligned access: offset {offset} is not a multiple of {unit}")]
    Misaligned { offset: u32, unit: usize },

    #[error("out of range: offset {offset} + {len} bytes exceeds capacity {capacity}")]
    OutOfRange { offset: u32, len: usize, capacity: u32 },

    #[error("physical unit {unit} outside usable range {min}..={max}")]
    UnitOutOfRange { unit: u16, min: u16, max: u16 },

    #[error("authentication failed at unit {unit}")]
    AuthenticationFailed { unit: u16 },

    #[error("password acknowledgement mismatch: expected {expected:02x?}, got {actual:02x?}")]
    PackMismatch { expected: [u8; 2], actual: [u8; 2] },

    #[error("transport failed at unit {unit}: {reason}")]
    TransportFailed { unit: u16, reason: String },

    #[error("protection mode {0} is not supported by this card")]
    UnsupportedMode(ProtectionMode),

    #[error("partial failure: {updated} of {total} units updated")]
    PartialFailure {
        updated: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid access bits: {0:02x?}")]
    InvalidAccessBits([u8; 3]),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("operation timed out")]
    Timeout,

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl Error {
    /// Shorthand for a rejected raw read/write on `unit`.
    pub fn transport(unit: impl Into<u16>, reason: impl Into<String>) -> Self {
        Error::TransportFailed {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
