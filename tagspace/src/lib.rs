// tagspace-rs/tagspace/src/lib.rs

//! tagspace
//!
//! A contiguous virtual address space over MIFARE Classic and NTAG21x tags,
//! with per-range open/password and read-write/read-only protection encoded
//! in each family's native on-card layout.
//!
//! The radio link is abstracted behind [`Transport`]; [`MockTransport`]
//! simulates both tag families for tests and demos.

pub mod address;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod prelude;
pub mod protection;
#[cfg(feature = "recovery")]
pub mod recovery;
pub mod session;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the newtypes in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
