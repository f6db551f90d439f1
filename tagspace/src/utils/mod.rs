//! Small helpers shared across the crate: hex formatting for logs and UIDs,
//! and the deadline used by the card-presence wait.

pub mod hex;
pub mod timeout;

pub use hex::*;
pub use timeout::*;
