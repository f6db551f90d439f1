// Shared helpers for the integration test aggregators.
#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;

/// Install env_logger once so `RUST_LOG=tagspace=trace` shows unit traffic.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
