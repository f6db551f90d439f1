//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize the MockTransport + Session setup so tests
//! across the crate and the tests/ directory share the same fast polling
//! configuration.
#![allow(dead_code)]

use crate::session::Session;
use crate::transport::MockTransport;
use crate::types::{CapacityClass, ProtectionMode};
use crate::utils::ms;
use crate::Result;

/// Unmounted session over a clone of `mock`, polling every millisecond and
/// giving up after 50 ms.
#[doc(hidden)]
pub fn session_over(mock: &MockTransport) -> Result<Session> {
    Session::builder()
        .with_transport(Box::new(mock.clone()))
        .poll_interval(ms(1))
        .card_wait(ms(50))
        .build()
}

/// Fresh Classic 1K, mounted with the default open mode. The returned mock
/// shares the tag with the session.
#[doc(hidden)]
pub fn mounted_classic() -> Result<(MockTransport, Session)> {
    let mock = MockTransport::classic_1k();
    let mut session = session_over(&mock)?;
    session.mount(ProtectionMode::Inherit)?;
    mock.clear_calls();
    Ok((mock, session))
}

/// Fresh NTAG of `class`, mounted with the default open mode.
#[doc(hidden)]
pub fn mounted_ntag(class: CapacityClass) -> Result<(MockTransport, Session)> {
    let mock = MockTransport::ntag(class);
    let mut session = session_over(&mock)?;
    session.mount(ProtectionMode::Inherit)?;
    mock.clear_calls();
    Ok((mock, session))
}
