// fixtures.rs — provides commonly used keys, payloads and raw tag records

use tagspace::protection::SectorTrailer;
use tagspace::{AuthKey, ProtectionMode};

pub fn sample_key() -> AuthKey {
    AuthKey::from_bytes([0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5])
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// Trailer of a sector left in `PasswordReadOnly` by `sample_key`.
pub fn password_read_only_trailer() -> [u8; 16] {
    SectorTrailer::for_mode(ProtectionMode::PasswordReadOnly, AuthKey::FACTORY, sample_key())
        .unwrap()
        .to_bytes()
}

/// Config pages of an NTAG protected from page 5 by `sample_key`.
pub fn protected_ntag_config() -> [[u8; 4]; 4] {
    let raw = hex::decode("04000005 80050000 a0a1a2a3 a4a50000".replace(' ', "")).unwrap();
    [
        [raw[0], raw[1], raw[2], raw[3]],
        [raw[4], raw[5], raw[6], raw[7]],
        [raw[8], raw[9], raw[10], raw[11]],
        [raw[12], raw[13], raw[14], raw[15]],
    ]
}

/// Capability container page for a capability byte.
pub fn capability_page(capability: u8) -> [u8; 4] {
    let raw = hex::decode(format!("e110{:02x}00", capability)).unwrap();
    [raw[0], raw[1], raw[2], raw[3]]
}
