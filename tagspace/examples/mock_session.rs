// Walk through a session against the simulated tags: mount, write, protect,
// and read back with and without the password.
//
//   RUST_LOG=debug cargo run --example mock_session -- a0a1a2a3a4a5

use std::convert::TryFrom;

use anyhow::{Context, anyhow};
use tagspace::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let key_hex = std::env::args().nth(1).unwrap_or_else(|| "a0a1a2a3a4a5".into());
    let key = parse_hex(&key_hex)
        .map_err(|e| anyhow!(e))
        .and_then(|b| AuthKey::try_from(&b[..]).context("key must be 6 bytes"))?;

    println!("=== MIFARE Classic 1K ===");
    let mut session = Session::builder()
        .with_transport(Box::new(MockTransport::classic_1k()))
        .card_wait(ms(500))
        .build()?;
    session.mount(ProtectionMode::Inherit)?;
    print_info(&session);

    session.write(0, b"hello, sector one", ProtectionMode::Inherit)?;
    session.apply_protection(ProtectionMode::PasswordReadOnly, Some(key), 0, 48)?;
    match session.write(0, b"overwrite", ProtectionMode::OpenReadWrite) {
        Ok(()) => println!("unexpected: open write succeeded"),
        Err(e) => println!("open write refused: {}", e),
    }
    let back = session.read(0, 17, ProtectionMode::Inherit)?;
    println!("read with KeyB: {:?}", String::from_utf8_lossy(&back));

    if let ProtectionConfig::Classic(sectors) =
        session.read_protection_config(ProtectionMode::OpenReadWrite)?
    {
        for s in sectors.iter().take(3) {
            println!(
                "  sector {:2}: access {} mode {:?}",
                s.sector,
                bytes_to_hex_spaced(&s.access_bytes),
                s.mode
            );
        }
    }
    session.unmount();

    println!("\n=== NTAG215 ===");
    let mut session = Session::builder()
        .with_transport(Box::new(MockTransport::ntag(CapacityClass::Medium)))
        .card_wait(ms(500))
        .build()?;
    session.mount(ProtectionMode::Inherit)?;
    print_info(&session);

    session.write(0, b"ndef-ish payload", ProtectionMode::Inherit)?;
    session.apply_protection(ProtectionMode::PasswordReadWrite, Some(key), 0, 0)?;
    session.unmount();
    session.mount(ProtectionMode::OpenReadWrite)?;
    match session.read(0, 16, ProtectionMode::OpenReadWrite) {
        Ok(_) => println!("unexpected: open read succeeded"),
        Err(e) => println!("open read refused: {}", e),
    }
    let back = session.read(0, 16, ProtectionMode::PasswordReadWrite)?;
    println!("read with password: {:?}", String::from_utf8_lossy(&back));

    let config = session.read_ultralight_config(ProtectionMode::PasswordReadWrite)?;
    println!("config window: {:?}", config.window());
    Ok(())
}

fn print_info(session: &Session) {
    if let Some(info) = session.card_info() {
        println!(
            "{} card, class {}, {} bytes, uid {}",
            info.family,
            info.capacity_class,
            info.capacity,
            info.uid_string()
        );
    }
}
