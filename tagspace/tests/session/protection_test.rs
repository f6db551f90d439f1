use crate::common::{init_logging, password_read_only_trailer, payload, sample_key};
use tagspace::protection::{ProtectionConfig, ProtectionWindow};
use tagspace::test_support::{mounted_classic, mounted_ntag};
use tagspace::transport::MockCall;
use tagspace::{CapacityClass, Error, ProtectionMode};

use ProtectionMode::*;

#[test]
fn classic_password_read_only_scenario() {
    init_logging();
    let (mock, mut s) = mounted_classic().unwrap();
    s.write(0, &payload(48), Inherit).unwrap();

    s.apply_protection(PasswordReadOnly, Some(sample_key()), 0, 720)
        .unwrap();
    assert_eq!(s.active_mode(), PasswordReadOnly);
    assert_eq!(*s.auth_key(), sample_key());
    for sector in 1..=15u16 {
        assert_eq!(
            mock.block(sector * 4 + 3).unwrap(),
            password_read_only_trailer()
        );
    }

    // the open credential no longer opens the data blocks
    assert!(matches!(
        s.write(0, &[1u8; 16], OpenReadWrite),
        Err(Error::AuthenticationFailed { unit: 4 })
    ));
    // KeyB authenticates but the block is read only
    assert!(matches!(
        s.write(0, &[1u8; 16], Inherit),
        Err(Error::TransportFailed { unit: 4, .. })
    ));
    assert_eq!(s.read(0, 48, Inherit).unwrap(), payload(48));
}

#[test]
fn classic_protection_can_be_reverted() {
    let (_mock, mut s) = mounted_classic().unwrap();
    s.apply_protection(PasswordReadWrite, Some(sample_key()), 48, 96)
        .unwrap();
    s.write(48, &[7u8; 16], Inherit).unwrap();

    s.apply_protection(OpenReadWrite, None, 48, 96).unwrap();
    assert_eq!(s.active_mode(), OpenReadWrite);
    s.write(48, &[8u8; 16], Inherit).unwrap();
    assert_eq!(s.read(48, 16, Inherit).unwrap(), vec![8u8; 16]);
}

#[test]
fn classic_protection_requires_whole_sectors() {
    let (mock, mut s) = mounted_classic().unwrap();
    assert!(matches!(
        s.apply_protection(PasswordReadWrite, None, 16, 48),
        Err(Error::Misaligned { offset: 16, .. })
    ));
    assert!(matches!(
        s.apply_protection(PasswordReadWrite, None, 0, 40),
        Err(Error::Misaligned { .. })
    ));
    assert!(matches!(
        s.apply_protection(PasswordReadWrite, None, 0, 768),
        Err(Error::OutOfRange { .. })
    ));
    assert!(mock.calls().is_empty());
    assert_eq!(s.active_mode(), OpenReadWrite);
}

#[test]
fn classic_partial_failure_reports_progress() {
    let (mock, mut s) = mounted_classic().unwrap();
    mock.fail_unit(15);
    match s.apply_protection(PasswordReadWrite, Some(sample_key()), 0, 720) {
        Err(Error::PartialFailure {
            updated,
            total,
            source,
        }) => {
            assert_eq!((updated, total), (2, 15));
            assert!(matches!(*source, Error::TransportFailed { unit: 15, .. }));
        }
        other => panic!("unexpected: {:?}", other),
    }
    // sectors already rewritten stay rewritten
    assert_ne!(mock.block(7).unwrap(), tagspace::constants::FACTORY_TRAILER);
    assert_eq!(mock.block(15).unwrap(), tagspace::constants::FACTORY_TRAILER);
    assert_eq!(s.active_mode(), OpenReadWrite);
    assert_eq!(mock.count_calls(|c| *c == MockCall::EndAuthSession), 1);
}

#[test]
fn classic_protection_config_is_decoded() {
    let (_mock, mut s) = mounted_classic().unwrap();
    s.apply_protection(OpenReadOnly, None, 96, 48).unwrap();

    let ProtectionConfig::Classic(sectors) = s.read_protection_config(OpenReadWrite).unwrap()
    else {
        panic!("expected classic config");
    };
    assert_eq!(sectors.len(), 15);
    assert_eq!(sectors[2].sector, 3);
    assert_eq!(sectors[2].mode, Some(OpenReadOnly));
    assert_eq!(sectors[2].access_bytes, [0x8F, 0x07, 0x87]);
    assert!(sectors
        .iter()
        .filter(|p| p.sector != 3)
        .all(|p| p.mode == Some(OpenReadWrite) && p.access_bytes == [0xFF, 0x07, 0x80]));
}

#[test]
fn ntag_rejects_open_read_only() {
    let (mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
    assert!(matches!(
        s.apply_protection(OpenReadOnly, None, 0, 0),
        Err(Error::UnsupportedMode(OpenReadOnly))
    ));
    assert_eq!(s.active_mode(), OpenReadWrite);
    assert!(mock.calls().is_empty());
}

#[test]
fn ntag_password_protection_applies_after_reselect() {
    init_logging();
    let (mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
    s.write(8, &payload(8), Inherit).unwrap();
    s.apply_protection(PasswordReadWrite, Some(sample_key()), 8, 0)
        .unwrap();
    assert_eq!(mock.page(41).unwrap(), [0x04, 0x00, 0x00, 0x07]);
    assert_eq!(mock.page(42).unwrap()[0] & 0x80, 0x80);
    assert_eq!(mock.page(43).unwrap(), sample_key().password());

    s.unmount();
    s.mount(OpenReadWrite).unwrap();
    // pages before the window stay open
    assert_eq!(s.read(0, 4, OpenReadWrite).unwrap(), vec![0u8; 4]);
    assert!(matches!(
        s.read(8, 8, OpenReadWrite),
        Err(Error::TransportFailed { unit: 7, .. })
    ));
    assert_eq!(s.read(8, 8, PasswordReadWrite).unwrap(), payload(8));
    assert!(mock.is_password_authenticated());

    let ProtectionConfig::Ultralight(config) = s.read_protection_config(PasswordReadWrite).unwrap()
    else {
        panic!("expected ultralight config");
    };
    assert_eq!(config.window(), ProtectionWindow::Protected { from_page: 7 });
    // PWD and PACK are never readable
    assert_eq!(config.password(), [0u8; 4]);
}

#[test]
fn ntag_read_only_mode_gates_reads_too() {
    let (_mock, mut s) = mounted_ntag(CapacityClass::Medium).unwrap();
    s.write(0, &payload(4), Inherit).unwrap();
    s.apply_protection(PasswordReadOnly, Some(sample_key()), 0, 0)
        .unwrap();
    s.unmount();
    s.mount(OpenReadWrite).unwrap();
    assert!(matches!(
        s.read(0, 4, Inherit),
        Err(Error::TransportFailed { unit: 5, .. })
    ));
    assert_eq!(s.read(0, 4, PasswordReadOnly).unwrap(), payload(4));
}

#[test]
fn ntag_protection_can_be_reverted() {
    let (mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
    s.write(0, &payload(8), Inherit).unwrap();
    s.apply_protection(PasswordReadWrite, Some(sample_key()), 0, 0)
        .unwrap();
    s.unmount();
    s.mount(PasswordReadWrite).unwrap();
    mock.clear_calls();

    s.apply_protection(OpenReadWrite, None, 0, 0).unwrap();
    assert!(mock
        .calls()
        .contains(&MockCall::PasswordChallenge(sample_key().password())));
    assert_eq!(mock.page(41).unwrap()[3], 0xFF);
    assert_eq!(mock.page(42).unwrap()[0] & 0x80, 0);
    assert_eq!(s.active_mode(), OpenReadWrite);

    s.unmount();
    s.mount(OpenReadWrite).unwrap();
    assert_eq!(s.read(0, 8, OpenReadWrite).unwrap(), payload(8));
    s.write(0, &[3u8; 4], OpenReadWrite).unwrap();
}

#[test]
fn ntag_partial_config_write_is_reported() {
    let (mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
    mock.fail_unit(44);
    let key = tagspace::AuthKey::from_bytes([1, 2, 3, 4, 5, 6]);
    assert!(matches!(
        s.apply_protection(PasswordReadWrite, Some(key), 0, 0),
        Err(Error::PartialFailure {
            updated: 3,
            total: 4,
            ..
        })
    ));
    assert_eq!(mock.page(43).unwrap(), [1, 2, 3, 4]);
    assert_eq!(s.active_mode(), OpenReadWrite);
}
