use crate::common::{capability_page, init_logging, protected_ntag_config, sample_key};
use tagspace::test_support::session_over;
use tagspace::transport::MockCall;
use tagspace::utils::ms;
use tagspace::{CapacityClass, CardFamily, Error, MockTransport, ProtectionMode, SessionState};

#[test]
fn medium_ntag_from_capability_byte() {
    init_logging();
    let mock = MockTransport::ntag(CapacityClass::Small);
    // the memory is small but the capability byte says medium
    mock.set_page(3, capability_page(0x3E));
    let mut s = session_over(&mock).unwrap();
    s.mount(ProtectionMode::Inherit).unwrap();
    assert_eq!(s.capacity_class(), CapacityClass::Medium);
    assert_eq!(CapacityClass::Medium.max_page(), 129);
    assert_eq!(CapacityClass::Medium.config_page(), 131);
    assert_eq!(s.capacity(), (129 - 5 + 1) * 4);
}

#[test]
fn unknown_capability_leaves_session_unmounted() {
    let mock = MockTransport::ntag(CapacityClass::Small);
    mock.set_page(3, capability_page(0x99));
    let mut s = session_over(&mock).unwrap();
    assert!(matches!(
        s.mount(ProtectionMode::Inherit),
        Err(Error::UnknownCapacity { capability: 0x99 })
    ));
    assert_eq!(s.state(), SessionState::Unmounted);
    assert_eq!(s.capacity(), 0);
}

#[test]
fn protected_ntag_mounts_with_known_password() {
    init_logging();
    let mock = MockTransport::ntag(CapacityClass::Small);
    for (i, page) in protected_ntag_config().into_iter().enumerate() {
        mock.set_page(41 + i as u16, page);
    }
    let mut s = tagspace::Session::builder()
        .with_transport(Box::new(mock.clone()))
        .poll_interval(ms(1))
        .key_b(sample_key())
        .build()
        .unwrap();
    s.mount(ProtectionMode::PasswordReadWrite).unwrap();
    assert!(s.is_ultralight());
    assert_eq!(s.active_mode(), ProtectionMode::PasswordReadWrite);
    assert!(mock.calls().contains(&MockCall::PasswordChallenge([0xA0, 0xA1, 0xA2, 0xA3])));
    assert!(mock.is_password_authenticated());

    // unmount halts, which drops the password session on the tag
    s.unmount();
    assert!(!mock.is_password_authenticated());
}

#[test]
fn mount_waits_for_late_card() {
    let mock = MockTransport::classic_1k();
    mock.set_poll_misses(3);
    let mut s = session_over(&mock).unwrap();
    s.mount(ProtectionMode::Inherit).unwrap();
    assert_eq!(s.family(), CardFamily::Classic);
    assert_eq!(
        mock.count_calls(|c| *c == MockCall::DetectAndSelect),
        4
    );
}

#[test]
fn mount_with_timeout_gives_up() {
    let mock = MockTransport::classic_1k();
    mock.remove_card();
    let mut s = session_over(&mock).unwrap();
    assert!(matches!(
        s.mount_with_timeout(ms(5), ProtectionMode::Inherit),
        Err(Error::Timeout)
    ));
    assert!(!s.is_mounted());
}

#[test]
fn card_info_snapshot() {
    let mock = MockTransport::ntag(CapacityClass::Large);
    let mut s = session_over(&mock).unwrap();
    s.mount(ProtectionMode::Inherit).unwrap();
    let info = s.card_info().unwrap();
    assert_eq!(info.family, CardFamily::Ultralight);
    assert_eq!(info.capacity_class, CapacityClass::Large);
    assert_eq!(info.capacity, (225 - 5 + 1) * 4);
    assert_eq!(info.uid_string(), "04:11:22:33:44:55:66");
    assert_eq!(info.active_mode, ProtectionMode::OpenReadWrite);
}

#[test]
fn reset_authentication_remounts() {
    let mock = MockTransport::ntag(CapacityClass::Small);
    let mut s = session_over(&mock).unwrap();
    s.mount(ProtectionMode::Inherit).unwrap();
    mock.clear_calls();
    s.reset_authentication(ProtectionMode::Inherit).unwrap();
    let calls = mock.calls();
    assert_eq!(calls[0], MockCall::Halt);
    assert!(calls.contains(&MockCall::DetectAndSelect));
    assert!(s.is_mounted());
}
