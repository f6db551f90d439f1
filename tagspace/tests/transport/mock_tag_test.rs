use crate::common::{capability_page, protected_ntag_config, sample_key};
use tagspace::transport::{MockCall, MockTransport, Transport};
use tagspace::{AuthKey, CapacityClass, Error, KeySlot};

fn select(mock: &MockTransport) -> Box<dyn Transport> {
    let mut t: Box<dyn Transport> = Box::new(mock.clone());
    assert!(t.detect_and_select().unwrap());
    t
}

#[test]
fn boxed_mock_shares_the_tag() {
    let mock = MockTransport::classic_1k();
    let mut t = select(&mock);
    t.authenticate(KeySlot::A, &AuthKey::FACTORY, 8).unwrap();
    t.write_unit(8, &[0x5A; 16]).unwrap();
    assert_eq!(mock.block(8).unwrap(), [0x5A; 16]);
    assert_eq!(
        mock.calls(),
        vec![
            MockCall::DetectAndSelect,
            MockCall::Authenticate {
                slot: KeySlot::A,
                block: 8
            },
            MockCall::WriteUnit(8, vec![0x5A; 16]),
        ]
    );
}

#[test]
fn classic_auth_is_per_sector() {
    let mock = MockTransport::classic_1k();
    let mut t = select(&mock);
    t.authenticate(KeySlot::A, &AuthKey::FACTORY, 4).unwrap();
    assert!(t.read_unit(8).is_err());
    assert!(matches!(
        t.authenticate(KeySlot::A, &sample_key(), 8),
        Err(Error::AuthenticationFailed { unit: 8 })
    ));
    t.end_auth_session().unwrap();
    assert!(t.read_unit(4).is_err());
}

#[test]
fn halt_deselects() {
    let mock = MockTransport::classic_1k();
    let mut t = select(&mock);
    t.halt().unwrap();
    assert!(t.uid().is_none());
    assert!(t.family_signature().is_err());
    assert!(t.read_unit(4).is_err());
}

#[test]
fn ntag_capability_container_is_on_page_three() {
    for class in [CapacityClass::Small, CapacityClass::Large] {
        let mock = MockTransport::ntag(class);
        let mut t = select(&mock);
        let raw = t.read_unit(0).unwrap();
        assert_eq!(&raw[12..], &capability_page(class.capability()));
    }
}

#[test]
fn ntag_password_challenge_returns_pack() {
    let mock = MockTransport::ntag(CapacityClass::Small);
    for (i, page) in protected_ntag_config().iter().enumerate() {
        mock.set_page(41 + i as u16, *page);
    }
    let mut t = select(&mock);
    assert!(matches!(
        t.read_unit(5),
        Err(Error::TransportFailed { unit: 5, .. })
    ));
    assert!(t.password_challenge([0xFF; 4]).is_err());
    assert!(!mock.is_password_authenticated());
    assert_eq!(
        t.password_challenge(sample_key().password()).unwrap(),
        sample_key().pack()
    );
    assert!(t.read_unit(5).is_ok());
    // PWD and PACK never read back
    let cfg = t.read_unit(41).unwrap();
    assert_eq!(&cfg[8..], &[0u8; 8]);
}

#[test]
fn removed_card_is_not_detected() {
    let mock = MockTransport::ntag(CapacityClass::Small);
    mock.remove_card();
    let mut t: Box<dyn Transport> = Box::new(mock.clone());
    assert!(!t.detect_and_select().unwrap());
    mock.insert_card();
    assert!(t.detect_and_select().unwrap());
    assert_eq!(t.uid().unwrap().as_bytes().len(), 7);
}
