use crate::common::{init_logging, payload};
use proptest::prelude::*;
use tagspace::test_support::{mounted_classic, mounted_ntag};
use tagspace::transport::MockCall;
use tagspace::{CapacityClass, Error, ProtectionMode};

const INHERIT: ProtectionMode = ProtectionMode::Inherit;

#[test]
fn classic_round_trip_across_sectors() {
    init_logging();
    let (_mock, mut s) = mounted_classic().unwrap();
    let data = payload(200);
    s.write(96, &data, INHERIT).unwrap();
    assert_eq!(s.read(96, data.len(), INHERIT).unwrap(), data);
}

#[test]
fn ntag_round_trip_all_classes() {
    for class in [
        CapacityClass::Small,
        CapacityClass::Medium,
        CapacityClass::Large,
    ] {
        let (_mock, mut s) = mounted_ntag(class).unwrap();
        let data = payload(s.capacity() as usize);
        s.write(0, &data, INHERIT).unwrap();
        assert_eq!(s.read(0, data.len(), INHERIT).unwrap(), data, "{}", class);
    }
}

#[test]
fn writing_twice_is_idempotent() {
    let (_mock, mut s) = mounted_classic().unwrap();
    let data = payload(48);
    s.write(48, &data, INHERIT).unwrap();
    let first = s.read(48, 48, INHERIT).unwrap();
    s.write(48, &data, INHERIT).unwrap();
    assert_eq!(s.read(48, 48, INHERIT).unwrap(), first);
}

#[test]
fn classic_boundaries() {
    let (mock, mut s) = mounted_classic().unwrap();
    let cap = s.capacity();
    s.write(cap - 16, &[1u8; 16], INHERIT).unwrap();
    mock.clear_calls();
    assert!(matches!(
        s.write(cap, &[1u8; 16], INHERIT),
        Err(Error::OutOfRange { .. })
    ));
    assert!(matches!(
        s.write(1, &[1u8; 16], INHERIT),
        Err(Error::Misaligned { offset: 1, unit: 16 })
    ));
    assert!(matches!(
        s.write(cap - 16, &[1u8; 17], INHERIT),
        Err(Error::OutOfRange { .. })
    ));
    // rejected before any transport call
    assert!(mock.calls().is_empty());
}

#[test]
fn ntag_boundaries() {
    let (mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
    let cap = s.capacity();
    s.write(cap - 4, &[9u8; 4], INHERIT).unwrap();
    assert_eq!(mock.page(39).unwrap(), [9u8; 4]);
    assert!(matches!(
        s.write(cap, &[9u8; 4], INHERIT),
        Err(Error::OutOfRange { .. })
    ));
    assert!(matches!(
        s.write(2, &[9u8; 4], INHERIT),
        Err(Error::Misaligned { offset: 2, unit: 4 })
    ));
}

#[test]
fn classic_write_never_touches_trailers() {
    let (mock, mut s) = mounted_classic().unwrap();
    let data = payload(s.capacity() as usize);
    s.write(0, &data, INHERIT).unwrap();
    for sector in 1..=15u16 {
        assert_eq!(
            mock.block(sector * 4 + 3).unwrap(),
            tagspace::constants::FACTORY_TRAILER
        );
    }
    assert!(mock.calls().iter().all(|c| match c {
        MockCall::WriteUnit(index, _) => index % 4 != 3,
        _ => true,
    }));
}

#[test]
fn classic_teardown_once_per_call() {
    let (mock, mut s) = mounted_classic().unwrap();
    s.read(0, 144, INHERIT).unwrap();
    assert_eq!(mock.count_calls(|c| *c == MockCall::EndAuthSession), 1);
    mock.clear_calls();
    mock.fail_unit(8);
    assert!(s.read(0, 144, INHERIT).is_err());
    assert_eq!(mock.count_calls(|c| *c == MockCall::EndAuthSession), 1);
}

#[test]
fn failed_write_is_reported() {
    let (mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
    mock.fail_unit(7);
    assert!(matches!(
        s.write(0, &payload(16), INHERIT),
        Err(Error::TransportFailed { unit: 7, .. })
    ));
}

#[test]
fn format_clears_ntag_message_area() {
    let (mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
    s.write(0, &payload(8), INHERIT).unwrap();
    s.format(false).unwrap();
    assert_eq!(mock.page(4).unwrap(), [0xFE, 0, 0, 0]);
    assert_ne!(mock.page(5).unwrap(), [0; 4]);
    s.format(true).unwrap();
    assert_eq!(s.read(0, 8, INHERIT).unwrap(), vec![0u8; 8]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn classic_round_trip_any_aligned_range(block in 0u32..45, len in 1usize..96) {
        let (_mock, mut s) = mounted_classic().unwrap();
        let vaddr = block * 16;
        let len = len.min((s.capacity() - vaddr) as usize);
        let data = payload(len);
        s.write(vaddr, &data, INHERIT).unwrap();
        prop_assert_eq!(s.read(vaddr, len, INHERIT).unwrap(), data);
    }

    #[test]
    fn ntag_round_trip_any_aligned_range(page in 0u32..35, len in 1usize..40) {
        let (_mock, mut s) = mounted_ntag(CapacityClass::Small).unwrap();
        let vaddr = page * 4;
        let len = len.min((s.capacity() - vaddr) as usize);
        let data = payload(len);
        s.write(vaddr, &data, INHERIT).unwrap();
        prop_assert_eq!(s.read(vaddr, len, INHERIT).unwrap(), data);
    }
}
