use super::*;

#[test]
fn fnv_is_stable_for_same_input() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"sticker");
    a.write_u64(7);
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"sticker");
    b.write_u64(7);
    assert_eq!(a.finish(), b.finish());
    assert_ne!(a.finish(), Fnv1a64::new_default().finish());
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
}

#[test]
fn wrap_degrees_is_modulo_360() {
    assert_eq!(wrap_degrees(370.0), 10.0);
    assert_eq!(wrap_degrees(-10.0), 350.0);
    assert_eq!(wrap_degrees(360.0), 0.0);
    assert_eq!(wrap_degrees(f64::NAN), 0.0);
    assert!(wrap_degrees(-1e-18) < 360.0);
}

#[test]
fn clamp01_handles_nan() {
    assert_eq!(clamp01(-0.5), 0.0);
    assert_eq!(clamp01(1.5), 1.0);
    assert_eq!(clamp01(f64::NAN), 0.0);
}
