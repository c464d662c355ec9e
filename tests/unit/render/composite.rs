use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn opaque_source_replaces_destination() {
    assert_eq!(over([9, 9, 9, 255], [10, 20, 30, 255], 1.0), [10, 20, 30, 255]);
}

#[test]
fn half_opacity_blends() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert!((126..=129).contains(&out[0]));
    assert_eq!(out[3], 255);
}

#[test]
fn length_mismatch_is_an_error() {
    let mut dst = [0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}

#[test]
fn clipped_composite_leaves_outside_pixels() {
    // 2x2 surface, clip to the right column.
    let mut dst = vec![0u8; 16];
    let src = vec![255u8; 16];
    over_in_place_clipped(&mut dst, &src, 2, Rect::new(1.0, 0.0, 2.0, 2.0), 1.0).unwrap();
    assert_eq!(&dst[0..4], &[0, 0, 0, 0]);
    assert_eq!(&dst[4..8], &[255, 255, 255, 255]);
    assert_eq!(&dst[8..12], &[0, 0, 0, 0]);
    assert_eq!(&dst[12..16], &[255, 255, 255, 255]);
}

#[test]
fn pixel_span_clamps_and_rejects_empty() {
    assert_eq!(
        pixel_span(Rect::new(-5.0, 1.0, 50.0, 3.0), 10, 10),
        Some((0, 1, 10, 3))
    );
    assert_eq!(pixel_span(Rect::new(4.0, 4.0, 4.0, 9.0), 10, 10), None);
}

#[test]
fn premul_round_trip_is_stable_for_opaque() {
    let c = [12, 200, 99, 255];
    assert_eq!(unpremul_rgba8(premul_rgba8(c)), c);
    assert_eq!(unpremul_rgba8([0, 0, 0, 0]), [0, 0, 0, 0]);
}
