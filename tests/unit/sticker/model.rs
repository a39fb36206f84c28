use super::*;

fn sticker() -> Sticker {
    Sticker::new(StickerId(1), ImageRef::from("a.png"), 400, 200, 0.15).unwrap()
}

#[test]
fn new_sticker_defaults() {
    let s = sticker();
    assert_eq!(s.center(), Uv::CENTER);
    assert_eq!(s.scale(), 0.15);
    assert_eq!(s.rotation(), 0.0);
    assert_eq!(s.aspect_ratio(), 2.0);
    assert_eq!(s.z_index(), 0);
    assert_eq!(s.crop(), CropRect::FULL);
    assert_eq!(s.src(), s.original_src());
}

#[test]
fn zero_sized_image_is_rejected() {
    assert!(Sticker::new(StickerId(1), ImageRef::from("a.png"), 0, 10, 0.15).is_err());
}

#[test]
fn footprint_keeps_longest_edge_at_scale() {
    assert_eq!(footprint(0.25, 2.0, 1000.0), (250.0, 125.0));
    assert_eq!(footprint(0.25, 0.5, 1000.0), (125.0, 250.0));
    assert_eq!(footprint(0.25, 0.0, 1000.0), (250.0, 250.0));
}

#[test]
fn pixel_center_flips_v() {
    let s = sticker()
        .patched(&StickerPatch {
            uv_x: Some(0.25),
            uv_y: Some(0.75),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(s.pixel_center(200.0, 100.0), (50.0, 25.0));
}

#[test]
fn patch_clamps_scale_and_wraps_rotation() {
    let s = sticker();
    let p = s.patched(&StickerPatch::scale(2.0)).unwrap();
    assert_eq!(p.scale(), MAX_SCALE);
    let p = s.patched(&StickerPatch::rotation(-30.0)).unwrap();
    assert_eq!(p.rotation(), 330.0);
}

#[test]
fn patch_rejects_invariant_breaks() {
    let s = sticker();
    assert!(s.patched(&StickerPatch::center(Uv { u: 1.5, v: 0.5 })).is_err());
    assert!(
        s.patched(&StickerPatch {
            aspect_ratio: Some(0.0),
            ..Default::default()
        })
        .is_err()
    );
    assert!(
        s.patched(&StickerPatch::crop(CropRect {
            x: 0.0,
            y: 0.0,
            width: 4.0,
            height: 50.0,
        }))
        .is_err()
    );
    assert!(s.patched(&StickerPatch::scale(f64::NAN)).is_err());
}

#[test]
fn crop_validation_bounds() {
    assert!(CropRect::FULL.is_full());
    CropRect::FULL.validate(MIN_CROP_PERCENT).unwrap();
    let shifted = CropRect {
        x: 60.0,
        y: 0.0,
        width: 50.0,
        height: 100.0,
    };
    assert!(shifted.validate(MIN_CROP_PERCENT).is_err());
    assert!(!shifted.is_full());
}

#[test]
fn sticker_serializes_camel_case() {
    let v = serde_json::to_value(sticker()).unwrap();
    assert_eq!(v["originalSrc"], "a.png");
    assert_eq!(v["aspectRatio"], 2.0);
    assert_eq!(v["zIndex"], 0);
    assert!(StickerPatch::default().is_empty());
}
