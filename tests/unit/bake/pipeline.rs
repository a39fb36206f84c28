use std::io::Cursor;
use std::time::Duration;

use super::*;
use crate::assets::store::MemoryFetcher;
use crate::foundation::core::Rgba8Premul;
use crate::sticker::model::StickerPatch;
use crate::sticker::stack::StickerStack;
use crate::uv::transform::Uv;

fn near(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
}

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn solid(w: u32, h: u32, r: u8, g: u8, b: u8) -> DecodedImage {
    DecodedImage::solid(w, h, Rgba8Premul::from_straight_rgba(r, g, b, 255)).unwrap()
}

fn cfg(edge: u32) -> EditorConfig {
    EditorConfig {
        default_texture_size: edge,
        ..EditorConfig::default()
    }
}

fn mapped_snapshot(edge: u32) -> PbrSnapshot {
    let mut s = PbrSnapshot::untextured(Color::rgb(10, 20, 30));
    s.map = Some(Texture::from_model(Arc::new(solid(edge, edge, 0, 255, 0))));
    s.normal_map = Some(Texture::from_model(Arc::new(solid(4, 4, 128, 128, 255))));
    s
}

fn setup(snapshot: PbrSnapshot, edge: u32) -> (BakePipeline, MaterialStore, MeshId) {
    let mut pipeline = BakePipeline::new(&cfg(edge));
    let mut materials = MaterialStore::new();
    let mesh = materials.push(&snapshot);
    pipeline.capture(mesh, snapshot);
    (pipeline, materials, mesh)
}

#[test]
fn custom_color_without_stickers_is_flat_fill() {
    let (mut pipeline, mut materials, mesh) = setup(mapped_snapshot(32), 32);
    let store = ImageStore::new(MemoryFetcher::new());

    let applied = pipeline
        .bake(mesh, ColorMode::Custom(Color::rgb(255, 0, 0)), &[], &store, &mut materials)
        .unwrap();
    assert!(applied);

    let m = materials.get(mesh).unwrap();
    let map = m.map.as_ref().unwrap();
    assert!(!map.flip_y);
    assert_eq!((map.image.width, map.image.height), (32, 32));
    for (x, y) in [(0, 0), (16, 16), (31, 31)] {
        assert!(near(map.image.pixel(x, y).unwrap(), [255, 0, 0, 255]));
    }
    assert_eq!(m.color, Color::WHITE);
    assert_eq!(m.normal_map, pipeline.snapshot(mesh).unwrap().normal_map);
}

#[test]
fn original_mode_keeps_map_and_base_color() {
    let (mut pipeline, mut materials, mesh) = setup(mapped_snapshot(16), 64);
    let store = ImageStore::new(MemoryFetcher::new());
    pipeline
        .bake(mesh, ColorMode::Original, &[], &store, &mut materials)
        .unwrap();

    let m = materials.get(mesh).unwrap();
    let map = m.map.as_ref().unwrap();
    // Canvas size follows the original map, not the configured default.
    assert_eq!((map.image.width, map.image.height), (16, 16));
    assert!(near(map.image.pixel(8, 8).unwrap(), [0, 255, 0, 255]));
    assert_eq!(m.color, Color::rgb(10, 20, 30));
}

fn two_tone(edge: u32) -> DecodedImage {
    let mut bytes = Vec::new();
    for y in 0..edge {
        for _ in 0..edge {
            let px = if y < edge / 2 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
            bytes.extend_from_slice(&px);
        }
    }
    DecodedImage::from_premul(edge, edge, bytes).unwrap()
}

#[test]
fn bake_without_stickers_displays_like_the_original_map() {
    let mut snapshot = PbrSnapshot::untextured(Color::WHITE);
    snapshot.map = Some(Texture::from_model(Arc::new(two_tone(16))));
    let (mut pipeline, mut materials, mesh) = setup(snapshot.clone(), 16);
    let store = ImageStore::new(MemoryFetcher::new());
    pipeline
        .bake(mesh, ColorMode::Original, &[], &store, &mut materials)
        .unwrap();

    let original = snapshot.map.unwrap();
    let baked = materials.get(mesh).unwrap().map.clone().unwrap();
    assert_eq!(baked.flip_y, original.flip_y);
    for (x, y) in [(8, 1), (8, 14)] {
        assert!(near(
            baked.image.pixel(x, y).unwrap(),
            original.image.pixel(x, y).unwrap()
        ));
    }
}

#[test]
fn flipped_original_map_is_baked_upright() {
    let mut snapshot = PbrSnapshot::untextured(Color::WHITE);
    snapshot.map = Some(Texture {
        image: Arc::new(two_tone(16)),
        flip_y: true,
    });
    let (mut pipeline, mut materials, mesh) = setup(snapshot, 16);
    let store = ImageStore::new(MemoryFetcher::new());
    pipeline
        .bake(mesh, ColorMode::Original, &[], &store, &mut materials)
        .unwrap();

    // Uploaded flipped, the source shows blue on top; the unflipped composite must too.
    let baked = materials.get(mesh).unwrap().map.clone().unwrap();
    assert!(!baked.flip_y);
    assert!(near(baked.image.pixel(8, 1).unwrap(), [0, 0, 255, 255]));
    assert!(near(baked.image.pixel(8, 14).unwrap(), [255, 0, 0, 255]));
}

#[test]
fn untextured_mesh_uses_default_size_and_base_color() {
    let (mut pipeline, mut materials, mesh) =
        setup(PbrSnapshot::untextured(Color::rgb(0, 0, 255)), 24);
    let store = ImageStore::new(MemoryFetcher::new());
    pipeline
        .bake(mesh, ColorMode::Original, &[], &store, &mut materials)
        .unwrap();

    let map = materials.get(mesh).unwrap().map.clone().unwrap();
    assert_eq!((map.image.width, map.image.height), (24, 24));
    assert!(near(map.image.pixel(3, 20).unwrap(), [0, 0, 255, 255]));
    assert_eq!(materials.get(mesh).unwrap().color, Color::WHITE);
}

#[test]
fn sticker_lands_at_uv_with_v_flipped() {
    let (mut pipeline, mut materials, mesh) = setup(mapped_snapshot(100), 100);
    let store = ImageStore::new(MemoryFetcher::new());
    let src = store.insert(solid(10, 10, 255, 0, 0));

    let mut stack = StickerStack::new();
    let id = stack.add(src, 10, 10, 0.1).unwrap();
    // Near the top of UV space means near row 0 of the canvas.
    stack
        .update(id, &StickerPatch::center(Uv { u: 0.25, v: 0.8 }))
        .unwrap();

    let ticket = pipeline.begin(mesh);
    let out = pipeline
        .render(ticket, ColorMode::Original, stack.paint_order(), &store)
        .unwrap()
        .unwrap();
    assert_eq!(out.drawn, vec![id]);
    assert!(out.skipped.is_empty());
    let img = &out.texture.image;
    assert!(near(img.pixel(25, 20).unwrap(), [255, 0, 0, 255]));
    assert!(near(img.pixel(25, 80).unwrap(), [0, 255, 0, 255]));
    assert!(near(img.pixel(75, 20).unwrap(), [0, 255, 0, 255]));
    assert!(pipeline.apply(out, &mut materials).unwrap());
}

#[test]
fn paint_order_follows_z_index_despite_slow_decode() {
    let mut fetcher = MemoryFetcher::new();
    fetcher
        .insert("below.png", png(8, 8, [255, 0, 0, 255]))
        .insert("above.png", png(8, 8, [0, 0, 255, 255]))
        .set_delay("below.png", Duration::from_millis(60));
    let store = ImageStore::new(fetcher);

    let mut pipeline = BakePipeline::new(&EditorConfig {
        default_texture_size: 64,
        parallel_decode: true,
        ..EditorConfig::default()
    });
    let mut materials = MaterialStore::new();
    let snapshot = PbrSnapshot::untextured(Color::WHITE);
    let mesh = materials.push(&snapshot);
    pipeline.capture(mesh, snapshot);

    let mut stack = StickerStack::new();
    let below = stack.add(ImageRef::from("below.png"), 8, 8, 0.3).unwrap();
    let above = stack.add(ImageRef::from("above.png"), 8, 8, 0.3).unwrap();

    let ticket = pipeline.begin(mesh);
    let out = pipeline
        .render(ticket, ColorMode::Original, stack.paint_order(), &store)
        .unwrap()
        .unwrap();
    assert_eq!(out.drawn, vec![below, above]);
    assert!(near(out.texture.image.pixel(32, 32).unwrap(), [0, 0, 255, 255]));
}

#[test]
fn reordered_stack_changes_overlap() {
    let store = ImageStore::new(MemoryFetcher::new());
    let red = store.insert(solid(4, 4, 255, 0, 0));
    let blue = store.insert(solid(4, 4, 0, 0, 255));
    let (mut pipeline, mut materials, mesh) = setup(PbrSnapshot::untextured(Color::WHITE), 40);

    let mut stack = StickerStack::new();
    let r = stack.add(red, 4, 4, 0.2).unwrap();
    stack.add(blue, 4, 4, 0.2).unwrap();
    stack.reorder(r, crate::sticker::stack::Reorder::ToFront).unwrap();

    pipeline
        .bake(mesh, ColorMode::Original, stack.paint_order(), &store, &mut materials)
        .unwrap();
    let map = materials.get(mesh).unwrap().map.clone().unwrap();
    assert!(near(map.image.pixel(20, 20).unwrap(), [255, 0, 0, 255]));
}

#[test]
fn unloadable_sticker_is_skipped() {
    let mut fetcher = MemoryFetcher::new();
    fetcher.insert("broken.png", b"not an image".to_vec());
    let store = ImageStore::new(fetcher);
    let good = store.insert(solid(4, 4, 0, 0, 255));
    let (mut pipeline, mut materials, mesh) = setup(PbrSnapshot::untextured(Color::WHITE), 40);

    let mut stack = StickerStack::new();
    let bad = stack.add(ImageRef::from("broken.png"), 4, 4, 0.2).unwrap();
    let ok = stack.add(good, 4, 4, 0.1).unwrap();

    let ticket = pipeline.begin(mesh);
    let out = pipeline
        .render(ticket, ColorMode::Original, stack.paint_order(), &store)
        .unwrap()
        .unwrap();
    assert_eq!(out.skipped, vec![bad]);
    assert_eq!(out.drawn, vec![ok]);
    assert!(near(out.texture.image.pixel(20, 20).unwrap(), [0, 0, 255, 255]));
    assert!(near(out.texture.image.pixel(14, 20).unwrap(), [255, 255, 255, 255]));
    assert!(pipeline.apply(out, &mut materials).unwrap());
}

#[test]
fn superseded_bake_is_discarded() {
    let (mut pipeline, mut materials, mesh) = setup(mapped_snapshot(8), 8);
    let store = ImageStore::new(MemoryFetcher::new());

    let first = pipeline.begin(mesh);
    let second = pipeline.begin(mesh);
    let stale = pipeline
        .render(first, ColorMode::Custom(Color::rgb(255, 0, 0)), &[], &store)
        .unwrap()
        .unwrap();
    let fresh = pipeline
        .render(second, ColorMode::Custom(Color::rgb(0, 0, 255)), &[], &store)
        .unwrap()
        .unwrap();

    // The later-triggered bake wins even though the stale one is applied after it.
    assert!(pipeline.apply(fresh, &mut materials).unwrap());
    let version = materials.get(mesh).unwrap().version();
    assert!(!pipeline.apply(stale, &mut materials).unwrap());

    let m = materials.get(mesh).unwrap();
    assert_eq!(m.version(), version);
    assert!(near(
        m.map.as_ref().unwrap().image.pixel(4, 4).unwrap(),
        [0, 0, 255, 255]
    ));
}

#[test]
fn bake_started_before_reload_is_discarded() {
    let (mut pipeline, mut materials, mesh) = setup(mapped_snapshot(8), 8);
    let store = ImageStore::new(MemoryFetcher::new());

    let old = pipeline.begin(mesh);
    let old_out = pipeline
        .render(old, ColorMode::Custom(Color::rgb(255, 0, 0)), &[], &store)
        .unwrap()
        .unwrap();

    pipeline.clear();
    pipeline.capture(mesh, mapped_snapshot(8));
    let new = pipeline.begin(mesh);
    assert_ne!(old, new);

    assert!(!pipeline.apply(old_out, &mut materials).unwrap());
    assert!(pipeline.is_current(new));
}

#[test]
fn restore_original_puts_snapshot_back() {
    let snapshot = mapped_snapshot(8);
    let (mut pipeline, mut materials, mesh) = setup(snapshot.clone(), 8);
    let store = ImageStore::new(MemoryFetcher::new());
    pipeline
        .bake(mesh, ColorMode::Custom(Color::rgb(255, 0, 0)), &[], &store, &mut materials)
        .unwrap();
    assert_ne!(materials.get(mesh).unwrap().map, snapshot.map);

    pipeline.restore_original(mesh, &mut materials).unwrap();
    let m = materials.get(mesh).unwrap();
    assert_eq!(m.map, snapshot.map);
    assert_eq!(m.normal_map, snapshot.normal_map);
    assert_eq!(m.color, snapshot.base_color);
}

#[test]
fn oversized_canvas_keeps_previous_composite() {
    let (mut pipeline, mut materials, mesh) =
        setup(PbrSnapshot::untextured(Color::WHITE), 100_000);
    let store = ImageStore::new(MemoryFetcher::new());
    let before = materials.get(mesh).unwrap().clone();

    let applied = pipeline
        .bake(mesh, ColorMode::Custom(Color::rgb(1, 2, 3)), &[], &store, &mut materials)
        .unwrap();
    assert!(!applied);
    assert_eq!(materials.get(mesh).unwrap().version(), before.version());
    assert_eq!(materials.get(mesh).unwrap().map, before.map);
}

#[test]
fn unknown_mesh_is_rejected() {
    let mut pipeline = BakePipeline::new(&cfg(8));
    let store = ImageStore::new(MemoryFetcher::new());
    let ticket = pipeline.begin(MeshId(7));
    let err = pipeline
        .render(ticket, ColorMode::Original, &[], &store)
        .unwrap_err();
    assert!(matches!(err, StickerError::Validation(_)));
}

#[test]
fn bake_all_covers_every_mesh() {
    let mut pipeline = BakePipeline::new(&cfg(8));
    let mut materials = MaterialStore::new();
    for c in [Color::rgb(1, 1, 1), Color::rgb(2, 2, 2)] {
        let s = PbrSnapshot::untextured(c);
        let mesh = materials.push(&s);
        pipeline.capture(mesh, s);
    }
    let store = ImageStore::new(MemoryFetcher::new());
    let n = pipeline
        .bake_all(ColorMode::Custom(Color::WHITE), &[], &store, &mut materials)
        .unwrap();
    assert_eq!(n, 2);
    assert!(materials.mesh_ids().all(|m| materials.get(m).unwrap().map.is_some()));
}
