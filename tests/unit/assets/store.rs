use std::io::Cursor;
use std::sync::atomic::AtomicUsize;

use super::*;
use crate::foundation::core::Rgba8Premul;

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

struct CountingFetcher {
    inner: MemoryFetcher,
    calls: Arc<AtomicUsize>,
}

impl ImageFetcher for CountingFetcher {
    fn fetch(&self, src: &ImageRef) -> StickerResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(src)
    }
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn load_caches_decoded_images() {
    let mut inner = MemoryFetcher::new();
    inner.insert("a.png", png(4, 2, [255, 0, 0, 255]));
    let calls = Arc::new(AtomicUsize::new(0));
    let store = ImageStore::new(CountingFetcher {
        inner,
        calls: calls.clone(),
    });

    let src = ImageRef::from("a.png");
    let a = store.load(&src).unwrap();
    let b = store.load(&src).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!((a.width, a.height), (4, 2));
    assert!(store.contains(&src));

    store.evict(&src);
    assert!(!store.contains(&src));
    store.load(&src).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_and_corrupt_sources_are_decode_errors() {
    let mut f = MemoryFetcher::new();
    f.insert("bad.png", b"garbage".to_vec());
    let store = ImageStore::new(f);

    let err = store.load(&ImageRef::from("missing.png")).unwrap_err();
    assert!(matches!(err, StickerError::Decode(_)));
    let err = store.load(&ImageRef::from("bad.png")).unwrap_err();
    assert!(matches!(err, StickerError::Decode(_)));
    assert!(err.to_string().contains("bad.png"));
}

#[test]
fn insert_mints_unique_memory_refs() {
    let store = ImageStore::new(MemoryFetcher::new());
    let img = DecodedImage::solid(2, 2, Rgba8Premul::from_straight_rgba(0, 0, 0, 255)).unwrap();
    let a = store.insert(img.clone());
    let b = store.insert(img);
    assert_ne!(a, b);
    assert!(a.is_memory());
    assert_eq!(store.load(&a).unwrap().width, 2);

    store.evict(&a);
    assert!(matches!(store.load(&a), Err(StickerError::Decode(_))));
}

#[test]
fn load_ordered_preserves_input_order_despite_latency() {
    let mut f = MemoryFetcher::new();
    f.insert("slow.png", png(3, 1, [1, 1, 1, 255]));
    f.insert("fast.png", png(5, 1, [2, 2, 2, 255]));
    f.insert("bad.png", b"x".to_vec());
    f.set_delay("slow.png", Duration::from_millis(40));
    let store = ImageStore::new(f);

    let srcs = [
        ImageRef::from("slow.png"),
        ImageRef::from("bad.png"),
        ImageRef::from("fast.png"),
    ];
    let out = store.load_ordered(&srcs, true);
    assert_eq!(out.len(), 3);
    assert_eq!(out[0].as_ref().unwrap().width, 3);
    assert!(out[1].is_err());
    assert_eq!(out[2].as_ref().unwrap().width, 5);
}

#[test]
fn fs_fetcher_reads_relative_to_root() {
    let dir = std::env::temp_dir().join(format!("stickerbake_fs_{}", std::process::id()));
    std::fs::create_dir_all(dir.join("img")).unwrap();
    std::fs::write(dir.join("img/a.png"), png(2, 3, [0, 0, 0, 255])).unwrap();

    let store = ImageStore::new(FsFetcher::new(&dir));
    let img = store.load(&ImageRef::from("img/a.png")).unwrap();
    assert_eq!((img.width, img.height), (2, 3));
    assert!(store.load(&ImageRef::from("../a.png")).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
