use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assets::decode::{DecodedImage, decode_image};
use crate::foundation::error::{StickerError, StickerResult};
use crate::foundation::math::Fnv1a64;

const MEMORY_SCHEME: &str = "mem:";

/// Opaque reference to an image source (a relative path, URL, or an in-memory key).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a source string.
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    /// Access the raw source string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for references minted by [`ImageStore::insert`].
    pub fn is_memory(&self) -> bool {
        self.0.starts_with(MEMORY_SCHEME)
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Byte source behind the image store: `fetch(src) -> bytes` with unspecified latency.
///
/// Hosts plug their network or cache layer in here.
pub trait ImageFetcher: Send + Sync {
    /// Fetch the encoded bytes for `src`.
    fn fetch(&self, src: &ImageRef) -> StickerResult<Vec<u8>>;
}

/// Fetch images from files below a root directory.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Resolve sources relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageFetcher for FsFetcher {
    fn fetch(&self, src: &ImageRef) -> StickerResult<Vec<u8>> {
        let norm = normalize_rel_path(src.as_str())?;
        let path = self.root.join(Path::new(&norm));
        std::fs::read(&path).map_err(|e| {
            StickerError::decode(format!("failed to read image '{}': {e}", path.display()))
        })
    }
}

/// In-memory byte source, optionally with an artificial latency per entry.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
}

impl MemoryFetcher {
    /// Empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded bytes under `src`.
    pub fn insert(&mut self, src: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.entries.insert(src.into(), bytes);
        self
    }

    /// Delay every fetch of `src` by `delay`.
    pub fn set_delay(&mut self, src: impl Into<String>, delay: Duration) -> &mut Self {
        self.delays.insert(src.into(), delay);
        self
    }
}

impl ImageFetcher for MemoryFetcher {
    fn fetch(&self, src: &ImageRef) -> StickerResult<Vec<u8>> {
        if let Some(delay) = self.delays.get(src.as_str()) {
            std::thread::sleep(*delay);
        }
        self.entries
            .get(src.as_str())
            .cloned()
            .ok_or_else(|| StickerError::decode(format!("no image registered for '{src}'")))
    }
}

/// Decoded-image cache in front of an [`ImageFetcher`].
///
/// Also holds images produced in memory (crop commits), addressed by `mem:` references.
pub struct ImageStore {
    fetcher: Arc<dyn ImageFetcher>,
    decoded: RwLock<HashMap<ImageRef, Arc<DecodedImage>>>,
    next_memory_id: AtomicU64,
}

impl fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = match self.decoded.read() {
            Ok(g) => g.len(),
            Err(p) => p.into_inner().len(),
        };
        f.debug_struct("ImageStore")
            .field("cached", &cached)
            .field("next_memory_id", &self.next_memory_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl ImageStore {
    /// Store backed by `fetcher`.
    pub fn new(fetcher: impl ImageFetcher + 'static) -> Self {
        Self::with_fetcher(Arc::new(fetcher))
    }

    /// Store backed by a shared fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            decoded: RwLock::new(HashMap::new()),
            next_memory_id: AtomicU64::new(0),
        }
    }

    /// Return the decoded image for `src`, fetching and decoding it on first use.
    pub fn load(&self, src: &ImageRef) -> StickerResult<Arc<DecodedImage>> {
        if let Some(img) = self.cached(src) {
            return Ok(img);
        }
        if src.is_memory() {
            return Err(StickerError::decode(format!(
                "in-memory image '{src}' is not in the store"
            )));
        }
        let bytes = self.fetcher.fetch(src)?;
        let img = Arc::new(decode_image(&bytes).map_err(|e| match e {
            StickerError::Decode(msg) => StickerError::decode(format!("'{src}': {msg}")),
            other => other,
        })?);
        self.write_cache(src.clone(), img.clone());
        Ok(img)
    }

    /// Load `srcs`, returning results in the same order as the input.
    ///
    /// With `parallel`, fetch/decode runs on the rayon pool; the output order is still the
    /// input order, so callers can draw results strictly in sequence.
    pub fn load_ordered(
        &self,
        srcs: &[ImageRef],
        parallel: bool,
    ) -> Vec<StickerResult<Arc<DecodedImage>>> {
        if parallel && srcs.len() > 1 {
            srcs.par_iter().map(|s| self.load(s)).collect()
        } else {
            srcs.iter().map(|s| self.load(s)).collect()
        }
    }

    /// Keep an in-memory image and mint a fresh `mem:` reference for it.
    pub fn insert(&self, image: DecodedImage) -> ImageRef {
        let n = self.next_memory_id.fetch_add(1, Ordering::Relaxed);
        let mut h = Fnv1a64::new_default();
        h.write_u64(u64::from(image.width));
        h.write_u64(u64::from(image.height));
        h.write_bytes(image.rgba8_premul.as_slice());
        let src = ImageRef::new(format!("{MEMORY_SCHEME}{n}-{:016x}", h.finish()));
        self.write_cache(src.clone(), Arc::new(image));
        src
    }

    /// Seed the cache with an image decoded elsewhere (e.g. by a model loader).
    pub fn insert_as(&self, src: ImageRef, image: Arc<DecodedImage>) {
        self.write_cache(src, image);
    }

    /// `true` when `src` is already decoded.
    pub fn contains(&self, src: &ImageRef) -> bool {
        self.cached(src).is_some()
    }

    /// Drop the decoded copy of `src`.
    pub fn evict(&self, src: &ImageRef) {
        let mut g = match self.decoded.write() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        g.remove(src);
    }

    fn cached(&self, src: &ImageRef) -> Option<Arc<DecodedImage>> {
        let g = match self.decoded.read() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        g.get(src).cloned()
    }

    fn write_cache(&self, src: ImageRef, img: Arc<DecodedImage>) {
        let mut g = match self.decoded.write() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        g.insert(src, img);
    }
}

/// Normalize a relative image path to forward slashes, rejecting absolute paths and `..`.
pub fn normalize_rel_path(source: &str) -> StickerResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StickerError::validation("image paths must be relative"));
    }
    if s.is_empty() {
        return Err(StickerError::validation("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StickerError::validation("image paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StickerError::validation(
            "image path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
