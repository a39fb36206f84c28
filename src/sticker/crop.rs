use serde::{Deserialize, Serialize};

use crate::assets::decode::DecodedImage;
use crate::assets::store::ImageStore;
use crate::foundation::core::{Point, Size};
use crate::foundation::error::{StickerError, StickerResult};
use crate::sticker::model::{CropRect, MIN_CROP_PERCENT, Sticker, StickerId, StickerPatch};

/// Crop handle grabbed on the sticker thumbnail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropHandle {
    /// Top edge.
    N,
    /// Bottom edge.
    S,
    /// Right edge.
    E,
    /// Left edge.
    W,
    /// Top-right corner.
    Ne,
    /// Top-left corner.
    Nw,
    /// Bottom-right corner.
    Se,
    /// Bottom-left corner.
    Sw,
}

impl CropHandle {
    fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }
}

/// Move the edges implied by `handle` by `(dx, dy)` percent.
///
/// Opposite edges stay fixed. The result never leaves the image and never shrinks below
/// `min_percent` on either axis.
pub fn adjust_crop(
    start: CropRect,
    handle: CropHandle,
    dx_pct: f64,
    dy_pct: f64,
    min_percent: f64,
) -> CropRect {
    let mut out = start;
    let right = start.x + start.width;
    let bottom = start.y + start.height;

    if handle.moves_left() {
        let x = (start.x + dx_pct).min(right - min_percent).max(0.0);
        out.x = x;
        out.width = right - x;
    }
    if handle.moves_right() {
        out.width = (start.width + dx_pct)
            .max(min_percent)
            .min(100.0 - start.x);
    }
    if handle.moves_top() {
        let y = (start.y + dy_pct).min(bottom - min_percent).max(0.0);
        out.y = y;
        out.height = bottom - y;
    }
    if handle.moves_bottom() {
        out.height = (start.height + dy_pct)
            .max(min_percent)
            .min(100.0 - start.y);
    }
    out
}

/// An in-progress crop drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropDrag {
    /// Sticker being cropped.
    pub sticker: StickerId,
    /// Handle grabbed.
    pub handle: CropHandle,
    /// Pointer position at grab.
    pub start: Point,
    /// Crop at grab.
    pub start_crop: CropRect,
    /// Rendered thumbnail size; pointer deltas are relative to it.
    pub thumb: Size,
}

/// Crop interaction state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CropState {
    /// No handle grabbed.
    #[default]
    Idle,
    /// A handle is being dragged.
    Dragging(CropDrag),
}

/// Interactive crop state machine: `Idle -> Dragging(handle) -> Idle`.
#[derive(Clone, Debug)]
pub struct CropEngine {
    state: CropState,
    min_percent: f64,
}

impl Default for CropEngine {
    fn default() -> Self {
        Self::new(MIN_CROP_PERCENT)
    }
}

impl CropEngine {
    /// Engine enforcing a minimum crop side of `min_percent` (never below 5%).
    pub fn new(min_percent: f64) -> Self {
        Self {
            state: CropState::Idle,
            min_percent: min_percent.clamp(MIN_CROP_PERCENT, 100.0),
        }
    }

    /// Current state.
    pub fn state(&self) -> CropState {
        self.state
    }

    /// `true` while a handle is grabbed.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, CropState::Dragging(_))
    }

    /// Grab `handle` at `pointer`. Any previous drag is discarded.
    pub fn begin(
        &mut self,
        sticker: StickerId,
        handle: CropHandle,
        pointer: Point,
        crop: CropRect,
        thumb: Size,
    ) -> StickerResult<()> {
        if !(thumb.width > 0.0 && thumb.height > 0.0) {
            return Err(StickerError::validation(
                "crop thumbnail size must be > 0",
            ));
        }
        self.state = CropState::Dragging(CropDrag {
            sticker,
            handle,
            start: pointer,
            start_crop: crop,
            thumb,
        });
        Ok(())
    }

    /// Crop for the current pointer position, or `None` when idle.
    pub fn update(&self, pointer: Point) -> Option<(StickerId, CropRect)> {
        let CropState::Dragging(d) = self.state else {
            return None;
        };
        let dx = (pointer.x - d.start.x) / d.thumb.width * 100.0;
        let dy = (pointer.y - d.start.y) / d.thumb.height * 100.0;
        Some((
            d.sticker,
            adjust_crop(d.start_crop, d.handle, dx, dy, self.min_percent),
        ))
    }

    /// Pointer released: return to idle, handing back the finished drag for committing.
    pub fn release(&mut self) -> Option<CropDrag> {
        match std::mem::take(&mut self.state) {
            CropState::Idle => None,
            CropState::Dragging(d) => Some(d),
        }
    }

    /// Pointer cancelled: return to idle, handing back the crop captured at grab time.
    pub fn cancel(&mut self) -> Option<(StickerId, CropRect)> {
        self.release().map(|d| (d.sticker, d.start_crop))
    }
}

/// Source-pixel rectangle `(x, y, width, height)` for a percent crop of a `width x height` image.
pub fn crop_pixels(crop: CropRect, width: u32, height: u32) -> (u32, u32, u32, u32) {
    fn axis(offset_pct: f64, len_pct: f64, full: u32) -> (u32, u32) {
        let full_f = f64::from(full);
        let start = (offset_pct / 100.0 * full_f)
            .round()
            .clamp(0.0, full_f - 1.0) as u32;
        let len = (len_pct / 100.0 * full_f)
            .round()
            .clamp(1.0, f64::from(full - start)) as u32;
        (start, len)
    }

    let (x, w) = axis(crop.x, crop.width, width.max(1));
    let (y, h) = axis(crop.y, crop.height, height.max(1));
    (x, y, w, h)
}

/// Copy the cropped sub-rectangle of `img` into a new image sized to the crop.
pub fn rasterize_crop(img: &DecodedImage, crop: CropRect) -> StickerResult<DecodedImage> {
    let (x, y, w, h) = crop_pixels(crop, img.width, img.height);
    // The buffer only carries bytes here; premultiplication is preserved as-is.
    let buf = image::RgbaImage::from_raw(img.width, img.height, img.rgba8_premul.to_vec())
        .ok_or_else(|| StickerError::crop("image buffer does not match its dimensions"))?;
    let sub = image::imageops::crop_imm(&buf, x, y, w, h).to_image();
    DecodedImage::from_premul(w, h, sub.into_raw())
}

/// Bake a sticker's pending crop into a new source.
///
/// Returns `Ok(None)` when the crop is the full image. Otherwise the cropped pixels are stored
/// under a fresh reference and the returned patch swaps `src`, recomputes `aspect_ratio` and
/// resets `crop` to the full image. If the current source cannot be (re)loaded, the error is a
/// [`StickerError::Crop`] and nothing is stored.
pub fn commit_crop(store: &ImageStore, sticker: &Sticker) -> StickerResult<Option<StickerPatch>> {
    let crop = sticker.crop();
    if crop.is_full() {
        return Ok(None);
    }
    let img = store.load(sticker.src()).map_err(|e| {
        StickerError::crop(format!("reload '{}' for crop failed: {e}", sticker.src()))
    })?;
    let cropped = rasterize_crop(&img, crop)?;
    let aspect_ratio = cropped.aspect_ratio();
    let src = store.insert(cropped);
    Ok(Some(StickerPatch {
        src: Some(src),
        aspect_ratio: Some(aspect_ratio),
        crop: Some(CropRect::FULL),
        ..StickerPatch::default()
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/sticker/crop.rs"]
mod tests;
