use serde::{Deserialize, Serialize};

use crate::assets::store::ImageRef;
use crate::foundation::error::{StickerError, StickerResult};
use crate::foundation::math::wrap_degrees;
use crate::uv::transform::Uv;

/// Smallest sticker scale (fraction of the larger texture edge).
pub const MIN_SCALE: f64 = 0.05;
/// Largest sticker scale (fraction of the larger texture edge).
pub const MAX_SCALE: f64 = 0.5;
/// Smallest crop width/height, in percent of the image.
pub const MIN_CROP_PERCENT: f64 = 5.0;

/// Opaque sticker identifier, unique within a stack for the sticker's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StickerId(pub(crate) u64);

impl StickerId {
    /// Access the raw identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Crop rectangle in percent-of-image units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge, percent of image width.
    pub x: f64,
    /// Top edge, percent of image height.
    pub y: f64,
    /// Width, percent of image width.
    pub width: f64,
    /// Height, percent of image height.
    pub height: f64,
}

impl Default for CropRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl CropRect {
    /// The whole image.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    /// `true` when the rectangle covers the whole image.
    pub fn is_full(&self) -> bool {
        const EPS: f64 = 1e-9;
        self.x.abs() < EPS
            && self.y.abs() < EPS
            && (self.width - 100.0).abs() < EPS
            && (self.height - 100.0).abs() < EPS
    }

    /// Check the rectangle lies inside the image and is at least `min_percent` on each side.
    pub fn validate(&self, min_percent: f64) -> StickerResult<()> {
        const EPS: f64 = 1e-9;
        let vals = [self.x, self.y, self.width, self.height];
        if vals.iter().any(|v| !v.is_finite()) {
            return Err(StickerError::validation("crop values must be finite"));
        }
        if self.width + EPS < min_percent || self.height + EPS < min_percent {
            return Err(StickerError::validation(format!(
                "crop width/height must be >= {min_percent}%"
            )));
        }
        if self.x < -EPS
            || self.y < -EPS
            || self.x + self.width > 100.0 + EPS
            || self.y + self.height > 100.0 + EPS
        {
            return Err(StickerError::validation(
                "crop must lie within the image bounds",
            ));
        }
        Ok(())
    }
}

/// Pixel width/height of a sticker whose longest edge is `scale * max_edge`.
pub fn footprint(scale: f64, aspect_ratio: f64, max_edge: f64) -> (f64, f64) {
    let longest = scale * max_edge;
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
        return (longest, longest);
    }
    if aspect_ratio >= 1.0 {
        (longest, longest / aspect_ratio)
    } else {
        (longest * aspect_ratio, longest)
    }
}

/// One user-placed image layer.
///
/// Only constructed through [`crate::StickerStack`], which validates every field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    pub(crate) id: StickerId,
    pub(crate) src: ImageRef,
    pub(crate) original_src: ImageRef,
    pub(crate) uv_x: f64,
    pub(crate) uv_y: f64,
    pub(crate) scale: f64,
    pub(crate) rotation: f64,
    pub(crate) aspect_ratio: f64,
    pub(crate) z_index: usize,
    pub(crate) crop: CropRect,
}

impl Sticker {
    /// A centered, unrotated sticker for a freshly uploaded `src` of `width x height` pixels.
    pub(crate) fn new(
        id: StickerId,
        src: ImageRef,
        width: u32,
        height: u32,
        scale: f64,
    ) -> StickerResult<Self> {
        if width == 0 || height == 0 {
            return Err(StickerError::validation(format!(
                "sticker image '{src}' has zero size"
            )));
        }
        let s = Self {
            id,
            original_src: src.clone(),
            src,
            uv_x: 0.5,
            uv_y: 0.5,
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
            rotation: 0.0,
            aspect_ratio: f64::from(width) / f64::from(height),
            z_index: 0,
            crop: CropRect::FULL,
        };
        s.validate()?;
        Ok(s)
    }

    /// Check every field invariant.
    pub fn validate(&self) -> StickerResult<()> {
        if !(0.0..=1.0).contains(&self.uv_x) || !(0.0..=1.0).contains(&self.uv_y) {
            return Err(StickerError::validation("sticker uv must be within [0, 1]"));
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            return Err(StickerError::validation(format!(
                "sticker scale must be within [{MIN_SCALE}, {MAX_SCALE}]"
            )));
        }
        if !(0.0..360.0).contains(&self.rotation) {
            return Err(StickerError::validation(
                "sticker rotation must be within [0, 360)",
            ));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(StickerError::validation("sticker aspect ratio must be > 0"));
        }
        self.crop.validate(MIN_CROP_PERCENT)
    }

    /// Identifier.
    pub fn id(&self) -> StickerId {
        self.id
    }

    /// Current (possibly cropped) image source.
    pub fn src(&self) -> &ImageRef {
        &self.src
    }

    /// Image source as uploaded; never changes.
    pub fn original_src(&self) -> &ImageRef {
        &self.original_src
    }

    /// Center in UV space.
    pub fn center(&self) -> Uv {
        Uv {
            u: self.uv_x,
            v: self.uv_y,
        }
    }

    /// Fraction of the larger texture edge covered by the sticker's longest edge.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Rotation about the sticker's own center, degrees in `[0, 360)`.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Width over height of the current source.
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Paint-order position; lowest paints first.
    pub fn z_index(&self) -> usize {
        self.z_index
    }

    /// Pending interactive crop.
    pub fn crop(&self) -> CropRect {
        self.crop
    }

    /// Pixel size on a canvas whose larger edge is `max_edge`.
    pub fn pixel_size(&self, max_edge: f64) -> (f64, f64) {
        footprint(self.scale, self.aspect_ratio, max_edge)
    }

    /// Pixel center on a `width x height` canvas (`v` flipped to row space).
    pub fn pixel_center(&self, width: f64, height: f64) -> (f64, f64) {
        (self.uv_x * width, (1.0 - self.uv_y) * height)
    }

    fn apply(&mut self, patch: &StickerPatch) {
        if let Some(v) = patch.uv_x {
            self.uv_x = v;
        }
        if let Some(v) = patch.uv_y {
            self.uv_y = v;
        }
        if let Some(v) = patch.scale {
            self.scale = if v.is_finite() {
                v.clamp(MIN_SCALE, MAX_SCALE)
            } else {
                v
            };
        }
        if let Some(v) = patch.rotation {
            self.rotation = wrap_degrees(v);
        }
        if let Some(v) = patch.aspect_ratio {
            self.aspect_ratio = v;
        }
        if let Some(v) = patch.crop {
            self.crop = v;
        }
        if let Some(v) = &patch.src {
            self.src = v.clone();
        }
    }

    /// Return a copy with `patch` applied, or an error if the result breaks an invariant.
    pub(crate) fn patched(&self, patch: &StickerPatch) -> StickerResult<Self> {
        let mut next = self.clone();
        next.apply(patch);
        next.validate()?;
        Ok(next)
    }
}

/// Partial sticker update. `None` fields are left unchanged.
///
/// Scale is clamped into `[0.05, 0.5]` and rotation wrapped into `[0, 360)`; other fields are
/// validated as given. Identity, original source and z-index are not patchable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StickerPatch {
    /// New UV x.
    pub uv_x: Option<f64>,
    /// New UV y.
    pub uv_y: Option<f64>,
    /// New scale.
    pub scale: Option<f64>,
    /// New rotation in degrees.
    pub rotation: Option<f64>,
    /// New aspect ratio.
    pub aspect_ratio: Option<f64>,
    /// New crop rectangle.
    pub crop: Option<CropRect>,
    /// New image source.
    pub src: Option<ImageRef>,
}

impl StickerPatch {
    /// Move the center.
    pub fn center(uv: Uv) -> Self {
        Self {
            uv_x: Some(uv.u),
            uv_y: Some(uv.v),
            ..Self::default()
        }
    }

    /// Change rotation.
    pub fn rotation(deg: f64) -> Self {
        Self {
            rotation: Some(deg),
            ..Self::default()
        }
    }

    /// Change scale.
    pub fn scale(scale: f64) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    /// Change the interactive crop.
    pub fn crop(crop: CropRect) -> Self {
        Self {
            crop: Some(crop),
            ..Self::default()
        }
    }

    /// `true` when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sticker/model.rs"]
mod tests;
