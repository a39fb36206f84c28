use crate::foundation::error::{StickerError, StickerResult};
use crate::foundation::math::mul_div255_u8;

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Fallback canvas edge used when a mesh has no original color map.
pub const DEFAULT_TEXTURE_EDGE: u32 = 2048;

/// Texture (bake canvas) dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TextureSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureSize {
    /// Create a validated size with both edges non-zero.
    pub fn new(width: u32, height: u32) -> StickerResult<Self> {
        if width == 0 || height == 0 {
            return Err(StickerError::validation(
                "TextureSize width and height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }

    /// Square texture with edge `edge`.
    pub fn square(edge: u32) -> Self {
        Self {
            width: edge,
            height: edge,
        }
    }

    /// Larger of the two edges; sticker `scale` is relative to this.
    pub fn max_edge(self) -> u32 {
        self.width.max(self.height)
    }

    /// Edges as `u16`, or `None` when the rasterizer cannot allocate a canvas this large.
    pub fn as_canvas_dims(self) -> Option<(u16, u16)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let w = u16::try_from(self.width).ok()?;
        let h = u16::try_from(self.height).ok()?;
        Some((w, h))
    }

    /// Number of RGBA8 bytes for a buffer of this size.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        let premul = |c: u8| mul_div255_u8(u16::from(c), u16::from(a));
        Self {
            r: premul(r),
            g: premul(g),
            b: premul(b),
            a,
        }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
