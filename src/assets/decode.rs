use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{Rgba8Premul, TextureSize};
use crate::foundation::error::{StickerError, StickerResult};
use crate::foundation::math::mul_div255_u8;

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Wrap premultiplied bytes, checking the length against the dimensions.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> StickerResult<Self> {
        let size = TextureSize::new(width, height)?;
        if rgba8_premul.len() != size.byte_len() {
            return Err(StickerError::validation(format!(
                "image byte len {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// A `width x height` image filled with one color.
    pub fn solid(width: u32, height: u32, px: Rgba8Premul) -> StickerResult<Self> {
        let size = TextureSize::new(width, height)?;
        let mut bytes = vec![0u8; size.byte_len()];
        for c in bytes.chunks_exact_mut(4) {
            c.copy_from_slice(&px.to_array());
        }
        Self::from_premul(width, height, bytes)
    }

    /// Image dimensions.
    pub fn size(&self) -> TextureSize {
        TextureSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.rgba8_premul.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copy out as a straight-alpha `image::RgbaImage`.
    pub fn to_rgba_image(&self) -> StickerResult<image::RgbaImage> {
        let mut straight = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| StickerError::validation("image buffer does not match dimensions"))
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> StickerResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| StickerError::decode(format!("decode image from memory: {e}")))?;
    Ok(from_rgba_image(dyn_img.to_rgba8()))
}

/// Encode a decoded image as a straight-alpha PNG.
pub fn encode_png(img: &DecodedImage) -> StickerResult<Vec<u8>> {
    let rgba = img.to_rgba_image()?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

pub(crate) fn from_rgba_image(rgba: image::RgbaImage) -> DecodedImage {
    let (width, height) = rgba.dimensions();
    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
