use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::foundation::core::{Affine, TextureSize};
use crate::foundation::error::{StickerError, StickerResult};

/// Offscreen 2D canvas a bake draws into, backed by `vello_cpu`.
///
/// Draw calls are recorded in order and resolved by [`BakeCanvas::finish`]; later draws paint
/// over earlier ones.
pub(crate) struct BakeCanvas {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl BakeCanvas {
    /// Canvas of `size`, or `None` when the rasterizer cannot provide one.
    pub(crate) fn new(size: TextureSize) -> Option<Self> {
        let (width, height) = size.as_canvas_dims()?;
        Some(Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            width,
            height,
        })
    }

    /// Flat-fill the whole canvas.
    pub(crate) fn fill(&mut self, color: Color) {
        self.reset_state();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
    }

    /// Draw `img` scaled to cover the whole canvas, upside down when `flip_rows` is set.
    pub(crate) fn draw_stretched(
        &mut self,
        img: &DecodedImage,
        flip_rows: bool,
    ) -> StickerResult<()> {
        let sx = f64::from(self.width) / f64::from(img.width);
        let sy = f64::from(self.height) / f64::from(img.height);
        let tr = if flip_rows {
            Affine::translate((0.0, f64::from(self.height))) * Affine::scale_non_uniform(sx, -sy)
        } else {
            Affine::scale_non_uniform(sx, sy)
        };
        self.draw_image(img, tr)
    }

    /// Draw `img` at `width x height` pixels centered on `center`, rotated by `rotation_deg`
    /// about that center.
    pub(crate) fn draw_rotated(
        &mut self,
        img: &DecodedImage,
        center: (f64, f64),
        width: f64,
        height: f64,
        rotation_deg: f64,
    ) -> StickerResult<()> {
        let tr = Affine::translate(center)
            * Affine::rotate(rotation_deg.to_radians())
            * Affine::translate((-width / 2.0, -height / 2.0))
            * Affine::scale_non_uniform(
                width / f64::from(img.width),
                height / f64::from(img.height),
            );
        self.draw_image(img, tr)
    }

    /// Resolve all recorded draws into a premultiplied RGBA8 image.
    pub(crate) fn finish(mut self) -> StickerResult<DecodedImage> {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);
        DecodedImage::from_premul(
            u32::from(self.width),
            u32::from(self.height),
            pixmap.data_as_u8_slice().to_vec(),
        )
    }

    fn draw_image(&mut self, img: &DecodedImage, tr: Affine) -> StickerResult<()> {
        let paint = image_paint(img)?;
        self.reset_state();
        self.ctx.set_transform(affine_to_cpu(tr));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(img.width),
            f64::from(img.height),
        ));
        Ok(())
    }

    fn reset_state(&mut self) {
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_paint(img: &DecodedImage) -> StickerResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StickerResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StickerError::bake("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StickerError::bake("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StickerError::bake("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/bake/raster.rs"]
mod tests;
