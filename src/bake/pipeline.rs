use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::assets::store::{ImageRef, ImageStore};
use crate::bake::material::{MaterialStore, MeshId, PbrSnapshot, Texture};
use crate::bake::raster::BakeCanvas;
use crate::bake::schedule::{BakeTicket, GenerationCounter};
use crate::color_mode::ColorMode;
use crate::foundation::config::EditorConfig;
use crate::foundation::core::TextureSize;
use crate::foundation::error::{StickerError, StickerResult};
use crate::sticker::model::{Sticker, StickerId};

/// What a bake painted under the stickers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseLayer {
    /// Flat custom color.
    Custom(Color),
    /// The mesh's original color map, stretched to the canvas.
    OriginalMap,
    /// The mesh's stored base color (no usable color map).
    BaseColor(Color),
}

/// Finished composite, not yet assigned to a material.
#[derive(Clone, Debug)]
pub struct BakeOutput {
    /// Ticket the bake was started with.
    pub ticket: BakeTicket,
    /// Composite color texture.
    pub texture: Texture,
    /// Background used.
    pub base: BaseLayer,
    /// Stickers drawn, in paint order.
    pub drawn: Vec<StickerId>,
    /// Stickers skipped because their image failed to load.
    pub skipped: Vec<StickerId>,
}

/// Composites base appearance plus sticker stack into one color texture per mesh.
///
/// Owns each mesh's [`PbrSnapshot`] for the lifetime of the loaded model, keyed by
/// [`MeshId`], and the per-mesh generation counter that decides which result is current.
#[derive(Debug)]
pub struct BakePipeline {
    snapshots: HashMap<MeshId, PbrSnapshot>,
    generations: GenerationCounter,
    default_size: TextureSize,
    parallel_decode: bool,
}

impl BakePipeline {
    /// Pipeline using `cfg`'s fallback canvas size and decode mode.
    pub fn new(cfg: &EditorConfig) -> Self {
        Self {
            snapshots: HashMap::new(),
            generations: GenerationCounter::default(),
            default_size: TextureSize::square(cfg.default_texture_size.max(1)),
            parallel_decode: cfg.parallel_decode,
        }
    }

    /// Record a mesh's original maps. Called once per mesh at model load.
    pub fn capture(&mut self, mesh: MeshId, snapshot: PbrSnapshot) {
        self.snapshots.insert(mesh, snapshot);
    }

    /// Snapshot captured for `mesh`.
    pub fn snapshot(&self, mesh: MeshId) -> Option<&PbrSnapshot> {
        self.snapshots.get(&mesh)
    }

    /// Forget every snapshot and generation (model unload).
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.generations.reset();
    }

    /// Canvas size for `mesh`: its original color map's size, else the configured default.
    pub fn canvas_size(&self, mesh: MeshId) -> TextureSize {
        self.snapshots
            .get(&mesh)
            .and_then(|s| s.map.as_ref())
            .map(|t| t.image.size())
            .unwrap_or(self.default_size)
    }

    /// Start a bake of `mesh`, superseding any bake of it still in flight.
    pub fn begin(&mut self, mesh: MeshId) -> BakeTicket {
        self.generations.issue(mesh)
    }

    /// `true` when `ticket` is still the latest bake issued for its mesh.
    pub fn is_current(&self, ticket: BakeTicket) -> bool {
        self.generations.is_current(ticket)
    }

    /// Rasterize the composite for `ticket`.
    ///
    /// Stickers are drawn strictly in ascending z-index order. Their images may be decoded
    /// concurrently, but each layer is drawn only after every layer below it, so stacking never
    /// depends on decode latency. A sticker whose image fails to load is logged and skipped.
    /// Returns `Ok(None)` when no canvas can be created for the mesh; the caller keeps the
    /// previous composite.
    #[tracing::instrument(
        skip_all,
        fields(mesh = ticket.mesh.0, generation = ticket.generation)
    )]
    pub fn render(
        &self,
        ticket: BakeTicket,
        mode: ColorMode,
        stickers: &[Sticker],
        store: &ImageStore,
    ) -> StickerResult<Option<BakeOutput>> {
        let snapshot = self.snapshots.get(&ticket.mesh).ok_or_else(|| {
            StickerError::validation(format!("no snapshot for mesh {}", ticket.mesh.0))
        })?;
        let size = self.canvas_size(ticket.mesh);
        let Some(mut canvas) = BakeCanvas::new(size) else {
            tracing::warn!(
                width = size.width,
                height = size.height,
                "no drawing canvas available; keeping previous composite"
            );
            return Ok(None);
        };

        let base = paint_base(&mut canvas, mode, snapshot);

        let mut ordered: Vec<&Sticker> = stickers.iter().collect();
        ordered.sort_by_key(|s| s.z_index());
        let srcs: Vec<ImageRef> = ordered.iter().map(|s| s.src().clone()).collect();
        let images = store.load_ordered(&srcs, self.parallel_decode);

        let max_edge = f64::from(size.max_edge());
        let (w, h) = (f64::from(size.width), f64::from(size.height));
        let mut drawn = Vec::with_capacity(ordered.len());
        let mut skipped = Vec::new();
        for (sticker, image) in ordered.into_iter().zip(images) {
            let drew = image.and_then(|img| draw_sticker(&mut canvas, sticker, &img, w, h, max_edge));
            match drew {
                Ok(()) => drawn.push(sticker.id()),
                Err(e) => {
                    tracing::warn!(
                        sticker = sticker.id().as_u64(),
                        src = %sticker.src(),
                        error = %e,
                        "skipping sticker layer"
                    );
                    skipped.push(sticker.id());
                }
            }
        }

        let image = canvas.finish()?;
        tracing::debug!(
            width = size.width,
            height = size.height,
            drawn = drawn.len(),
            skipped = skipped.len(),
            "bake rendered"
        );
        Ok(Some(BakeOutput {
            ticket,
            texture: Texture::baked(image),
            base,
            drawn,
            skipped,
        }))
    }

    /// Assign a finished composite to its mesh's material.
    ///
    /// Stale results (a newer bake of the same mesh was started) are dropped and `false` is
    /// returned. Otherwise the composite becomes the color map, the other PBR maps are
    /// reassigned from the snapshot untouched, and the material is flagged for update.
    pub fn apply(&self, output: BakeOutput, materials: &mut MaterialStore) -> StickerResult<bool> {
        let mesh = output.ticket.mesh;
        if !self.generations.is_current(output.ticket) {
            tracing::trace!(
                mesh = mesh.0,
                generation = output.ticket.generation,
                "discarding superseded bake"
            );
            return Ok(false);
        }
        let snapshot = self
            .snapshots
            .get(&mesh)
            .ok_or_else(|| StickerError::validation(format!("no snapshot for mesh {}", mesh.0)))?;
        let material = materials.get_mut(mesh)?;
        material.map = Some(output.texture);
        material.restore_secondary_maps(snapshot);
        material.color = match output.base {
            BaseLayer::OriginalMap => snapshot.base_color,
            BaseLayer::Custom(_) | BaseLayer::BaseColor(_) => Color::WHITE,
        };
        material.needs_update();
        Ok(true)
    }

    /// Begin, render and apply one bake of `mesh`. Returns `true` when a composite was applied.
    pub fn bake(
        &mut self,
        mesh: MeshId,
        mode: ColorMode,
        stickers: &[Sticker],
        store: &ImageStore,
        materials: &mut MaterialStore,
    ) -> StickerResult<bool> {
        let ticket = self.begin(mesh);
        match self.render(ticket, mode, stickers, store)? {
            Some(out) => self.apply(out, materials),
            None => Ok(false),
        }
    }

    /// Bake every mesh in `materials`. Returns how many composites were applied.
    pub fn bake_all(
        &mut self,
        mode: ColorMode,
        stickers: &[Sticker],
        store: &ImageStore,
        materials: &mut MaterialStore,
    ) -> StickerResult<usize> {
        let meshes: Vec<MeshId> = materials.mesh_ids().collect();
        let mut applied = 0;
        for mesh in meshes {
            if self.bake(mesh, mode, stickers, store, materials)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Put `mesh`'s material back exactly as captured.
    pub fn restore_original(
        &self,
        mesh: MeshId,
        materials: &mut MaterialStore,
    ) -> StickerResult<()> {
        let snapshot = self
            .snapshots
            .get(&mesh)
            .ok_or_else(|| StickerError::validation(format!("no snapshot for mesh {}", mesh.0)))?;
        materials.get_mut(mesh)?.restore(snapshot);
        Ok(())
    }
}

fn paint_base(canvas: &mut BakeCanvas, mode: ColorMode, snapshot: &PbrSnapshot) -> BaseLayer {
    match mode {
        ColorMode::Custom(color) => {
            canvas.fill(color);
            BaseLayer::Custom(color)
        }
        ColorMode::Original => {
            let Some(map) = &snapshot.map else {
                canvas.fill(snapshot.base_color);
                return BaseLayer::BaseColor(snapshot.base_color);
            };
            // The composite is uploaded unflipped, so a flipped source is drawn upside down.
            match canvas.draw_stretched(&map.image, map.flip_y) {
                Ok(()) => BaseLayer::OriginalMap,
                Err(e) => {
                    tracing::warn!(error = %e, "original color map unusable; using base color");
                    canvas.fill(snapshot.base_color);
                    BaseLayer::BaseColor(snapshot.base_color)
                }
            }
        }
    }
}

fn draw_sticker(
    canvas: &mut BakeCanvas,
    sticker: &Sticker,
    img: &Arc<DecodedImage>,
    width: f64,
    height: f64,
    max_edge: f64,
) -> StickerResult<()> {
    let (sw, sh) = sticker.pixel_size(max_edge);
    if !(sw > 0.0 && sh > 0.0) {
        return Err(StickerError::bake("sticker has an empty footprint"));
    }
    let center = sticker.pixel_center(width, height);
    canvas.draw_rotated(img, center, sw, sh, sticker.rotation())
}

#[cfg(test)]
#[path = "../../tests/unit/bake/pipeline.rs"]
mod tests;
