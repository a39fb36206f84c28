use std::time::Instant;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;
use crate::assets::store::{ImageRef, ImageStore};
use crate::bake::material::{MaterialStore, MeshId, PbrSnapshot};
use crate::bake::pipeline::BakePipeline;
use crate::bake::schedule::Debouncer;
use crate::color_mode::{ColorMode, ColorModeState};
use crate::editor::gesture::{ActiveGesture, GestureKind};
use crate::foundation::config::EditorConfig;
use crate::foundation::core::{Point, Rect, Size};
use crate::foundation::error::{StickerError, StickerResult};
use crate::sticker::crop::{CropEngine, CropHandle, commit_crop};
use crate::sticker::model::{CropRect, Sticker, StickerId, StickerPatch};
use crate::sticker::stack::{Reorder, StickerStack};
use crate::uv::gesture::{ResizeGesture, RotateGesture};
use crate::uv::transform::uv_to_screen;

/// Event-driven editor facade.
///
/// Pointer events and UI actions mutate the sticker stack and color mode; every change marks
/// the composite dirty, and [`EditorSession::poll_bake`] rebakes every mesh once the configured
/// debounce window has passed. At most one gesture is active at a time. It is released on
/// pointer-up, pointer-cancel, when its sticker is removed, or with the session itself.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    store: ImageStore,
    stack: StickerStack,
    crop: CropEngine,
    color: ColorModeState,
    pipeline: BakePipeline,
    materials: MaterialStore,
    debouncer: Debouncer,
    gesture: Option<ActiveGesture>,
}

impl EditorSession {
    /// Session with no model loaded.
    pub fn new(config: EditorConfig, store: ImageStore) -> StickerResult<Self> {
        config.validate()?;
        Ok(Self {
            crop: CropEngine::new(config.min_crop_percent),
            pipeline: BakePipeline::new(&config),
            debouncer: Debouncer::new(config.debounce()),
            config,
            store,
            stack: StickerStack::new(),
            color: ColorModeState::new(),
            materials: MaterialStore::new(),
            gesture: None,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Image store used for stickers and crop results.
    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Sticker stack.
    pub fn stack(&self) -> &StickerStack {
        &self.stack
    }

    /// Live materials, one per mesh.
    pub fn materials(&self) -> &MaterialStore {
        &self.materials
    }

    /// Bake pipeline (holds the original map snapshots).
    pub fn pipeline(&self) -> &BakePipeline {
        &self.pipeline
    }

    /// Current color mode.
    pub fn color_mode(&self) -> ColorMode {
        self.color.mode()
    }

    /// Kind of gesture currently held, if any.
    pub fn active_gesture(&self) -> Option<GestureKind> {
        self.gesture.map(|g| g.kind())
    }

    /// Replace the loaded model. Each snapshot becomes one mesh, in order.
    ///
    /// Color mode returns to `Original`; existing stickers are kept and rebaked onto the new
    /// meshes.
    pub fn load_model(&mut self, meshes: Vec<PbrSnapshot>) -> Vec<MeshId> {
        self.pointer_cancel();
        self.materials.clear();
        self.pipeline.clear();
        self.color.on_model_load();
        let ids: Vec<MeshId> = meshes
            .into_iter()
            .map(|snapshot| {
                let id = self.materials.push(&snapshot);
                self.pipeline.capture(id, snapshot);
                id
            })
            .collect();
        tracing::debug!(meshes = ids.len(), "model loaded");
        if !self.stack.is_empty() {
            self.mark_dirty();
        }
        ids
    }

    /// Add a sticker for `src`, loading it to learn its size. The new sticker is selected.
    pub fn add_sticker(&mut self, src: ImageRef) -> StickerResult<StickerId> {
        let img = self.store.load(&src)?;
        let id = self
            .stack
            .add(src, img.width, img.height, self.config.default_sticker_scale)?;
        self.mark_dirty();
        Ok(id)
    }

    /// Add a sticker for an image already decoded by the host.
    pub fn add_sticker_image(&mut self, image: DecodedImage) -> StickerResult<StickerId> {
        let src = self.store.insert(image);
        self.add_sticker(src)
    }

    /// Remove a sticker, releasing any gesture held on it.
    pub fn remove_sticker(&mut self, id: StickerId) -> StickerResult<Sticker> {
        if self.gesture.is_some_and(|g| g.sticker() == id) {
            self.pointer_cancel();
        }
        let removed = self.stack.remove(id)?;
        self.mark_dirty();
        Ok(removed)
    }

    /// Select a sticker.
    pub fn select(&mut self, id: StickerId) -> StickerResult<()> {
        self.stack.select(id)
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.stack.deselect();
    }

    /// Move a sticker to the top or bottom of paint order.
    pub fn reorder(&mut self, id: StickerId, to: Reorder) -> StickerResult<()> {
        self.stack.reorder(id, to)?;
        self.mark_dirty();
        Ok(())
    }

    /// Apply a partial update (e.g. from a slider).
    pub fn update_sticker(&mut self, id: StickerId, patch: &StickerPatch) -> StickerResult<()> {
        self.stack.update(id, patch)?;
        if !patch.is_empty() {
            self.mark_dirty();
        }
        Ok(())
    }

    /// Swatch picked: bake onto a flat `color`.
    pub fn pick_color(&mut self, color: Color) {
        if self.color.pick(color) {
            self.mark_dirty();
        }
    }

    /// Back to the original maps. Stickers, if any, are rebaked on top of them.
    pub fn reset_color(&mut self) -> StickerResult<()> {
        let has_stickers = !self.stack.is_empty();
        if self
            .color
            .reset(&self.pipeline, &mut self.materials, has_stickers)?
        {
            self.mark_dirty();
        }
        Ok(())
    }

    /// Grab a sticker body to move it inside `frame`.
    pub fn pointer_down_drag(
        &mut self,
        id: StickerId,
        pointer: Point,
        frame: Rect,
    ) -> StickerResult<()> {
        let start_center = self.sticker(id)?.center();
        self.grab(ActiveGesture::Drag {
            sticker: id,
            start: pointer,
            start_center,
            frame,
        })
    }

    /// Grab a sticker's rotation handle.
    pub fn pointer_down_rotate(
        &mut self,
        id: StickerId,
        pointer: Point,
        frame: Rect,
    ) -> StickerResult<()> {
        let s = self.sticker(id)?;
        let center = uv_to_screen(s.center(), frame);
        let gesture = RotateGesture::begin(center, pointer, s.rotation());
        self.grab(ActiveGesture::Rotate {
            sticker: id,
            gesture,
        })
    }

    /// Grab a sticker's resize handle.
    pub fn pointer_down_resize(
        &mut self,
        id: StickerId,
        pointer: Point,
        frame: Rect,
    ) -> StickerResult<()> {
        let s = self.sticker(id)?;
        let gesture = ResizeGesture::begin(
            pointer,
            s.scale(),
            s.aspect_ratio(),
            frame,
            self.config.min_resize_px,
        );
        self.grab(ActiveGesture::Resize {
            sticker: id,
            gesture,
        })
    }

    /// Grab a crop handle on a thumbnail rendered at `thumb` pixels.
    pub fn pointer_down_crop(
        &mut self,
        id: StickerId,
        handle: CropHandle,
        pointer: Point,
        thumb: Size,
    ) -> StickerResult<()> {
        self.sticker(id)?;
        self.pointer_cancel();
        let crop = self.sticker(id)?.crop();
        self.crop.begin(id, handle, pointer, crop, thumb)?;
        self.stack.select(id)?;
        self.gesture = Some(ActiveGesture::Crop { sticker: id });
        Ok(())
    }

    /// Pointer moved. Returns `true` when a sticker changed.
    pub fn pointer_move(&mut self, pointer: Point) -> StickerResult<bool> {
        let Some(gesture) = self.gesture else {
            return Ok(false);
        };
        let id = gesture.sticker();
        match gesture.transform_patch(pointer) {
            Some(patch) => {
                self.stack.update(id, &patch)?;
                self.mark_dirty();
            }
            None => {
                // The pending crop only changes the thumbnail; the composite is unaffected
                // until the crop is committed.
                let Some((sticker, crop)) = self.crop.update(pointer) else {
                    return Ok(false);
                };
                self.stack.update(sticker, &StickerPatch::crop(crop))?;
            }
        }
        Ok(true)
    }

    /// Pointer released: end the gesture. A crop gesture commits its crop.
    ///
    /// If the commit fails the sticker keeps the source and crop it had at grab time.
    pub fn pointer_up(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        if !matches!(gesture, ActiveGesture::Crop { .. }) {
            return;
        }
        let Some(drag) = self.crop.release() else {
            return;
        };
        if let Err(e) = self.commit_crop(drag.sticker) {
            tracing::warn!(
                sticker = drag.sticker.as_u64(),
                error = %e,
                "crop commit failed; keeping previous source"
            );
            self.restore_crop(drag.sticker, drag.start_crop);
        }
    }

    /// Bake a sticker's pending crop into a new source. Returns `false` when the crop is the
    /// full image and nothing changed. On error the sticker is left unchanged.
    ///
    /// A previous in-memory crop result is evicted from the store once nothing references it.
    pub fn commit_crop(&mut self, id: StickerId) -> StickerResult<bool> {
        let sticker = self.sticker(id)?;
        let previous = sticker.src().clone();
        let original = sticker.original_src().clone();
        let Some(patch) = commit_crop(&self.store, sticker)? else {
            return Ok(false);
        };
        if let Err(e) = self.stack.update(id, &patch) {
            if let Some(src) = &patch.src {
                self.store.evict(src);
            }
            return Err(e);
        }
        if previous.is_memory()
            && previous != original
            && !self.stack.iter().any(|s| s.src() == &previous)
        {
            tracing::trace!(src = %previous, "evicting superseded crop");
            self.store.evict(&previous);
        }
        self.mark_dirty();
        Ok(true)
    }

    /// Pointer cancelled: end the gesture without committing. A crop returns to its grab-time
    /// rectangle.
    pub fn pointer_cancel(&mut self) {
        if self.gesture.take().is_none() {
            return;
        }
        if let Some((sticker, crop)) = self.crop.cancel() {
            self.restore_crop(sticker, crop);
        }
    }

    /// `true` while a change is waiting to be baked.
    pub fn is_bake_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Rebake every mesh if a change is pending and its debounce window has elapsed at `now`.
    /// Returns the number of composites applied.
    pub fn poll_bake(&mut self, now: Instant) -> StickerResult<usize> {
        if !self.debouncer.take_ready_at(now) {
            return Ok(0);
        }
        self.bake_now()
    }

    /// Rebake immediately if anything is pending, ignoring the debounce window.
    pub fn flush_bake(&mut self) -> StickerResult<usize> {
        if !self.debouncer.take_now() {
            return Ok(0);
        }
        self.bake_now()
    }

    /// Rebake every mesh now, pending or not.
    pub fn rebake(&mut self) -> StickerResult<usize> {
        self.debouncer.take_now();
        self.bake_now()
    }

    fn bake_now(&mut self) -> StickerResult<usize> {
        self.pipeline.bake_all(
            self.color.mode(),
            self.stack.paint_order(),
            &self.store,
            &mut self.materials,
        )
    }

    fn grab(&mut self, gesture: ActiveGesture) -> StickerResult<()> {
        self.pointer_cancel();
        self.stack.select(gesture.sticker())?;
        self.gesture = Some(gesture);
        Ok(())
    }

    fn restore_crop(&mut self, id: StickerId, crop: CropRect) {
        if self.stack.get(id).is_none() {
            return;
        }
        if let Err(e) = self.stack.update(id, &StickerPatch::crop(crop)) {
            tracing::warn!(sticker = id.as_u64(), error = %e, "could not restore crop");
        }
    }

    fn sticker(&self, id: StickerId) -> StickerResult<&Sticker> {
        self.stack
            .get(id)
            .ok_or_else(|| StickerError::validation(format!("unknown sticker id {}", id.as_u64())))
    }

    fn mark_dirty(&mut self) {
        self.debouncer.notify_at(Instant::now());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/session.rs"]
mod tests;
