//! Which base appearance the bake paints stickers onto.

use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::bake::material::MaterialStore;
use crate::bake::pipeline::BakePipeline;
use crate::foundation::error::StickerResult;

/// Base appearance selector.
///
/// Serializes as `"original"` or `{"custom": "#rrggbb"}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// The model's own color map (or base color when it has none).
    #[default]
    Original,
    /// A flat user-picked color.
    Custom(Color),
}

/// `Original <-> Custom(color)` state machine.
///
/// Orthogonal to the sticker stack: it only decides the background layer and restores the
/// original maps on reset.
#[derive(Clone, Debug, Default)]
pub struct ColorModeState {
    mode: ColorMode,
}

impl ColorModeState {
    /// Starts in [`ColorMode::Original`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// A model was (re)loaded: back to `Original` without touching materials.
    pub fn on_model_load(&mut self) {
        self.mode = ColorMode::Original;
    }

    /// Swatch picked. Returns `true` when the mode changed and a rebake is due.
    pub fn pick(&mut self, color: Color) -> bool {
        let next = ColorMode::Custom(color);
        if self.mode == next {
            return false;
        }
        self.mode = next;
        true
    }

    /// Explicit reset to `Original`.
    ///
    /// Restores every mesh's maps and base color verbatim from its snapshot. Returns `true`
    /// when stickers remain and must be baked again on top of the restored texture. Resetting
    /// while already `Original` does nothing.
    pub fn reset(
        &mut self,
        pipeline: &BakePipeline,
        materials: &mut MaterialStore,
        has_stickers: bool,
    ) -> StickerResult<bool> {
        if self.mode == ColorMode::Original {
            return Ok(false);
        }
        let meshes: Vec<_> = materials.mesh_ids().collect();
        for mesh in meshes {
            pipeline.restore_original(mesh, materials)?;
        }
        self.mode = ColorMode::Original;
        tracing::debug!(has_stickers, "color mode reset to original");
        Ok(has_stickers)
    }
}

#[cfg(test)]
#[path = "../tests/unit/color_mode.rs"]
mod tests;
