use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::foundation::core::DEFAULT_TEXTURE_EDGE;
use crate::foundation::error::{StickerError, StickerResult};
use crate::sticker::model::{MAX_SCALE, MIN_CROP_PERCENT, MIN_SCALE};

/// Editor and bake tuning knobs.
///
/// Every field has a default, so a config file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Trailing-edge debounce window for rebakes, in milliseconds. `0` bakes on every change.
    pub debounce_ms: u64,
    /// Canvas edge used when a mesh has no original color map.
    pub default_texture_size: u32,
    /// Scale assigned to freshly added stickers.
    pub default_sticker_scale: f64,
    /// Smallest on-screen sticker width reachable by the resize handle.
    pub min_resize_px: f64,
    /// Smallest crop width/height, in percent of the image. At least 5.
    pub min_crop_percent: f64,
    /// Decode sticker images concurrently. Drawing order is unaffected.
    pub parallel_decode: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 0,
            default_texture_size: DEFAULT_TEXTURE_EDGE,
            default_sticker_scale: 0.15,
            min_resize_px: 24.0,
            min_crop_percent: 5.0,
            parallel_decode: true,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> StickerResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| StickerError::serde(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> StickerResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Reject values the editor cannot operate with.
    pub fn validate(&self) -> StickerResult<()> {
        if self.default_texture_size == 0 {
            return Err(StickerError::validation(
                "default_texture_size must be > 0",
            ));
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.default_sticker_scale) {
            return Err(StickerError::validation(format!(
                "default_sticker_scale must be within [{MIN_SCALE}, {MAX_SCALE}]"
            )));
        }
        if !self.min_resize_px.is_finite() || self.min_resize_px <= 0.0 {
            return Err(StickerError::validation("min_resize_px must be > 0"));
        }
        if !(MIN_CROP_PERCENT..=100.0).contains(&self.min_crop_percent) {
            return Err(StickerError::validation(format!(
                "min_crop_percent must be within [{MIN_CROP_PERCENT}, 100]"
            )));
        }
        Ok(())
    }

    pub(crate) fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
