use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::assets::store::ImageRef;
use crate::color_mode::ColorMode;
use crate::foundation::error::{StickerError, StickerResult};
use crate::sticker::model::CropRect;
use crate::uv::transform::Uv;

/// One mesh's original material: image sources for each PBR map plus a base color.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshDef {
    /// Color map.
    pub map: Option<ImageRef>,
    /// Normal map.
    pub normal_map: Option<ImageRef>,
    /// Roughness map.
    pub roughness_map: Option<ImageRef>,
    /// Metalness map.
    pub metalness_map: Option<ImageRef>,
    /// Ambient-occlusion map.
    pub ao_map: Option<ImageRef>,
    /// Emissive map.
    pub emissive_map: Option<ImageRef>,
    /// Base color; white when omitted.
    pub base_color: Option<Color>,
}

/// A sticker as placed in a scene file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StickerDef {
    /// Image source.
    pub src: ImageRef,
    /// Center in UV space.
    #[serde(default = "uv_center")]
    pub uv: Uv,
    /// Scale; the configured default when omitted.
    #[serde(default)]
    pub scale: Option<f64>,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Crop in percent of the image, committed when the scene is loaded.
    #[serde(default)]
    pub crop: Option<CropRect>,
}

fn uv_center() -> Uv {
    Uv::CENTER
}

/// JSON scene: meshes, stickers in paint order, and the color mode to bake with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    /// Meshes of the model, in load order.
    pub meshes: Vec<MeshDef>,
    /// Stickers, bottom first.
    #[serde(default)]
    pub stickers: Vec<StickerDef>,
    /// Base appearance.
    #[serde(default)]
    pub color_mode: ColorMode,
}

impl SceneDef {
    /// Parse a scene from JSON text.
    pub fn from_json_str(s: &str) -> StickerResult<Self> {
        serde_json::from_str(s).map_err(|e| StickerError::serde(format!("parse scene JSON: {e}")))
    }

    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> StickerResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| StickerError::serde(format!("parse scene JSON: {e}")))
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> StickerResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            StickerError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
