//! Stickerbake places raster "stickers" on the UV-mapped surface of a textured model and
//! bakes them into one composite color texture per mesh.
//!
//! The public API is session-oriented:
//!
//! - Load a model's per-mesh PBR maps into an [`EditorSession`]
//! - Add stickers and drive them with pointer gestures (drag, rotate, resize, crop)
//! - Poll or flush the bake to get composites assigned to each mesh's [`Material`]
//!
//! Rasterization runs on the CPU (`vello_cpu`) in premultiplied RGBA8. Stickers are always
//! drawn in ascending z-index order, whatever order their images finish decoding in.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod bake;
pub(crate) mod color_mode;
pub(crate) mod editor;
pub(crate) mod scene;
pub(crate) mod sticker;
pub(crate) mod uv;

pub use crate::foundation::config::EditorConfig;
pub use crate::foundation::core::{
    Affine, DEFAULT_TEXTURE_EDGE, Point, Rect, Rgba8Premul, Size, TextureSize, Vec2,
};
pub use crate::foundation::error::{StickerError, StickerResult};

pub use crate::assets::color::Color;
pub use crate::assets::decode::{DecodedImage, decode_image, encode_png};
pub use crate::assets::store::{
    FsFetcher, ImageFetcher, ImageRef, ImageStore, MemoryFetcher, normalize_rel_path,
};

pub use crate::uv::gesture::{
    ResizeGesture, ResizeOutcome, RotateGesture, rotation_from_delta, sticker_frame_size,
};
pub use crate::uv::transform::{Uv, drag_center, pointer_angle_deg, screen_to_uv, uv_to_screen};

pub use crate::sticker::crop::{
    CropDrag, CropEngine, CropHandle, CropState, adjust_crop, commit_crop, crop_pixels,
    rasterize_crop,
};
pub use crate::sticker::model::{
    CropRect, MAX_SCALE, MIN_CROP_PERCENT, MIN_SCALE, Sticker, StickerId, StickerPatch, footprint,
};
pub use crate::sticker::stack::{Reorder, StickerStack};

pub use crate::bake::material::{Material, MaterialStore, MeshId, PbrSnapshot, Texture};
pub use crate::bake::pipeline::{BakeOutput, BakePipeline, BaseLayer};
pub use crate::bake::schedule::{BakeTicket, Debouncer, GenerationCounter};

pub use crate::color_mode::{ColorMode, ColorModeState};
pub use crate::editor::gesture::GestureKind;
pub use crate::editor::session::EditorSession;
pub use crate::scene::model::{MeshDef, SceneDef, StickerDef};
