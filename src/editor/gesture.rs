use crate::foundation::core::{Point, Rect};
use crate::sticker::model::{StickerId, StickerPatch};
use crate::uv::gesture::{ResizeGesture, RotateGesture};
use crate::uv::transform::{Uv, drag_center};

/// Which kind of gesture is currently active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    /// Moving a sticker's center.
    Drag,
    /// Rotation handle.
    Rotate,
    /// Diagonal resize handle.
    Resize,
    /// Crop handle on the thumbnail.
    Crop,
}

/// The single gesture an editor session may hold between pointer-down and pointer-up.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ActiveGesture {
    Drag {
        sticker: StickerId,
        start: Point,
        start_center: Uv,
        frame: Rect,
    },
    Rotate {
        sticker: StickerId,
        gesture: RotateGesture,
    },
    Resize {
        sticker: StickerId,
        gesture: ResizeGesture,
    },
    Crop {
        sticker: StickerId,
    },
}

impl ActiveGesture {
    pub(crate) fn kind(&self) -> GestureKind {
        match self {
            Self::Drag { .. } => GestureKind::Drag,
            Self::Rotate { .. } => GestureKind::Rotate,
            Self::Resize { .. } => GestureKind::Resize,
            Self::Crop { .. } => GestureKind::Crop,
        }
    }

    pub(crate) fn sticker(&self) -> StickerId {
        match *self {
            Self::Drag { sticker, .. }
            | Self::Rotate { sticker, .. }
            | Self::Resize { sticker, .. }
            | Self::Crop { sticker } => sticker,
        }
    }

    /// Transform patch for `pointer`. Crop moves are handled by the crop engine instead.
    pub(crate) fn transform_patch(&self, pointer: Point) -> Option<StickerPatch> {
        match self {
            Self::Drag {
                start,
                start_center,
                frame,
                ..
            } => Some(StickerPatch::center(drag_center(
                *start_center,
                pointer - *start,
                *frame,
            ))),
            Self::Rotate { gesture, .. } => Some(StickerPatch::rotation(gesture.update(pointer))),
            Self::Resize { gesture, .. } => Some(StickerPatch::scale(gesture.update(pointer).scale)),
            Self::Crop { .. } => None,
        }
    }
}
