//! Mapping between frame (editor viewport) pixels and normalized UV space.
//!
//! The frame is re-measured per interaction, so every function takes it explicitly. UV `v`
//! grows upwards (`1` is the top of the texture) while screen `y` grows downwards.

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Point, Rect, Vec2};
use crate::foundation::math::clamp01;

/// Normalized texture coordinate, each component in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Uv {
    /// Horizontal coordinate, `0` at the left edge.
    pub u: f64,
    /// Vertical coordinate, `1` at the top edge.
    pub v: f64,
}

impl Uv {
    /// Texture center.
    pub const CENTER: Self = Self { u: 0.5, v: 0.5 };

    /// Build a UV point, clamping both components into `[0, 1]`.
    pub fn clamped(u: f64, v: f64) -> Self {
        Self {
            u: clamp01(u),
            v: clamp01(v),
        }
    }
}

/// Map a screen point to UV, clamping to the frame.
pub fn screen_to_uv(point: Point, frame: Rect) -> Uv {
    let frame = frame.abs();
    let w = frame.width();
    let h = frame.height();
    let fx = if w > 0.0 { (point.x - frame.x0) / w } else { 0.0 };
    let fy = if h > 0.0 { (point.y - frame.y0) / h } else { 0.0 };
    Uv {
        u: clamp01(fx),
        v: 1.0 - clamp01(fy),
    }
}

/// Map a UV point to its screen position inside `frame`.
pub fn uv_to_screen(uv: Uv, frame: Rect) -> Point {
    let frame = frame.abs();
    Point::new(
        frame.x0 + clamp01(uv.u) * frame.width(),
        frame.y0 + (1.0 - clamp01(uv.v)) * frame.height(),
    )
}

/// New sticker center after dragging by `delta` screen pixels from `start`.
///
/// The delta is applied in pixels and the result clamped to the frame before converting back,
/// so a sticker pushed past an edge stays on the edge and comes back as soon as the pointer
/// reverses.
pub fn drag_center(start: Uv, delta: Vec2, frame: Rect) -> Uv {
    let frame = frame.abs();
    let p = uv_to_screen(start, frame) + delta;
    let clamped = Point::new(
        p.x.clamp(frame.x0, frame.x1),
        p.y.clamp(frame.y0, frame.y1),
    );
    screen_to_uv(clamped, frame)
}

/// Angle of `pointer` around `center`, in degrees (`atan2` convention, screen axes).
pub fn pointer_angle_deg(pointer: Point, center: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees()
}

#[cfg(test)]
#[path = "../../tests/unit/uv/transform.rs"]
mod tests;
