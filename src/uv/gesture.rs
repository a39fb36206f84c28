use crate::foundation::core::{Point, Rect, Size};
use crate::foundation::math::wrap_degrees;
use crate::sticker::model::{MAX_SCALE, MIN_SCALE, footprint};
use crate::uv::transform::pointer_angle_deg;

/// Rotation-handle gesture.
///
/// The handle revolves with the sticker, so rotation follows the pointer's angle *delta*
/// around the pivot rather than its absolute angle; grabbing never makes the sticker jump.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotateGesture {
    center: Point,
    pointer_angle0: f64,
    rotation0: f64,
}

impl RotateGesture {
    /// Capture the pivot, the grab angle and the sticker's rotation at grab time.
    pub fn begin(center: Point, pointer: Point, rotation_deg: f64) -> Self {
        Self {
            center,
            pointer_angle0: pointer_angle_deg(pointer, center),
            rotation0: rotation_deg,
        }
    }

    /// Rotation in `[0, 360)` for the current pointer position.
    pub fn update(&self, pointer: Point) -> f64 {
        let angle = pointer_angle_deg(pointer, self.center);
        rotation_from_delta(self.rotation0, angle - self.pointer_angle0)
    }

    /// Pivot captured at grab time.
    pub fn center(&self) -> Point {
        self.center
    }
}

/// `(rotation0 + delta) mod 360`.
pub fn rotation_from_delta(rotation0: f64, delta_deg: f64) -> f64 {
    wrap_degrees(rotation0 + delta_deg)
}

/// Result of one resize update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeOutcome {
    /// On-screen width in pixels.
    pub width_px: f64,
    /// On-screen height in pixels, derived from the fixed aspect ratio.
    pub height_px: f64,
    /// Normalized scale relative to the larger frame edge.
    pub scale: f64,
}

/// Diagonal resize-handle gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeGesture {
    start: Point,
    start_width: f64,
    aspect_ratio: f64,
    frame_max_edge: f64,
    min_width: f64,
}

impl ResizeGesture {
    /// Capture the grab point and the sticker's current on-screen width.
    pub fn begin(
        pointer: Point,
        scale: f64,
        aspect_ratio: f64,
        frame: Rect,
        min_width_px: f64,
    ) -> Self {
        let frame_max_edge = frame.abs().width().max(frame.abs().height());
        let size = sticker_frame_size(scale, aspect_ratio, frame);
        Self {
            start: pointer,
            start_width: size.width,
            aspect_ratio: sanitize_aspect(aspect_ratio),
            frame_max_edge,
            min_width: min_width_px,
        }
    }

    /// Size and scale for the current pointer position.
    ///
    /// The larger of the two axis deltas drives the width; height follows the aspect ratio.
    pub fn update(&self, pointer: Point) -> ResizeOutcome {
        let dx = pointer.x - self.start.x;
        let dy = pointer.y - self.start.y;
        let width_px = (self.start_width + dx.max(dy)).max(self.min_width);
        let height_px = width_px / self.aspect_ratio;
        let scale = if self.frame_max_edge > 0.0 {
            (width_px.max(height_px) / self.frame_max_edge).clamp(MIN_SCALE, MAX_SCALE)
        } else {
            MIN_SCALE
        };
        ResizeOutcome {
            width_px,
            height_px,
            scale,
        }
    }
}

/// On-screen footprint of a sticker inside `frame`, using the same sizing rule as the bake.
pub fn sticker_frame_size(scale: f64, aspect_ratio: f64, frame: Rect) -> Size {
    let frame = frame.abs();
    let (w, h) = footprint(scale, aspect_ratio, frame.width().max(frame.height()));
    Size::new(w, h)
}

fn sanitize_aspect(aspect_ratio: f64) -> f64 {
    if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        aspect_ratio
    } else {
        1.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/uv/gesture.rs"]
mod tests;
