//! Viewport visibility tests.
//!
//! Culling is conservative: a quad is dropped only when its axis-aligned bounds miss the
//! viewport entirely, so enabling it never removes visible pixels.

use glam::{Mat4, Vec3};

use crate::coords::{Rect, Vec2, Viewport};

/// Whether world-space `bounds` overlap the viewport (edges touching count as visible).
pub fn bounds_visible(bounds: Rect, viewport: Viewport) -> bool {
    if !viewport.is_valid() || !bounds.is_finite() {
        return true;
    }
    bounds.touches(viewport.bounds())
}

/// Whether a node-local rectangle of `size` (origin at the node's origin) is visible once
/// `transform` is applied.
///
/// Compares the transformed center against the viewport center using the rectangle's
/// half-extents projected onto the screen axes.
pub fn rect_visible(transform: &Mat4, size: Vec2, viewport: Viewport) -> bool {
    if !viewport.is_valid() {
        return true;
    }
    let (hw, hh) = (size.x * 0.5, size.y * 0.5);
    let center = transform.transform_point3(Vec3::new(hw, hh, 0.0));

    let x_axis = transform.x_axis;
    let y_axis = transform.y_axis;
    let extent_x = (hw * x_axis.x + hh * y_axis.x).abs().max((hw * x_axis.x - hh * y_axis.x).abs());
    let extent_y = (hw * x_axis.y + hh * y_axis.y).abs().max((hw * x_axis.y - hh * y_axis.y).abs());

    let (half_w, half_h) = (viewport.width * 0.5, viewport.height * 0.5);
    let dx = (center.x - half_w).abs() - extent_x;
    let dy = (center.y - half_h).abs() - extent_y;
    dx <= half_w && dy <= half_h
}
