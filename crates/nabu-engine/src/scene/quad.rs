use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::coords::{Rect, Vec2};
use crate::paint::Color;

/// GPU vertex: position, packed color, texture coordinate.
///
/// Layout is `#[repr(C)]` and 24 bytes wide:
/// - `position`: 3 x f32 at offset 0 (logical pixels, z unused by the built-in programs)
/// - `color`: 4 x u8 at offset 12 (premultiplied RGBA, normalized by the GPU)
/// - `tex_coords`: 2 x f32 at offset 16
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    #[inline]
    pub const fn new(position: [f32; 3], color: [u8; 4], tex_coords: [f32; 2]) -> Self {
        Self { position, color, tex_coords }
    }
}

/// One textured, colored quad: four vertices forming two triangles.
///
/// Corner order matters: with `top_left, bottom_left, top_right, bottom_right` the shared
/// index pattern `{0, 1, 2, 3, 2, 1}` yields two counter-clockwise triangles.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Quad {
    pub top_left: Vertex,
    pub bottom_left: Vertex,
    pub top_right: Vertex,
    pub bottom_right: Vertex,
}

impl Quad {
    pub const VERTEX_COUNT: usize = 4;
    pub const INDEX_COUNT: usize = 6;

    /// Builds an axis-aligned quad covering `rect`, sampling `uv` (normalized texture
    /// coordinates, top-left origin) and tinted by `color`.
    pub fn from_rect(rect: Rect, uv: Rect, color: Color) -> Self {
        let r = rect.normalized();
        let (min, max) = (r.min(), r.max());
        let (uv_min, uv_max) = (uv.min(), uv.max());
        let c = color.to_rgba8();

        Self {
            top_left: Vertex::new([min.x, min.y, 0.0], c, [uv_min.x, uv_min.y]),
            bottom_left: Vertex::new([min.x, max.y, 0.0], c, [uv_min.x, uv_max.y]),
            top_right: Vertex::new([max.x, min.y, 0.0], c, [uv_max.x, uv_min.y]),
            bottom_right: Vertex::new([max.x, max.y, 0.0], c, [uv_max.x, uv_max.y]),
        }
    }

    /// Untextured quad over `rect`.
    #[inline]
    pub fn solid(rect: Rect, color: Color) -> Self {
        Self::from_rect(rect, Rect::new(0.0, 0.0, 1.0, 1.0), color)
    }

    #[inline]
    pub fn vertices(&self) -> [Vertex; 4] {
        [self.top_left, self.bottom_left, self.top_right, self.bottom_right]
    }

    /// Returns the quad with every vertex position multiplied by `model_view`.
    pub fn transformed(&self, model_view: &Mat4) -> Self {
        let apply = |v: Vertex| {
            let p = model_view.transform_point3(Vec3::from_array(v.position));
            Vertex { position: p.to_array(), ..v }
        };
        Self {
            top_left: apply(self.top_left),
            bottom_left: apply(self.bottom_left),
            top_right: apply(self.top_right),
            bottom_right: apply(self.bottom_right),
        }
    }

    /// Axis-aligned bounds of the vertex positions (x/y only).
    pub fn bounds(&self) -> Rect {
        let vs = self.vertices();
        let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for v in vs {
            min.x = min.x.min(v.position[0]);
            min.y = min.y.min(v.position[1]);
            max.x = max.x.max(v.position[0]);
            max.y = max.y.max(v.position[1]);
        }
        Rect::from_min_max(min, max)
    }
}

/// Index pattern for `quad_count` consecutive quads in a vertex stream.
///
/// Block `i` is `{4i, 4i+1, 4i+2, 4i+3, 4i+2, 4i+1}`. Callers keep `quad_count * 4` within
/// `u16` range.
pub fn quad_indices(quad_count: usize) -> Vec<u16> {
    let mut indices = Vec::with_capacity(quad_count * Quad::INDEX_COUNT);
    for i in 0..quad_count {
        let base = (i * Quad::VERTEX_COUNT) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 3, base + 2, base + 1]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_24_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::size_of::<Quad>(), 96);
        assert_eq!(std::mem::offset_of!(Vertex, color), 12);
        assert_eq!(std::mem::offset_of!(Vertex, tex_coords), 16);
    }

    #[test]
    fn index_blocks_follow_two_triangle_pattern() {
        let idx = quad_indices(3);
        assert_eq!(idx.len(), 18);
        assert_eq!(&idx[0..6], &[0, 1, 2, 3, 2, 1]);
        assert_eq!(&idx[12..18], &[8, 9, 10, 11, 10, 9]);
    }

    #[test]
    fn from_rect_places_corners() {
        let q = Quad::solid(Rect::new(10.0, 20.0, 4.0, 6.0), Color::white());
        assert_eq!(q.top_left.position, [10.0, 20.0, 0.0]);
        assert_eq!(q.bottom_left.position, [10.0, 26.0, 0.0]);
        assert_eq!(q.top_right.position, [14.0, 20.0, 0.0]);
        assert_eq!(q.bottom_right.position, [14.0, 26.0, 0.0]);
        assert_eq!(q.bottom_right.tex_coords, [1.0, 1.0]);
        assert_eq!(q.top_left.color, [255, 255, 255, 255]);
    }

    #[test]
    fn nan_alpha_color_builds_a_transparent_quad() {
        let q = Quad::solid(
            Rect::new(0.0, 0.0, 1.0, 1.0),
            Color::from_straight(1.0, 1.0, 1.0, f32::NAN),
        );
        assert!(q.vertices().iter().all(|v| v.color == [0, 0, 0, 0]));
    }

    #[test]
    fn transformed_translates_positions_and_keeps_attributes() {
        let q = Quad::solid(Rect::new(0.0, 0.0, 2.0, 2.0), Color::white());
        let t = q.transformed(&Mat4::from_translation(Vec3::new(5.0, -1.0, 0.0)));
        assert_eq!(t.top_left.position, [5.0, -1.0, 0.0]);
        assert_eq!(t.bottom_right.position, [7.0, 1.0, 0.0]);
        assert_eq!(t.bottom_right.tex_coords, q.bottom_right.tex_coords);
    }

    #[test]
    fn bounds_cover_rotated_quad() {
        let q = Quad::solid(Rect::new(-1.0, -1.0, 2.0, 2.0), Color::white());
        let r = q
            .transformed(&Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4))
            .bounds();
        let h = std::f32::consts::SQRT_2;
        assert!((r.origin.x + h).abs() < 1e-5);
        assert!((r.size.x - 2.0 * h).abs() < 1e-5);
    }
}
