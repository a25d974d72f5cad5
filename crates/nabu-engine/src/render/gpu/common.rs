//! GPU-side layouts shared by the wgpu backend.

use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;
use crate::render::BackendError;
use crate::scene::{BlendFactor, BlendFunc, Vertex};

// ── blend ─────────────────────────────────────────────────────────────────

fn blend_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstColor => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
    }
}

/// Same equation for color and alpha.
pub(super) fn blend_state(func: BlendFunc) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(func.src),
        dst_factor: blend_factor(func.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: component, alpha: component }
}

// ── viewport uniform ──────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ViewportUniform {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2], // 16-byte alignment
}

impl ViewportUniform {
    #[inline]
    pub(super) fn new(viewport: Viewport) -> Self {
        Self {
            viewport: [viewport.width.max(1.0), viewport.height.max(1.0)],
            _pad: [0.0; 2],
        }
    }

    #[inline]
    pub(super) fn min_binding_size() -> Option<wgpu::BufferSize> {
        wgpu::BufferSize::new(std::mem::size_of::<ViewportUniform>() as u64)
    }
}

// ── vertex layout ─────────────────────────────────────────────────────────

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Unorm8x4,  // color
    2 => Float32x2  // tex_coords
];

pub(super) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

// ── uploads ───────────────────────────────────────────────────────────────

/// Size of a buffer upload of `bytes`, padded to `COPY_BUFFER_ALIGNMENT`.
///
/// `Ok(None)` for an empty upload. Uploads that do not fit in `limit` bytes fail before
/// anything is encoded.
pub(super) fn upload_size(
    bytes: u64,
    limit: u64,
) -> Result<Option<wgpu::BufferSize>, BackendError> {
    let padded = bytes.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
    if padded > limit {
        return Err(BackendError::BufferAllocation { requested: bytes, limit });
    }
    Ok(wgpu::BufferSize::new(padded))
}
