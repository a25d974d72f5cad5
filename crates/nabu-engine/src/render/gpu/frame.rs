use wgpu::util::StagingBelt;

use crate::coords::Viewport;
use crate::paint::Color;
use crate::render::{BackendError, RenderBackend};
use crate::scene::{MaterialId, Quad, Vertex};

use super::common::upload_size;
use super::WgpuBackend;

/// Where a frame is drawn: device handles, the encoder and the color attachment.
pub struct FrameTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    /// Logical size of the target; positions are mapped to NDC against it.
    pub viewport: Viewport,
    /// Clear color, or `None` to draw over existing contents.
    pub clear: Option<Color>,
}

/// A frame being recorded by the [`WgpuBackend`].
///
/// Each submission records a copy of its geometry into the backend's buffers followed
/// by a render pass that draws it. The encoder runs them in that order, so one batch
/// sized buffer serves the whole frame. Size and resource errors come back from the
/// submission itself, and therefore from `Renderer::render`.
pub struct WgpuFrame<'a> {
    backend: &'a mut WgpuBackend,
    target: FrameTarget<'a>,
    passes: usize,
    cleared: bool,
}

impl<'a> WgpuFrame<'a> {
    pub(super) fn new(backend: &'a mut WgpuBackend, target: FrameTarget<'a>) -> Self {
        let cleared = target.clear.is_none();
        Self { backend, target, passes: 0, cleared }
    }

    /// Draws encoded so far, one render pass each.
    #[inline]
    pub fn draw_count(&self) -> usize {
        self.passes
    }

    /// Ends the frame. Clears the target if nothing was drawn and a clear was requested,
    /// then closes the staging belt. Submit the encoder afterwards.
    pub fn finish(mut self) {
        if !self.cleared {
            let load = self.load_op();
            drop(begin_pass(self.target.encoder, self.target.color_view, load));
        }
        self.backend.belt.finish();
    }

    /// The first pass of the frame clears; the rest load.
    fn load_op(&mut self) -> wgpu::LoadOp<wgpu::Color> {
        let load = match self.target.clear {
            Some(c) if !self.cleared => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            _ => wgpu::LoadOp::Load,
        };
        self.cleared = true;
        load
    }
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("nabu batch pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

/// Records a copy of `bytes` to the start of `target`.
fn stage(
    belt: &mut StagingBelt,
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::Buffer,
    bytes: &[u8],
    size: wgpu::BufferSize,
) {
    let mut view = belt.write_buffer(encoder, target, 0, size);
    view[..bytes.len()].copy_from_slice(bytes);
}

impl RenderBackend for WgpuFrame<'_> {
    fn submit_batch(
        &mut self,
        material: MaterialId,
        quads: &[Quad],
        _indices: &[u16],
    ) -> Result<(), BackendError> {
        let bytes: &[u8] = bytemuck::cast_slice(quads);
        let Some(size) = upload_size(bytes.len() as u64, self.backend.quad_vbo.size())? else {
            return Ok(());
        };
        let (pipeline, texture) = self.backend.prepare_material(self.target.device, material)?;

        let backend = &mut *self.backend;
        stage(&mut backend.belt, self.target.encoder, &backend.quad_vbo, bytes, size);

        // The shared index buffer already holds the pattern for a full batch.
        let index_count = (quads.len() * Quad::INDEX_COUNT) as u32;
        let load = self.load_op();
        let backend = &*self.backend;
        let mut pass = begin_pass(self.target.encoder, self.target.color_view, load);
        backend.bind(&mut pass, pipeline, texture)?;
        pass.set_vertex_buffer(0, backend.quad_vbo.slice(..size.get()));
        pass.set_index_buffer(backend.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..index_count, 0, 0..1);
        drop(pass);

        self.passes += 1;
        Ok(())
    }

    fn draw_triangles(
        &mut self,
        material: MaterialId,
        vertices: &[Vertex],
        indices: &[u16],
    ) -> Result<(), BackendError> {
        let limit = self.backend.max_buffer_size;
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);
        let (Some(vertex_size), Some(index_size)) = (
            upload_size(vertex_bytes.len() as u64, limit)?,
            upload_size(index_bytes.len() as u64, limit)?,
        ) else {
            return Ok(());
        };
        let (pipeline, texture) = self.backend.prepare_material(self.target.device, material)?;

        let backend = &mut *self.backend;
        backend.ensure_custom_capacity(self.target.device, vertex_size.get(), index_size.get());
        let encoder = &mut *self.target.encoder;
        stage(&mut backend.belt, encoder, &backend.custom_vbo, vertex_bytes, vertex_size);
        stage(&mut backend.belt, encoder, &backend.custom_ibo, index_bytes, index_size);

        let load = self.load_op();
        let backend = &*self.backend;
        let mut pass = begin_pass(self.target.encoder, self.target.color_view, load);
        backend.bind(&mut pass, pipeline, texture)?;
        pass.set_vertex_buffer(0, backend.custom_vbo.slice(..vertex_size.get()));
        pass.set_index_buffer(
            backend.custom_ibo.slice(..index_size.get()),
            wgpu::IndexFormat::Uint16,
        );
        pass.draw_indexed(0..indices.len() as u32, 0, 0..1);
        drop(pass);

        self.passes += 1;
        Ok(())
    }
}
