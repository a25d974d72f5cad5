//! wgpu implementation of [`RenderBackend`](super::RenderBackend).
//!
//! One shader serves both built-in programs; pipelines are created lazily per
//! `(program, blend)` pair and textures are bound per draw through a small bind group
//! table keyed by [`TextureId`].
//!
//! Every submission is uploaded and drawn when it is made: the geometry is copied into a
//! vertex buffer sized for one batch, through a staging belt on the frame's encoder,
//! and a render pass drawing it is encoded right after the copy.

mod common;
mod frame;

use std::collections::HashMap;

use wgpu::util::{DeviceExt, StagingBelt};

use crate::scene::{quad_indices, BlendFunc, Material, MaterialId, Program, Quad, TextureId};

use super::{BackendError, MAX_BATCH_CAPACITY};

use common::{blend_state, vertex_layout, ViewportUniform};

pub use frame::{FrameTarget, WgpuFrame};

type PipelineKey = (Program, BlendFunc);

const QUAD_BYTES: u64 = std::mem::size_of::<Quad>() as u64;

/// Persistent GPU resources for drawing batches with wgpu.
///
/// Per frame, call [`frame`](Self::frame) to get a [`WgpuFrame`], hand it to
/// `Renderer::render`, call [`WgpuFrame::finish`], then submit the encoder before the
/// next frame starts.
pub struct WgpuBackend {
    format: wgpu::TextureFormat,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: HashMap<TextureId, wgpu::BindGroup>,
    next_texture: u32,

    viewport_ubo: wgpu::Buffer,
    globals: wgpu::BindGroup,

    /// Geometry of one batch; never larger than `batch_capacity` quads.
    quad_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,

    /// Custom draws; grown on demand up to `max_buffer_size`.
    custom_vbo: wgpu::Buffer,
    custom_ibo: wgpu::Buffer,
    max_buffer_size: u64,

    belt: StagingBelt,
}

impl WgpuBackend {
    /// Creates the backend for color targets of `format`.
    ///
    /// `batch_capacity` sizes the batch vertex and index buffers and should match
    /// `RendererConfig::batch_capacity`. Larger submissions fail with
    /// [`BackendError::BufferAllocation`].
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        batch_capacity: usize,
    ) -> Result<Self, BackendError> {
        let capacity = batch_capacity.clamp(1, MAX_BATCH_CAPACITY);
        let max_buffer_size = device.limits().max_buffer_size;
        let quad_vbo_size = capacity as u64 * QUAD_BYTES;
        if quad_vbo_size > max_buffer_size {
            return Err(BackendError::BufferAllocation {
                requested: quad_vbo_size,
                limit: max_buffer_size,
            });
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("nabu quad shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nabu globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: ViewportUniform::min_binding_size(),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("nabu texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("nabu quad pipeline layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nabu viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nabu globals bind group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nabu sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let pattern = quad_indices(capacity);
        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nabu quad ibo"),
            contents: bytemuck::cast_slice(&pattern),
            usage: wgpu::BufferUsages::INDEX,
        });

        let quad_vbo = vertex_buffer(device, "nabu quad vbo", quad_vbo_size);
        let custom_vbo = vertex_buffer(device, "nabu custom vbo", 64 * QUAD_BYTES);
        let custom_ibo = index_buffer(device, 256);

        let mut backend = Self {
            format,
            shader,
            pipeline_layout,
            pipelines: HashMap::new(),
            texture_layout,
            sampler,
            textures: HashMap::new(),
            next_texture: 1,
            viewport_ubo,
            globals,
            quad_vbo,
            quad_ibo,
            custom_vbo,
            custom_ibo,
            max_buffer_size,
            belt: StagingBelt::new(device.clone(), quad_vbo_size.max(1 << 16)),
        };

        // `TextureId::NONE` samples opaque white so untextured quads keep their color.
        let white = backend.upload_rgba8(device, queue, 1, 1, &[255; 4], "nabu white texture");
        let bind_group = backend.texture_bind_group(device, &white);
        backend.textures.insert(TextureId::NONE, bind_group);

        log::debug!("wgpu backend: batch buffers sized for {capacity} quads");
        Ok(backend)
    }

    /// Quads one batch submission may hold.
    #[inline]
    pub fn batch_capacity(&self) -> usize {
        (self.quad_vbo.size() / QUAD_BYTES) as usize
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Registers a texture view (for example a render target used for off-screen groups)
    /// and returns the id to put in a [`Material`].
    pub fn register_texture(
        &mut self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
    ) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        let bind_group = self.texture_bind_group(device, view);
        self.textures.insert(id, bind_group);
        id
    }

    /// Uploads straight RGBA8 pixels (`width * height * 4` bytes) and registers them.
    pub fn create_texture_rgba8(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId, BackendError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(BackendError::Device(format!(
                "texture data is {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }
        let view = self.upload_rgba8(device, queue, width, height, pixels, "nabu texture");
        Ok(self.register_texture(device, &view))
    }

    /// Forgets a texture. Returns `false` for unknown ids; `TextureId::NONE` is kept.
    pub fn release_texture(&mut self, id: TextureId) -> bool {
        id != TextureId::NONE && self.textures.remove(&id).is_some()
    }

    fn upload_rgba8(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
        label: &str,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("nabu texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Starts recording a frame into `target`.
    ///
    /// The encoder of the previous frame must have been submitted; its staging memory is
    /// reclaimed here.
    pub fn frame<'a>(&'a mut self, target: FrameTarget<'a>) -> WgpuFrame<'a> {
        self.belt.recall();
        target.queue.write_buffer(
            &self.viewport_ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform::new(target.viewport)),
        );
        WgpuFrame::new(self, target)
    }

    /// Binds the pipeline, viewport and texture of a prepared material.
    fn bind(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        key: PipelineKey,
        texture: TextureId,
    ) -> Result<(), BackendError> {
        let Some(pipeline) = self.pipelines.get(&key) else {
            return Err(BackendError::Device(format!("pipeline {key:?} was not prepared")));
        };
        let Some(bind_group) = self.textures.get(&texture) else {
            return Err(BackendError::UnknownTexture(texture.0));
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.globals, &[]);
        pass.set_bind_group(1, bind_group, &[]);
        Ok(())
    }

    /// Decodes `material`, checks its texture and makes sure its pipeline exists.
    fn prepare_material(
        &mut self,
        device: &wgpu::Device,
        material: MaterialId,
    ) -> Result<(PipelineKey, TextureId), BackendError> {
        let Material { program, texture, blend } = material
            .material()
            .ok_or(BackendError::UnsupportedProgram(material.0))?;
        if !self.textures.contains_key(&texture) {
            return Err(BackendError::UnknownTexture(texture.0));
        }
        let key = (program, blend);
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.create_pipeline(device, program, blend);
            self.pipelines.insert(key, pipeline);
        }
        Ok((key, texture))
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        program: Program,
        blend: BlendFunc,
    ) -> wgpu::RenderPipeline {
        log::debug!("wgpu backend: creating pipeline for {program:?} / {blend:?}");

        let fragment_entry = match program {
            Program::PositionTextureColor => "fs_textured",
            Program::PositionColor => "fs_color",
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("nabu quad pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some(fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: Some(blend_state(blend)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    /// Grows the custom draw buffers to hold `vertex_bytes` and `index_bytes`.
    ///
    /// Both sizes are already checked against `max_buffer_size`.
    fn ensure_custom_capacity(
        &mut self,
        device: &wgpu::Device,
        vertex_bytes: u64,
        index_bytes: u64,
    ) {
        if vertex_bytes > self.custom_vbo.size() {
            let size = vertex_bytes.next_power_of_two().min(self.max_buffer_size);
            log::debug!("wgpu backend: growing custom vertex buffer to {size} bytes");
            self.custom_vbo = vertex_buffer(device, "nabu custom vbo", size);
        }
        if index_bytes > self.custom_ibo.size() {
            let size = index_bytes.next_power_of_two().min(self.max_buffer_size);
            self.custom_ibo = index_buffer(device, size);
        }
    }
}

fn vertex_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn index_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("nabu custom ibo"),
        size,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
