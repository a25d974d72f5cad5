use anyhow::{Context, Result};

use crate::coords::Viewport;

use super::GpuInit;

/// wgpu device without a window.
///
/// Owns Instance/Adapter/Device/Queue and creates offscreen color targets. Windowed
/// applications own their own surface and only need a device, queue and format to drive
/// a [`WgpuBackend`](crate::render::WgpuBackend).
pub struct HeadlessGpu {
    /// Kept alive for the adapter's lifetime.
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
}

/// Offscreen render target (texture + view) in physical pixels.
pub struct OffscreenTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    /// Logical viewport matching the target at scale 1.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }
}

impl HeadlessGpu {
    /// Acquires an adapter and device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("nabu-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("headless gpu: using adapter {:?}", adapter.get_info().name);

        Ok(Self {
            _instance: instance,
            adapter,
            device,
            queue,
            color_format: init.color_format,
        })
    }

    /// Blocking variant of [`new`](Self::new).
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    #[inline]
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Creates a color target usable both as a render attachment and as a texture
    /// (for off-screen groups composited back into the main scene).
    pub fn create_target(&self, width: u32, height: u32) -> Result<OffscreenTarget> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("nabu offscreen target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(OffscreenTarget { texture, view, width, height })
    }

    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("nabu frame encoder"),
        })
    }

    /// Submits recorded commands.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
