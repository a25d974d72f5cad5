/// Adapter and device parameters for [`HeadlessGpu`](super::HeadlessGpu).
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may pick from.
    pub backends: wgpu::Backends,

    /// Adapter preference.
    pub power_preference: wgpu::PowerPreference,

    /// Request the software fallback adapter instead of a hardware one.
    pub force_fallback_adapter: bool,

    /// Color format of offscreen targets created by [`HeadlessGpu`](super::HeadlessGpu).
    pub color_format: wgpu::TextureFormat,

    /// Required wgpu features. The batching pipelines need none.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
        }
    }
}
