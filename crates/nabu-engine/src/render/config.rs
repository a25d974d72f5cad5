use crate::coords::Viewport;

use super::VBO_SIZE;

/// Construction parameters for the [`Renderer`](super::Renderer).
///
/// Keep this structure small. Every field has a default suitable for a 2D scene.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Quads staged before a forced flush.
    ///
    /// Must be in `1..=MAX_BATCH_CAPACITY` so every vertex index fits in `u16`.
    pub batch_capacity: usize,

    /// Slots reserved up front in each bucket of every render queue.
    pub queue_reserve: usize,

    /// Drop quads whose bounds lie entirely outside `viewport`.
    pub culling: bool,

    /// Visible area in logical pixels. `None` disables culling.
    pub viewport: Option<Viewport>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            batch_capacity: VBO_SIZE,
            queue_reserve: 64,
            culling: true,
            viewport: None,
        }
    }
}

impl RendererConfig {
    #[inline]
    pub fn with_batch_capacity(mut self, batch_capacity: usize) -> Self {
        self.batch_capacity = batch_capacity;
        self
    }

    #[inline]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    #[inline]
    pub fn with_culling(mut self, culling: bool) -> Self {
        self.culling = culling;
        self
    }
}
