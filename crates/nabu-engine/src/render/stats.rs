/// Per-frame draw statistics. Reset by `Renderer::clean()`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DrawStats {
    /// GPU submissions issued (batched flushes plus whatever custom commands report).
    pub drawn_batches: usize,
    /// Vertices contributed by the frame's commands: 4 per quad, culled or not, plus
    /// custom command reports.
    pub drawn_vertices: usize,
    /// Quads left out of the batch by visibility culling. Their vertices still count in
    /// `drawn_vertices`.
    pub culled_quads: usize,
}

impl DrawStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
