use crate::scene::{MaterialId, Quad, Vertex};

use super::{BackendError, DrawStats};

/// Receiver of GPU submissions.
///
/// The renderer calls [`submit_batch`](RenderBackend::submit_batch) once per flush and
/// never holds on to the slices it passes. Implementations must copy what they need
/// before returning: the staging buffer is rewritten by the next batch.
pub trait RenderBackend {
    /// Draws `quads` as one submission with `material`.
    ///
    /// `indices` is the shared two-triangles-per-quad pattern, relative to the first
    /// vertex of `quads`, and holds exactly `quads.len() * 6` entries.
    fn submit_batch(
        &mut self,
        material: MaterialId,
        quads: &[Quad],
        indices: &[u16],
    ) -> Result<(), BackendError>;

    /// Draws arbitrary indexed triangles outside the batching path. Used by custom
    /// commands.
    fn draw_triangles(
        &mut self,
        material: MaterialId,
        vertices: &[Vertex],
        indices: &[u16],
    ) -> Result<(), BackendError>;
}

/// What a custom command sees while it draws.
///
/// Custom draws are not counted automatically; report them with
/// [`add_drawn_batches`](Self::add_drawn_batches) and
/// [`add_drawn_vertices`](Self::add_drawn_vertices).
pub struct CustomDrawCtx<'a> {
    backend: &'a mut dyn RenderBackend,
    stats: &'a mut DrawStats,
}

impl<'a> CustomDrawCtx<'a> {
    #[inline]
    pub(crate) fn new(backend: &'a mut dyn RenderBackend, stats: &'a mut DrawStats) -> Self {
        Self { backend, stats }
    }

    #[inline]
    pub fn backend(&mut self) -> &mut dyn RenderBackend {
        &mut *self.backend
    }

    #[inline]
    pub fn add_drawn_batches(&mut self, n: usize) {
        self.stats.drawn_batches += n;
    }

    #[inline]
    pub fn add_drawn_vertices(&mut self, n: usize) {
        self.stats.drawn_vertices += n;
    }

    /// Draws triangles through the backend and records one batch and `vertices.len()`
    /// vertices.
    pub fn draw_triangles(
        &mut self,
        material: MaterialId,
        vertices: &[Vertex],
        indices: &[u16],
    ) -> Result<(), BackendError> {
        self.backend.draw_triangles(material, vertices, indices)?;
        self.add_drawn_batches(1);
        self.add_drawn_vertices(vertices.len());
        Ok(())
    }
}
