//! In-memory backend that records submissions instead of drawing them.
//!
//! Useful for headless runs and for asserting batching behavior in tests.

use crate::scene::{MaterialId, Quad, Vertex};

use super::{BackendError, RenderBackend};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SubmissionKind {
    /// A flushed quad batch.
    Batch,
    /// Triangles issued by a custom command.
    Triangles,
}

/// One recorded GPU submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub kind: SubmissionKind,
    pub material: MaterialId,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Submission {
    /// Number of quads in a batch submission (vertices / 4).
    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / Quad::VERTEX_COUNT
    }
}

/// Backend that keeps every submission for inspection.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    submissions: Vec<Submission>,
    fail_at: Option<usize>,
    batch_limit: Option<usize>,
}

impl RecordingBackend {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`-th submission (0-based) fail with a device error.
    #[inline]
    pub fn failing_at(n: usize) -> Self {
        Self { fail_at: Some(n), ..Self::default() }
    }

    /// Rejects batches of more than `quads` quads, as a GPU backend with a smaller batch
    /// buffer than the renderer's capacity would.
    #[inline]
    pub fn with_batch_limit(quads: usize) -> Self {
        Self { batch_limit: Some(quads), ..Self::default() }
    }

    #[inline]
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Recorded batch submissions only.
    pub fn batches(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.iter().filter(|s| s.kind == SubmissionKind::Batch)
    }

    /// Material of every submission, in order.
    pub fn materials(&self) -> Vec<MaterialId> {
        self.submissions.iter().map(|s| s.material).collect()
    }

    pub fn total_vertices(&self) -> usize {
        self.submissions.iter().map(|s| s.vertices.len()).sum()
    }

    /// Vertices in submission order, concatenated.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.submissions.iter().flat_map(|s| s.vertices.iter())
    }

    #[inline]
    pub fn clear(&mut self) {
        self.submissions.clear();
    }

    fn record(&mut self, submission: Submission) -> Result<(), BackendError> {
        if self.fail_at == Some(self.submissions.len()) {
            return Err(BackendError::Device("injected failure".into()));
        }
        self.submissions.push(submission);
        Ok(())
    }
}

impl RenderBackend for RecordingBackend {
    fn submit_batch(
        &mut self,
        material: MaterialId,
        quads: &[Quad],
        indices: &[u16],
    ) -> Result<(), BackendError> {
        if let Some(limit) = self.batch_limit {
            if quads.len() > limit {
                let quad_bytes = std::mem::size_of::<Quad>() as u64;
                return Err(BackendError::BufferAllocation {
                    requested: quads.len() as u64 * quad_bytes,
                    limit: limit as u64 * quad_bytes,
                });
            }
        }
        self.record(Submission {
            kind: SubmissionKind::Batch,
            material,
            vertices: quads.iter().flat_map(Quad::vertices).collect(),
            indices: indices.to_vec(),
        })
    }

    fn draw_triangles(
        &mut self,
        material: MaterialId,
        vertices: &[Vertex],
        indices: &[u16],
    ) -> Result<(), BackendError> {
        self.record(Submission {
            kind: SubmissionKind::Triangles,
            material,
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        })
    }
}
