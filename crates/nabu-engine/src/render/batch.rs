use crate::scene::{quad_indices, MaterialId, Quad};

use super::ContractViolation;

/// Largest capacity whose vertex indices (`4 * capacity - 1`) fit in `u16`.
pub const MAX_BATCH_CAPACITY: usize = (u16::MAX as usize + 1) / Quad::VERTEX_COUNT;

/// Default capacity: as many quads as 65536 indices can address.
pub const VBO_SIZE: usize = 65536 / Quad::INDEX_COUNT;

/// Fixed-capacity staging area for the batch being accumulated.
///
/// Holds the CPU copy of staged quads (mirrored into the backend's vertex buffer on
/// flush), the index pattern for a full buffer (computed once), and the material of the
/// pending batch. The staged length is the cursor; it never exceeds `capacity`.
#[derive(Debug)]
pub struct BatchBuffer {
    quads: Vec<Quad>,
    indices: Vec<u16>,
    capacity: usize,
    material: Option<MaterialId>,
}

impl BatchBuffer {
    pub fn new(capacity: usize) -> Result<Self, ContractViolation> {
        if capacity == 0 || capacity > MAX_BATCH_CAPACITY {
            return Err(ContractViolation::InvalidCapacity(capacity));
        }
        Ok(Self {
            quads: Vec::with_capacity(capacity),
            indices: quad_indices(capacity),
            capacity,
            material: None,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Quads currently staged.
    #[inline]
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.quads.len() >= self.capacity
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.quads.len()
    }

    /// Material of the pending batch, if anything is staged.
    #[inline]
    pub fn material(&self) -> Option<MaterialId> {
        self.material
    }

    /// Whether a quad with `material` can join the pending batch without a flush.
    #[inline]
    pub fn accepts(&self, material: MaterialId) -> bool {
        !self.is_full() && (self.is_empty() || self.material == Some(material))
    }

    /// Stages a quad. Returns `false` (and stages nothing) when the quad would break the
    /// pending batch; the caller flushes and retries.
    #[must_use]
    pub fn push(&mut self, material: MaterialId, quad: Quad) -> bool {
        if !self.accepts(material) {
            return false;
        }
        self.material = Some(material);
        self.quads.push(quad);
        true
    }

    #[inline]
    pub fn staged(&self) -> &[Quad] {
        &self.quads
    }

    /// Index pattern covering the staged quads.
    #[inline]
    pub fn staged_indices(&self) -> &[u16] {
        &self.indices[..self.quads.len() * Quad::INDEX_COUNT]
    }

    /// Index pattern for a full buffer.
    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Resets the cursor. Backing storage is kept.
    #[inline]
    pub fn reset(&mut self) {
        self.quads.clear();
        self.material = None;
    }
}
