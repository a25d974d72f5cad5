use crate::scene::{ZBucket, ZIndex};

/// Handle to a command stored in the renderer's per-frame arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u32);

/// One queue slot: the command's ordering key and where the command lives.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct QueueEntry {
    pub z: ZIndex,
    pub command: CommandId,
}

impl QueueEntry {
    #[inline]
    pub const fn new(z: ZIndex, command: CommandId) -> Self {
        Self { z, command }
    }
}

/// Ordered render queue split into three buckets by the sign of the ordering key.
///
/// Paint order is `negative (ascending z) -> zero (insertion order) -> positive (ascending z)`.
/// Only the non-zero buckets are sorted, and the sort is stable, so equal keys keep their
/// insertion order everywhere.
///
/// Performance characteristics:
/// - `push()` is O(1) amortized
/// - `clear()` keeps allocated capacity for the next frame
#[derive(Debug, Clone)]
pub struct RenderQueue {
    negative: Vec<QueueEntry>,
    zero: Vec<QueueEntry>,
    positive: Vec<QueueEntry>,
    sorted: bool,
}

impl RenderQueue {
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a queue with `reserve` slots preallocated in every bucket.
    pub fn with_capacity(reserve: usize) -> Self {
        Self {
            negative: Vec::with_capacity(reserve),
            zero: Vec::with_capacity(reserve),
            positive: Vec::with_capacity(reserve),
            sorted: true,
        }
    }

    #[inline]
    pub fn push(&mut self, entry: QueueEntry) {
        match entry.z.bucket() {
            ZBucket::Negative => self.negative.push(entry),
            ZBucket::Zero => self.zero.push(entry),
            ZBucket::Positive => self.positive.push(entry),
        }
        if entry.z != ZIndex::ZERO {
            self.sorted = false;
        }
    }

    /// Stable-sorts the negative and positive buckets by ascending key.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        // `sort_by_key` is stable.
        self.negative.sort_by_key(|e| e.z);
        self.positive.sort_by_key(|e| e.z);
        self.sorted = true;
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.negative.len() + self.zero.len() + self.positive.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry at `index` in paint order.
    pub fn get(&self, index: usize) -> Option<QueueEntry> {
        let neg = self.negative.len();
        let zero = self.zero.len();
        if index < neg {
            Some(self.negative[index])
        } else if index < neg + zero {
            Some(self.zero[index - neg])
        } else {
            self.positive.get(index - neg - zero).copied()
        }
    }

    /// Iterates entries in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.negative.iter().chain(self.zero.iter()).chain(self.positive.iter())
    }

    /// Empties all buckets; capacity is retained.
    pub fn clear(&mut self) {
        self.negative.clear();
        self.zero.clear();
        self.positive.clear();
        self.sorted = true;
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl core::ops::Index<usize> for RenderQueue {
    type Output = QueueEntry;

    fn index(&self, index: usize) -> &QueueEntry {
        let neg = self.negative.len();
        let zero = self.zero.len();
        if index < neg {
            &self.negative[index]
        } else if index < neg + zero {
            &self.zero[index - neg]
        } else {
            &self.positive[index - neg - zero]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(z: i32, id: u32) -> QueueEntry {
        QueueEntry::new(ZIndex(z), CommandId(id))
    }

    fn ids(q: &RenderQueue) -> Vec<u32> {
        q.iter().map(|e| e.command.0).collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn zero_bucket_keeps_insertion_order() {
        let mut q = RenderQueue::new();
        q.push(entry(0, 2));
        q.push(entry(0, 0));
        q.push(entry(0, 1));
        q.sort();
        assert_eq!(ids(&q), vec![2, 0, 1]);
    }

    #[test]
    fn nonzero_buckets_sort_ascending() {
        let mut q = RenderQueue::new();
        q.push(entry(5, 0));
        q.push(entry(-1, 1));
        q.push(entry(2, 2));
        q.push(entry(-9, 3));
        q.sort();
        let zs: Vec<i32> = q.iter().map(|e| e.z.0).collect();
        assert_eq!(zs, vec![-9, -1, 2, 5]);
    }

    #[test]
    fn negative_then_zero_then_positive() {
        let mut q = RenderQueue::new();
        q.push(entry(1, 0));
        q.push(entry(0, 1));
        q.push(entry(-1, 2));
        q.push(entry(0, 3));
        q.sort();
        assert_eq!(ids(&q), vec![2, 1, 3, 0]);
    }

    #[test]
    fn equal_nonzero_keys_are_stable() {
        let mut q = RenderQueue::new();
        for id in 0..8 {
            q.push(entry(if id % 2 == 0 { 3 } else { 1 }, id));
        }
        q.sort();
        assert_eq!(ids(&q), vec![1, 3, 5, 7, 0, 2, 4, 6]);
    }

    // ── access ────────────────────────────────────────────────────────────

    #[test]
    fn indexed_access_matches_iteration() {
        let mut q = RenderQueue::new();
        q.push(entry(4, 0));
        q.push(entry(0, 1));
        q.push(entry(-4, 2));
        q.sort();
        assert_eq!(q.len(), 3);
        let by_index: Vec<u32> = (0..q.len()).map(|i| q[i].command.0).collect();
        assert_eq!(by_index, ids(&q));
        assert_eq!(q.get(3), None);
    }

    #[test]
    fn sort_flag_tracks_nonzero_pushes() {
        let mut q = RenderQueue::with_capacity(4);
        assert!(q.is_sorted());
        q.push(entry(0, 0));
        assert!(q.is_sorted());
        q.push(entry(-2, 1));
        assert!(!q.is_sorted());
        q.sort();
        assert!(q.is_sorted());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut q = RenderQueue::with_capacity(16);
        for id in 0..10 {
            q.push(entry(id as i32 - 5, id));
        }
        let cap = q.zero.capacity();
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.zero.capacity(), cap);
        assert!(q.negative.capacity() >= 16);
    }
}
