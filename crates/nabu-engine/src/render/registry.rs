use super::{ContractViolation, RenderQueue};

/// Index of a render queue in the [`QueueRegistry`]. `QueueId::ROOT` always exists.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct QueueId(pub u32);

impl QueueId {
    pub const ROOT: QueueId = QueueId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of render queues plus the group stack that selects the active one.
///
/// Queues are cleared, not freed, between frames. Slots released by [`clear_frame`]
/// are handed out again by [`create`], lowest id first, so a steady scene reuses the
/// same ids and bucket allocations every frame. An id is never handed out twice within
/// one frame.
///
/// [`clear_frame`]: QueueRegistry::clear_frame
/// [`create`]: QueueRegistry::create
#[derive(Debug)]
pub struct QueueRegistry {
    queues: Vec<RenderQueue>,
    live: Vec<bool>,
    /// Released ids, highest first so `pop()` yields the lowest.
    free: Vec<QueueId>,
    group_stack: Vec<QueueId>,
    reserve: usize,
}

impl QueueRegistry {
    /// Creates the registry with its root queue.
    pub fn new(reserve: usize) -> Self {
        Self {
            queues: vec![RenderQueue::with_capacity(reserve)],
            live: vec![true],
            free: Vec::new(),
            group_stack: Vec::new(),
            reserve,
        }
    }

    /// Allocates a queue for the current frame.
    pub fn create(&mut self) -> QueueId {
        if let Some(id) = self.free.pop() {
            self.live[id.index()] = true;
            return id;
        }
        let id = QueueId(self.queues.len() as u32);
        self.queues.push(RenderQueue::with_capacity(self.reserve));
        self.live.push(true);
        id
    }

    #[inline]
    pub fn contains(&self, id: QueueId) -> bool {
        self.live.get(id.index()).copied().unwrap_or(false)
    }

    pub fn get(&self, id: QueueId) -> Result<&RenderQueue, ContractViolation> {
        if !self.contains(id) {
            return Err(ContractViolation::UnknownQueue(id));
        }
        Ok(&self.queues[id.index()])
    }

    pub fn get_mut(&mut self, id: QueueId) -> Result<&mut RenderQueue, ContractViolation> {
        if !self.contains(id) {
            return Err(ContractViolation::UnknownQueue(id));
        }
        Ok(&mut self.queues[id.index()])
    }

    /// Number of queue slots ever allocated (live or recyclable).
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.queues.len()
    }

    /// Number of queues allocated for the current frame, root included.
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|&&l| l).count()
    }

    // ── group stack ───────────────────────────────────────────────────────

    /// Queue that receives commands without an explicit target.
    #[inline]
    pub fn active(&self) -> QueueId {
        self.group_stack.last().copied().unwrap_or(QueueId::ROOT)
    }

    pub fn push_group(&mut self, id: QueueId) -> Result<(), ContractViolation> {
        if !self.contains(id) {
            return Err(ContractViolation::UnknownQueue(id));
        }
        self.group_stack.push(id);
        Ok(())
    }

    pub fn pop_group(&mut self) -> Result<QueueId, ContractViolation> {
        self.group_stack.pop().ok_or(ContractViolation::GroupStackUnderflow)
    }

    #[inline]
    pub fn group_depth(&self) -> usize {
        self.group_stack.len()
    }

    // ── frame lifecycle ───────────────────────────────────────────────────

    /// Sorts every live queue.
    pub fn sort_live(&mut self) {
        for (queue, _) in self.queues.iter_mut().zip(&self.live).filter(|(_, l)| **l) {
            queue.sort();
        }
    }

    /// Clears every queue, releases every non-root id and empties the group stack.
    pub fn clear_frame(&mut self) {
        for q in &mut self.queues {
            q.clear();
        }
        self.free.clear();
        for i in (1..self.queues.len()).rev() {
            self.live[i] = false;
            self.free.push(QueueId(i as u32));
        }
        self.group_stack.clear();
    }
}
