use glam::Mat4;

use crate::coords::{Vec2, Viewport};
use crate::scene::{GroupCommand, MaterialId, Quad, RenderCommand, ZIndex};

use super::{
    cull, BackendError, BatchBuffer, CommandId, ContractViolation, CustomDrawCtx, DrawStats,
    QueueEntry, QueueId, QueueRegistry, RenderBackend, RenderError, RenderQueue, RendererConfig,
};

/// Where the renderer is in the per-frame protocol.
///
/// `Idle -> Accepting -> Rendering -> Drawn -> (clean) -> Idle`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameState {
    /// Cleaned; nothing recorded yet.
    Idle,
    /// At least one command recorded.
    Accepting,
    /// Inside `render()`.
    Rendering,
    /// `render()` finished (or aborted); waiting for `clean()`.
    Drawn,
}

/// Traversal cursor: which queue is being drawn and the next entry in it.
#[derive(Debug, Copy, Clone)]
struct VisitFrame {
    queue: QueueId,
    next: usize,
}

/// Batching renderer.
///
/// Collects render commands into ordered queues during the frame, then draws them in
/// paint order while merging runs of same-material quads into single submissions.
///
/// Frame protocol:
/// 1. `clean()` (drops last frame's commands and statistics)
/// 2. `add_command` / `add_command_to` / `push_group` / `pop_group` / `create_render_queue`
/// 3. `render(backend)`
///
/// Quads are never reordered to improve batching; a material change between two quads in
/// paint order always costs a submission.
pub struct Renderer {
    config: RendererConfig,
    commands: Vec<RenderCommand>,
    queues: QueueRegistry,
    batch: BatchBuffer,
    stats: DrawStats,
    state: FrameState,
    visit_stack: Vec<VisitFrame>,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        let batch = BatchBuffer::new(config.batch_capacity).map_err(|e| {
            log::error!("renderer: {e}");
            e
        })?;

        log::debug!(
            "renderer: batch capacity {} quads, culling {}",
            batch.capacity(),
            if config.culling && config.viewport.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            commands: Vec::with_capacity(config.queue_reserve),
            queues: QueueRegistry::new(config.queue_reserve),
            batch,
            stats: DrawStats::default(),
            state: FrameState::Idle,
            visit_stack: Vec::new(),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    // ── statistics ────────────────────────────────────────────────────────

    #[inline]
    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    #[inline]
    pub fn drawn_batches(&self) -> usize {
        self.stats.drawn_batches
    }

    #[inline]
    pub fn drawn_vertices(&self) -> usize {
        self.stats.drawn_vertices
    }

    // ── viewport / visibility ─────────────────────────────────────────────

    /// Replaces the culling viewport. `None` disables culling.
    #[inline]
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.config.viewport = viewport;
    }

    /// Whether a node-local rectangle of `size` is visible under `transform`.
    ///
    /// Always `true` when no viewport is set.
    pub fn check_visibility(&self, transform: &Mat4, size: Vec2) -> bool {
        match self.config.viewport {
            Some(vp) => cull::rect_visible(transform, size, vp),
            None => true,
        }
    }

    // ── recording ─────────────────────────────────────────────────────────

    /// Adds a command to the active queue (top of the group stack, or the root).
    pub fn add_command(&mut self, command: impl Into<RenderCommand>) -> Result<(), RenderError> {
        let queue = self.queues.active();
        self.add_command_to(command, queue)
    }

    /// Adds a command to a queue created this frame.
    pub fn add_command_to(
        &mut self,
        command: impl Into<RenderCommand>,
        queue: QueueId,
    ) -> Result<(), RenderError> {
        let command = command.into();
        self.ensure_recording()?;
        self.check(self.queues.get(queue).map(|_| ()))?;
        if let RenderCommand::Group(g) = &command {
            self.check(self.queues.get(g.queue).map(|_| ()))?;
        }

        let id = CommandId(self.commands.len() as u32);
        let z = command.z();
        self.commands.push(command);
        self.queues
            .get_mut(queue)
            .map_err(RenderError::from)?
            .push(QueueEntry::new(z, id));
        self.state = FrameState::Accepting;
        Ok(())
    }

    /// Allocates (or recycles) a render queue for this frame.
    pub fn create_render_queue(&mut self) -> Result<QueueId, RenderError> {
        self.ensure_recording()?;
        Ok(self.queues.create())
    }

    /// Routes subsequent `add_command` calls into `queue` until the matching `pop_group`.
    pub fn push_group(&mut self, queue: QueueId) -> Result<(), RenderError> {
        self.ensure_recording()?;
        let pushed = self.queues.push_group(queue);
        self.check(pushed)
    }

    /// Ends the innermost group and returns its queue.
    pub fn pop_group(&mut self) -> Result<QueueId, RenderError> {
        self.ensure_recording()?;
        let popped = self.queues.pop_group();
        self.check(popped)
    }

    /// Creates a queue, records a [`GroupCommand`] for it in the active queue, and pushes
    /// it. Pair with [`end_group`](Self::end_group).
    pub fn begin_group(&mut self, z: impl Into<ZIndex>) -> Result<QueueId, RenderError> {
        let queue = self.create_render_queue()?;
        self.add_command(GroupCommand::new(z, queue))?;
        self.push_group(queue)?;
        Ok(queue)
    }

    #[inline]
    pub fn end_group(&mut self) -> Result<(), RenderError> {
        self.pop_group().map(|_| ())
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn queue(&self, id: QueueId) -> Result<&RenderQueue, RenderError> {
        self.queues.get(id).map_err(RenderError::from)
    }

    #[inline]
    pub fn command(&self, id: CommandId) -> Option<&RenderCommand> {
        self.commands.get(id.0 as usize)
    }

    /// Commands recorded this frame.
    #[inline]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Drops every recorded command, clears every queue (keeping their storage), releases
    /// non-root queue ids and resets statistics.
    pub fn clean(&mut self) {
        debug_assert_ne!(self.state, FrameState::Rendering, "clean() during render()");
        self.commands.clear();
        self.queues.clear_frame();
        self.batch.reset();
        self.stats.reset();
        self.visit_stack.clear();
        self.state = FrameState::Idle;
    }

    /// Sorts every queue and draws the frame through `backend`.
    ///
    /// Any error aborts the remaining traversal. The staging buffer is reset either way,
    /// and the frame must be cleaned before the next one is recorded.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        self.ensure_recording()?;
        let depth = self.queues.group_depth();
        if depth != 0 {
            return self.check(Err(ContractViolation::UnbalancedGroups(depth)));
        }

        self.state = FrameState::Rendering;
        self.queues.sort_live();

        let result = self.visit(backend).and_then(|()| self.flush(backend).map_err(Into::into));

        self.batch.reset();
        self.visit_stack.clear();
        self.state = FrameState::Drawn;

        match &result {
            Ok(()) => log::trace!(
                "renderer: frame drawn ({} batches, {} vertices, {} culled)",
                self.stats.drawn_batches,
                self.stats.drawn_vertices,
                self.stats.culled_quads
            ),
            Err(RenderError::Backend(e)) => log::warn!("renderer: frame aborted: {e}"),
            Err(RenderError::Contract(e)) => log::error!("renderer: frame aborted: {e}"),
        }
        result
    }

    /// Depth-first traversal from the root queue. Group commands are expanded in place.
    fn visit(&mut self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        self.visit_stack.clear();
        self.visit_stack.push(VisitFrame { queue: QueueId::ROOT, next: 0 });

        while let Some(top) = self.visit_stack.last_mut() {
            let queue = self.queues.get(top.queue)?;
            let Some(entry) = queue.get(top.next) else {
                self.visit_stack.pop();
                continue;
            };
            top.next += 1;

            let index = entry.command.0 as usize;
            match &self.commands[index] {
                RenderCommand::Group(g) => {
                    let target = g.queue;
                    if self.visit_stack.iter().any(|f| f.queue == target) {
                        return Err(ContractViolation::GroupCycle(target).into());
                    }
                    // Validates the id before it becomes the traversal target.
                    self.queues.get(target)?;
                    self.visit_stack.push(VisitFrame { queue: target, next: 0 });
                }
                RenderCommand::Quad(cmd) => {
                    let (material, quad) = (cmd.material, cmd.world_quad());
                    self.stage_quad(material, quad, backend)?;
                }
                RenderCommand::Custom(_) => {
                    self.flush(backend)?;
                    let RenderCommand::Custom(custom) = &mut self.commands[index] else {
                        unreachable!("command kind changed during traversal");
                    };
                    let mut ctx = CustomDrawCtx::new(backend, &mut self.stats);
                    custom.execute(&mut ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Stages a world-space quad, flushing first on a material change.
    ///
    /// A culled quad is left out of the batch but still counts toward `drawn_vertices`,
    /// so the statistics do not depend on the culling setting.
    fn stage_quad(
        &mut self,
        material: MaterialId,
        quad: Quad,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), BackendError> {
        if self.config.culling {
            if let Some(vp) = self.config.viewport {
                if !cull::bounds_visible(quad.bounds(), vp) {
                    self.stats.culled_quads += 1;
                    self.stats.drawn_vertices += Quad::VERTEX_COUNT;
                    return Ok(());
                }
            }
        }

        if !self.batch.accepts(material) {
            self.flush(backend)?;
        }
        let staged = self.batch.push(material, quad);
        debug_assert!(staged, "empty batch buffer rejected a quad");

        // Forced flush at capacity; keeps each upload bounded by `batch_capacity`.
        if self.batch.is_full() {
            self.flush(backend)?;
        }
        Ok(())
    }

    /// Submits staged quads as one draw call and resets the cursor.
    fn flush(&mut self, backend: &mut dyn RenderBackend) -> Result<(), BackendError> {
        let Some(material) = self.batch.material() else { return Ok(()) };
        if self.batch.is_empty() {
            return Ok(());
        }

        let quads = self.batch.len();
        log::trace!("renderer: flush {quads} quad(s) with {material:?}");

        backend.submit_batch(material, self.batch.staged(), self.batch.staged_indices())?;
        self.stats.drawn_batches += 1;
        self.stats.drawn_vertices += quads * Quad::VERTEX_COUNT;
        self.batch.reset();
        Ok(())
    }

    // ── contract checks ───────────────────────────────────────────────────

    fn ensure_recording(&self) -> Result<(), RenderError> {
        match self.state {
            FrameState::Idle | FrameState::Accepting => Ok(()),
            FrameState::Rendering => self.check(Err(ContractViolation::CommandWhileRendering)),
            FrameState::Drawn => self.check(Err(ContractViolation::FrameNotOpen)),
        }
    }

    /// Logs and converts a contract check result.
    fn check<T>(&self, result: Result<T, ContractViolation>) -> Result<T, RenderError> {
        result.map_err(|e| {
            log::error!("renderer: {e}");
            RenderError::Contract(e)
        })
    }
}

impl core::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Renderer")
            .field("state", &self.state)
            .field("commands", &self.commands.len())
            .field("queues", &self.queues.live_count())
            .field("staged", &self.batch.len())
            .field("stats", &self.stats)
            .finish()
    }
}
