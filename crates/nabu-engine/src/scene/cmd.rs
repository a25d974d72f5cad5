use glam::Mat4;

use crate::render::{BackendError, CustomDrawCtx, QueueId};

use super::{MaterialId, Quad, ZIndex};

/// A request to draw something this frame.
///
/// The set of kinds is closed:
/// - `Quad`: one batchable quad; consecutive quads sharing a material merge into one draw
/// - `Custom`: an opaque callback that issues its own draws and breaks any pending batch
/// - `Group`: a reference to another render queue, drawn in place of the command
///
/// Commands are handed to the [`Renderer`](crate::render::Renderer) by value and dropped
/// at the next `clean()`; nothing is retained across frames.
#[derive(Debug)]
pub enum RenderCommand {
    Quad(QuadCommand),
    Custom(CustomCommand),
    Group(GroupCommand),
}

impl RenderCommand {
    #[inline]
    pub fn z(&self) -> ZIndex {
        match self {
            RenderCommand::Quad(c) => c.z,
            RenderCommand::Custom(c) => c.z,
            RenderCommand::Group(c) => c.z,
        }
    }

    #[inline]
    pub fn is_batchable(&self) -> bool {
        matches!(self, RenderCommand::Quad(_))
    }
}

/// Batchable quad draw.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadCommand {
    pub z: ZIndex,
    pub material: MaterialId,
    pub quad: Quad,
    /// Model-view transform applied while staging. `None` means `quad` is already in
    /// world space.
    pub model_view: Option<Mat4>,
}

impl QuadCommand {
    #[inline]
    pub fn new(z: impl Into<ZIndex>, material: impl Into<MaterialId>, quad: Quad) -> Self {
        Self { z: z.into(), material: material.into(), quad, model_view: None }
    }

    #[inline]
    pub fn with_model_view(mut self, model_view: Mat4) -> Self {
        self.model_view = Some(model_view);
        self
    }

    /// The quad in world space.
    #[inline]
    pub fn world_quad(&self) -> Quad {
        match &self.model_view {
            Some(m) => self.quad.transformed(m),
            None => self.quad,
        }
    }
}

impl From<QuadCommand> for RenderCommand {
    fn from(c: QuadCommand) -> Self {
        RenderCommand::Quad(c)
    }
}

type DrawFn = dyn FnMut(&mut CustomDrawCtx<'_>) -> Result<(), BackendError>;

/// Unbatched draw callback.
///
/// The callback is responsible for reporting its own contribution through
/// [`CustomDrawCtx::add_drawn_batches`] / [`CustomDrawCtx::add_drawn_vertices`].
pub struct CustomCommand {
    pub z: ZIndex,
    func: Box<DrawFn>,
}

impl CustomCommand {
    pub fn new<F>(z: impl Into<ZIndex>, func: F) -> Self
    where
        F: FnMut(&mut CustomDrawCtx<'_>) -> Result<(), BackendError> + 'static,
    {
        Self { z: z.into(), func: Box::new(func) }
    }

    #[inline]
    pub(crate) fn execute(&mut self, ctx: &mut CustomDrawCtx<'_>) -> Result<(), BackendError> {
        (self.func)(ctx)
    }
}

impl core::fmt::Debug for CustomCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CustomCommand").field("z", &self.z).finish_non_exhaustive()
    }
}

impl From<CustomCommand> for RenderCommand {
    fn from(c: CustomCommand) -> Self {
        RenderCommand::Custom(c)
    }
}

/// Draws the contents of another render queue at this command's position.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GroupCommand {
    pub z: ZIndex,
    pub queue: QueueId,
}

impl GroupCommand {
    #[inline]
    pub fn new(z: impl Into<ZIndex>, queue: QueueId) -> Self {
        Self { z: z.into(), queue }
    }
}

impl From<GroupCommand> for RenderCommand {
    fn from(c: GroupCommand) -> Self {
        RenderCommand::Group(c)
    }
}
