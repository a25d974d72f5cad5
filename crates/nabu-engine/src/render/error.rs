use thiserror::Error;

use super::QueueId;

/// Caller bugs detected at a renderer entry point.
///
/// A violation is reported before any queue, arena, or staging state is touched,
/// so the frame in progress stays consistent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("command submitted while the renderer is drawing")]
    CommandWhileRendering,

    #[error("frame already drawn; call `clean()` before recording the next one")]
    FrameNotOpen,

    #[error("render queue {0:?} does not exist in this frame")]
    UnknownQueue(QueueId),

    #[error("pop_group called with an empty group stack")]
    GroupStackUnderflow,

    #[error("render started with {0} group(s) still pushed")]
    UnbalancedGroups(usize),

    #[error("render queue {0:?} contains itself through a group command")]
    GroupCycle(QueueId),

    #[error("ordering key {0} is not an integer in the i32 range")]
    InvalidOrderingKey(f32),

    #[error("batch capacity {0} is outside 1..={max}", max = super::MAX_BATCH_CAPACITY)]
    InvalidCapacity(usize),
}

/// Failures raised by a [`RenderBackend`](super::RenderBackend).
///
/// These are fatal to the frame being drawn; nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("texture {0} is not registered with the backend")]
    UnknownTexture(u32),

    #[error("material {0:#018x} does not decode to a supported program")]
    UnsupportedProgram(u64),

    #[error("upload of {requested} bytes exceeds the {limit} byte buffer limit")]
    BufferAllocation { requested: u64, limit: u64 },

    #[error("device error: {0}")]
    Device(String),
}

/// Error returned by [`Renderer`](super::Renderer) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
}

impl RenderError {
    #[inline]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, RenderError::Contract(_))
    }
}
