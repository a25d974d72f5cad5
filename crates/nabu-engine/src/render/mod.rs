//! Batching renderer.
//!
//! Commands recorded during a frame are kept in ordered render queues, then drawn in
//! paint order while consecutive same-material quads are merged into one submission.
//! Submissions go to a [`RenderBackend`]: [`WgpuBackend`] for real drawing,
//! [`RecordingBackend`] for headless runs and tests.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Backends convert to NDC in the vertex shader using a viewport uniform.

mod backend;
mod batch;
mod config;
mod error;
mod queue;
mod recording;
mod registry;
mod renderer;
mod stats;

pub mod cull;
pub mod gpu;

pub use backend::{CustomDrawCtx, RenderBackend};
pub use batch::{BatchBuffer, MAX_BATCH_CAPACITY, VBO_SIZE};
pub use config::RendererConfig;
pub use error::{BackendError, ContractViolation, RenderError};
pub use gpu::{FrameTarget, WgpuBackend, WgpuFrame};
pub use queue::{CommandId, QueueEntry, RenderQueue};
pub use recording::{RecordingBackend, Submission, SubmissionKind};
pub use registry::{QueueId, QueueRegistry};
pub use renderer::{FrameState, Renderer};
pub use stats::DrawStats;
