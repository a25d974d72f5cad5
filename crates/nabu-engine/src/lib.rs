//! Nabu engine crate.
//!
//! Batching 2D renderer: collects per-frame render commands into ordered queues and
//! draws them with as few GPU submissions as ordering allows.

pub mod coords;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;

pub use render::{RenderError, Renderer, RendererConfig};
pub use scene::{CustomCommand, GroupCommand, QuadCommand, RenderCommand, ZIndex};
