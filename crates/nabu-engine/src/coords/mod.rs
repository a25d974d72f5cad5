//! Coordinate and geometry types.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! Backends convert to NDC in shaders using a viewport uniform.

mod rect;
mod viewport;

pub use glam::Vec2;
pub use rect::Rect;
pub use viewport::Viewport;
