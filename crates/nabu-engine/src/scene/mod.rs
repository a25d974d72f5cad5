//! Producer-side draw data.
//!
//! Responsibilities:
//! - ordering keys (`ZIndex`) and material identifiers
//! - the GPU vertex/quad layout shared with every backend
//! - the closed set of render commands handed to the renderer

mod cmd;
mod material;
mod quad;
mod z_index;

pub use cmd::{CustomCommand, GroupCommand, QuadCommand, RenderCommand};
pub use material::{BlendFactor, BlendFunc, Material, MaterialId, Program, TextureId};
pub use quad::{quad_indices, Quad, Vertex};
pub use z_index::{ZBucket, ZIndex};
