//! Color model shared by producers and backends.
//!
//! Colors are linear premultiplied alpha on the CPU and packed to `[u8; 4]` per vertex.

pub mod color;

pub use color::Color;
