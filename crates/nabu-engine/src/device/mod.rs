//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a window
//! - creating offscreen color targets
//! - handing out encoders and submitting them

mod headless;
mod init;

pub use headless::{HeadlessGpu, OffscreenTarget};
pub use init::GpuInit;
