//! Logger setup for hosts and tests.
//!
//! The crate itself only emits through the `log` facade; `init_logging` installs
//! `env_logger` as the backend when the host has not installed one.

mod init;

pub use init::{init_logging, LoggingConfig};
