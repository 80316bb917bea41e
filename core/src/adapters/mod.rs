//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter owns real sockets.

pub mod capture;

// Re-export main types for convenience
pub use capture::{CaptureLauncher, SnmpCapture, SshCapture};
