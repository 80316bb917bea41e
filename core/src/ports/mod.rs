//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with capture modules. Implementations live in `adapters`.

mod capture;

pub use capture::{CaptureModule, ModuleLauncher};
