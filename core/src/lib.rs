//! Bounty Core Library
//!
//! Multi-protocol honeypot orchestration. Provides functionality to:
//! - Resolve port specifications into ordered port sets
//! - Select protocol capture modules by name
//! - Start one listener per configured port and stop them all on shutdown
//! - Turn SIGINT/SIGTERM into a single shutdown request
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Protocol capture module implementations
//! - `application`: Launch planning and the orchestrator

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod handle;
pub mod shutdown;

// Re-export domain types (primary API)
pub use domain::{select_protocols, ModuleConfig, PortSet, Protocol, Transport};

// Re-export other commonly used types
pub use adapters::{CaptureLauncher, SnmpCapture, SshCapture};
pub use application::{LaunchPlan, Orchestrator, OrchestratorPhase, ShutdownReport};
pub use config::{CaptureConfig, ConfigStore};
pub use error::{Error, Result};
pub use handle::{CaptureStats, StopHandle, StopReport};
pub use shutdown::{ShutdownListener, ShutdownTrigger};
