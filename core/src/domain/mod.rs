//! Domain layer - Pure business logic and data models.
//!
//! This module contains the protocol set, port spec resolution and
//! per-instance module configuration. These types have no I/O
//! dependencies and can be tested in isolation.

mod module_config;
mod port_set;
mod protocol;

// Re-export all domain types
pub use module_config::{HostKey, ModuleConfig, SnmpConfig, SshConfig};
pub use port_set::{PortSet, MAX_PORT, MIN_PORT};
pub use protocol::{parse_protocol_names, select_protocols, Protocol, Transport, UnknownProtocol};
