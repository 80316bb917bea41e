//! Error types for the bounty-core library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::Protocol;

/// Result type alias for bounty operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning, starting and stopping capture listeners.
#[derive(Error, Debug)]
pub enum Error {
    /// A port specification could not be resolved.
    #[error("Invalid {}port specification {spec:?}: {reason}", protocol_prefix(.protocol))]
    InvalidPortSpec {
        /// Protocol the spec was configured for, when known.
        protocol: Option<Protocol>,
        spec: String,
        reason: String,
    },

    /// A capture module could not acquire its port or rejected its key material.
    #[error("Failed to start {protocol} listener on port {port}: {source}")]
    Bind {
        protocol: Protocol,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// No protocol survived selection or startup.
    #[error("at least one protocol must be enabled")]
    NoProtocolEnabled,

    /// The host key file could not be read.
    #[error("Failed to read host key {path}: {source}")]
    HostKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A listener failed while being released.
    #[error("Failed to stop {protocol} listener on port {port}: {reason}")]
    Cleanup {
        protocol: Protocol,
        port: u16,
        reason: String,
    },

    /// A listener did not release its resources in time and was aborted.
    #[error("{protocol} listener on port {port} did not stop within {timeout:?}")]
    CleanupTimeout {
        protocol: Protocol,
        port: u16,
        timeout: Duration,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::Bind`], adding a privilege hint when a low port is refused.
    pub(crate) fn bind(protocol: Protocol, port: u16, source: std::io::Error) -> Self {
        let source = if source.kind() == std::io::ErrorKind::PermissionDenied
            && port < 1024
            && !running_as_root()
        {
            std::io::Error::new(
                source.kind(),
                format!("{} (ports below 1024 require root or CAP_NET_BIND_SERVICE)", source),
            )
        } else {
            source
        };

        Error::Bind {
            protocol,
            port,
            source,
        }
    }

    /// Attach the protocol a port spec belonged to.
    pub fn for_protocol(self, protocol: Protocol) -> Self {
        match self {
            Error::InvalidPortSpec { spec, reason, .. } => Error::InvalidPortSpec {
                protocol: Some(protocol),
                spec,
                reason,
            },
            other => other,
        }
    }

    /// Whether this error happened before any listener was running.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPortSpec { .. }
                | Error::Bind { .. }
                | Error::NoProtocolEnabled
                | Error::HostKey { .. }
                | Error::Config(_)
        )
    }
}

fn protocol_prefix(protocol: &Option<Protocol>) -> String {
    protocol.map(|p| format!("{} ", p)).unwrap_or_default()
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}
