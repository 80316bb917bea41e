//! Per-instance binding configuration handed to capture modules.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Protocol;

/// Host identity key material loaded from disk.
///
/// The contents are kept verbatim; capture modules decide whether they
/// accept them.
#[derive(Clone, PartialEq, Eq)]
pub struct HostKey {
    path: PathBuf,
    contents: String,
}

impl HostKey {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Path the key was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the contents look like a PEM/OpenSSH encoded private key.
    pub fn is_pem_private_key(&self) -> bool {
        let trimmed = self.contents.trim();
        trimmed.starts_with("-----BEGIN ")
            && trimmed.contains("PRIVATE KEY-----")
            && trimmed.ends_with("-----")
    }
}

// Never print key material.
impl std::fmt::Debug for HostKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostKey")
            .field("path", &self.path)
            .field("len", &self.contents.len())
            .finish()
    }
}

/// Binding configuration for one SSH listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfig {
    pub bind_addr: IpAddr,
    pub bind_port: u16,
    /// Host key shared by every SSH instance of one startup pass.
    pub host_key: Option<Arc<HostKey>>,
}

/// Binding configuration for one SNMP listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpConfig {
    pub bind_addr: IpAddr,
    pub bind_port: u16,
}

/// Protocol-specific configuration for a single capture module instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleConfig {
    Ssh(SshConfig),
    Snmp(SnmpConfig),
}

impl ModuleConfig {
    pub fn protocol(&self) -> Protocol {
        match self {
            ModuleConfig::Ssh(_) => Protocol::Ssh,
            ModuleConfig::Snmp(_) => Protocol::Snmp,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            ModuleConfig::Ssh(c) => c.bind_port,
            ModuleConfig::Snmp(c) => c.bind_port,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        match self {
            ModuleConfig::Ssh(c) => SocketAddr::new(c.bind_addr, c.bind_port),
            ModuleConfig::Snmp(c) => SocketAddr::new(c.bind_addr, c.bind_port),
        }
    }
}
