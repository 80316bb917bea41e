//! Capture module adapters.
//!
//! One module per supported protocol, plus the launcher that dispatches a
//! [`ModuleConfig`] to the right one.

mod snmp;
mod ssh;

pub use snmp::{decode_message, PduType, SnmpCapture, SnmpMessage, SnmpVersion};
pub use ssh::{parse_client_ident, SshCapture, SERVER_IDENT};

use crate::domain::ModuleConfig;
use crate::error::Result;
use crate::handle::StopHandle;
use crate::ports::{CaptureModule, ModuleLauncher};

/// Launcher backed by the built-in capture modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureLauncher {
    ssh: SshCapture,
    snmp: SnmpCapture,
}

impl CaptureLauncher {
    /// Create a launcher for every supported protocol.
    pub fn new() -> Self {
        Self {
            ssh: SshCapture::new(),
            snmp: SnmpCapture::new(),
        }
    }
}

impl ModuleLauncher for CaptureLauncher {
    async fn launch(&self, config: ModuleConfig) -> Result<StopHandle> {
        match config {
            ModuleConfig::Ssh(config) => self.ssh.start(config).await,
            ModuleConfig::Snmp(config) => self.snmp.start(config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use crate::domain::{SnmpConfig, SshConfig};

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[tokio::test]
    async fn test_launcher_dispatches_by_variant() {
        let launcher = CaptureLauncher::new();

        let ssh = launcher
            .launch(ModuleConfig::Ssh(SshConfig {
                bind_addr: LOCALHOST,
                bind_port: 0,
                host_key: None,
            }))
            .await
            .unwrap();
        assert_eq!(ssh.protocol(), SshCapture::PROTOCOL);

        let snmp = launcher
            .launch(ModuleConfig::Snmp(SnmpConfig {
                bind_addr: LOCALHOST,
                bind_port: 0,
            }))
            .await
            .unwrap();
        assert_eq!(snmp.protocol(), SnmpCapture::PROTOCOL);

        ssh.stop(Duration::from_secs(1)).await.unwrap();
        snmp.stop(Duration::from_secs(1)).await.unwrap();
    }
}
