//! Capture configuration.
//!
//! Stored as JSON at `~/.bounty/config.json` unless another path is given.
//! Every key is optional; missing keys take the documented defaults.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::Protocol;
use crate::error::{Error, Result};

/// Settings needed to plan and start the capture listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Comma-separated protocol names, e.g. `"ssh,snmp"`.
    #[serde(default = "default_protocols")]
    pub protocols: String,

    /// Port spec for SSH listeners.
    #[serde(default = "default_ssh_ports")]
    pub ssh_ports: String,

    /// Port spec for SNMP listeners.
    #[serde(default = "default_snmp_ports")]
    pub snmp_ports: String,

    /// Path to the SSH host private key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host_key: Option<PathBuf>,

    /// Address every listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Upper bound on how long a single listener may take to stop.
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,
}

fn default_protocols() -> String {
    Protocol::Ssh.name().to_string()
}

fn default_ssh_ports() -> String {
    Protocol::Ssh.default_ports().to_string()
}

fn default_snmp_ports() -> String {
    Protocol::Snmp.default_ports().to_string()
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_stop_timeout_secs() -> u64 {
    5
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            protocols: default_protocols(),
            ssh_ports: default_ssh_ports(),
            snmp_ports: default_snmp_ports(),
            ssh_host_key: None,
            bind_address: default_bind_address(),
            stop_timeout_secs: default_stop_timeout_secs(),
        }
    }
}

impl CaptureConfig {
    /// Port spec configured for `protocol`.
    pub fn port_spec(&self, protocol: Protocol) -> &str {
        match protocol {
            Protocol::Ssh => &self.ssh_ports,
            Protocol::Snmp => &self.snmp_ports,
        }
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// Configuration store for reading and writing [`CaptureConfig`].
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
    /// Whether a missing file is an error.
    required: bool,
}

impl ConfigStore {
    /// Create a config store with the default path.
    ///
    /// Default path: `~/.bounty/config.json`. A missing file yields defaults.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".bounty").join("config.json"),
            required: false,
        })
    }

    /// Create a config store for an explicitly named file, which must exist
    /// when loaded.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self {
            config_path,
            required: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    pub async fn load(&self) -> Result<CaptureConfig> {
        if !self.config_path.exists() {
            if self.required {
                return Err(Error::Config(format!(
                    "Config file {} not found",
                    self.config_path.display()
                )));
            }
            return Ok(CaptureConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &CaptureConfig) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_required_file_is_error() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::with_path(dir.path().join("absent.json"));
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::with_path(dir.path().join("nested").join("config.json"));

        let config = CaptureConfig {
            protocols: "ssh,snmp".to_string(),
            ssh_ports: "22,2222-2224".to_string(),
            snmp_ports: "161-162".to_string(),
            ssh_host_key: Some(PathBuf::from("/etc/bounty/ssh_host_key")),
            bind_address: "127.0.0.1".parse().unwrap(),
            stop_timeout_secs: 2,
        };

        store.save(&config).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, config);
        assert!(!dir.path().join("nested").join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"protocols": "snmp", "snmpPorts": "1161"}"#).unwrap();

        let loaded = ConfigStore::with_path(path).load().await.unwrap();
        assert_eq!(loaded.protocols, "snmp");
        assert_eq!(loaded.port_spec(Protocol::Snmp), "1161");
        assert_eq!(loaded.port_spec(Protocol::Ssh), "22");
        assert_eq!(loaded.stop_timeout(), Duration::from_secs(5));
        assert!(loaded.bind_address.is_unspecified());
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = ConfigStore::with_path(path).load().await;
        tokio_test::assert_err!(result);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let json = serde_json::to_string(&CaptureConfig::default()).unwrap();
        assert!(json.contains("\"sshPorts\":\"22\""));
        assert!(json.contains("\"stopTimeoutSecs\":5"));
        assert!(!json.contains("sshHostKey"));
    }
}
