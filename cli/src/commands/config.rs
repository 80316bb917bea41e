//! Config command - show or initialize the configuration file.

use std::path::PathBuf;

use anyhow::{bail, Result};
use bounty_core::{CaptureConfig, ConfigStore};

pub async fn run(path: Option<PathBuf>, init: bool, json: bool) -> Result<()> {
    let store = match path {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    };

    if init {
        if store.path().exists() {
            bail!("Config file {} already exists", store.path().display());
        }
        store.save(&CaptureConfig::default()).await?;
        println!("Wrote default configuration to {}", store.path().display());
        return Ok(());
    }

    let config = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config file: {}", store.path().display());
    println!();
    println!("Protocols:     {}", config.protocols);
    println!("SSH ports:     {}", config.ssh_ports);
    println!("SNMP ports:    {}", config.snmp_ports);
    println!(
        "SSH host key:  {}",
        config
            .ssh_host_key
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("Bind address:  {}", config.bind_address);
    println!("Stop timeout:  {}s", config.stop_timeout_secs);

    Ok(())
}
