//! Capture command - run the honeypot until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use bounty_core::shutdown::{self, spawn_signal_bridge, ShutdownListener};
use bounty_core::{
    CaptureConfig, CaptureLauncher, ConfigStore, LaunchPlan, Orchestrator, ShutdownReport,
};

use crate::CaptureArgs;

pub async fn run(args: CaptureArgs) -> Result<()> {
    let store = match &args.config {
        Some(path) => ConfigStore::with_path(path.clone()),
        None => ConfigStore::new()?,
    };
    let mut config = store
        .load()
        .await
        .with_context(|| format!("Failed to load config from {}", store.path().display()))?;
    apply_overrides(&mut config, args);

    // Signals must be routed before any listener exists. `trigger` stays in
    // scope so the wait below only ends on a real request.
    let (trigger, listener) = shutdown::channel();
    let signals =
        spawn_signal_bridge(trigger.clone()).context("Failed to register signal handlers")?;

    let result = capture_until(&config, listener).await;
    signals.abort();
    result
}

/// Start every configured listener, wait for `shutdown` and stop them.
async fn capture_until(config: &CaptureConfig, shutdown: ShutdownListener) -> Result<()> {
    let plan = LaunchPlan::build(config).await?;
    let mut orchestrator = Orchestrator::new(CaptureLauncher::new());
    orchestrator.start(&plan).await?;

    let report = orchestrator.run_until_shutdown(shutdown).await;
    print_report(&report);
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut CaptureConfig, args: CaptureArgs) {
    if let Some(protocols) = args.protocols {
        config.protocols = protocols;
    }
    if let Some(ports) = args.ssh_ports {
        config.ssh_ports = ports;
    }
    if let Some(ports) = args.snmp_ports {
        config.snmp_ports = ports;
    }
    if let Some(path) = args.ssh_host_key {
        config.ssh_host_key = Some(path);
    }
    if let Some(addr) = args.bind {
        config.bind_address = addr;
    }
    if let Some(secs) = args.stop_timeout {
        config.stop_timeout_secs = secs;
    }
}

fn print_report(report: &ShutdownReport) {
    if report.attempted() == 0 {
        return;
    }

    println!(
        "{:<10} {:<6} {:<14} {:<8} UPTIME",
        "PROTOCOL", "PORT", "INTERACTIONS", "PEERS"
    );
    println!("{}", "-".repeat(50));

    for stopped in &report.stopped {
        println!(
            "{:<10} {:<6} {:<14} {:<8} {}s",
            stopped.protocol.name(),
            stopped.port,
            stopped.interactions,
            stopped.unique_peers,
            stopped.uptime_secs
        );
    }

    for failure in &report.failures {
        println!("! {}", failure);
    }

    println!(
        "\nStopped {} listeners ({} failed)",
        report.attempted(),
        report.failures.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    use tempfile::TempDir;

    fn empty_config_file() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_unknown_protocol_fails_startup() {
        let (_dir, path) = empty_config_file();

        let err = run(CaptureArgs {
            protocols: Some("telnet".to_string()),
            config: Some(path),
            ..CaptureArgs::default()
        })
        .await
        .unwrap_err();

        assert!(err
            .to_string()
            .contains("at least one protocol must be enabled"));
    }

    #[tokio::test]
    async fn test_reversed_port_range_fails_startup() {
        let (_dir, path) = empty_config_file();

        let err = run(CaptureArgs {
            protocols: Some("snmp".to_string()),
            snmp_ports: Some("10-5".to_string()),
            config: Some(path),
            ..CaptureArgs::default()
        })
        .await
        .unwrap_err();

        let msg = format!("{:#}", err);
        assert!(msg.contains("\"10-5\""));
        assert!(msg.contains("snmp"));
    }

    #[tokio::test]
    async fn test_missing_config_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();

        let result = run(CaptureArgs {
            config: Some(dir.path().join("absent.json")),
            ..CaptureArgs::default()
        })
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clean_shutdown_after_request() {
        let port = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = CaptureConfig {
            protocols: "snmp".to_string(),
            snmp_ports: port.to_string(),
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            stop_timeout_secs: 1,
            ..CaptureConfig::default()
        };

        let (trigger, listener) = shutdown::channel();
        assert!(trigger.request());
        assert!(!trigger.request());

        capture_until(&config, listener).await.unwrap();
        assert!(std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, port)).is_ok());
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut config = CaptureConfig {
            snmp_ports: "1161".to_string(),
            ..CaptureConfig::default()
        };

        apply_overrides(
            &mut config,
            CaptureArgs {
                protocols: Some("ssh,snmp".to_string()),
                ssh_ports: Some("2222".to_string()),
                stop_timeout: Some(1),
                ..CaptureArgs::default()
            },
        );

        assert_eq!(config.protocols, "ssh,snmp");
        assert_eq!(config.ssh_ports, "2222");
        assert_eq!(config.snmp_ports, "1161");
        assert_eq!(config.stop_timeout_secs, 1);
        assert!(config.ssh_host_key.is_none());
    }
}
