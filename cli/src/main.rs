//! Bounty CLI - Multi-protocol network honeypot
//!
//! Starts the configured protocol capture listeners, logs every
//! interaction and shuts down cleanly on SIGINT/SIGTERM.

mod commands;

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bounty")]
#[command(author, version, about = "Multi-protocol network honeypot")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the capture listeners (default)
    #[command(alias = "run")]
    Capture(CaptureArgs),

    /// Resolve a port specification and print the result
    Ports {
        /// Port specification, e.g. "22,2222-2224"
        spec: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the supported protocols
    #[command(alias = "ls")]
    Protocols {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Config file path (default: ~/.bounty/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Overrides applied on top of the configuration file.
#[derive(Args, Debug, Default)]
pub struct CaptureArgs {
    /// Comma-separated protocols to enable, e.g. "ssh,snmp"
    #[arg(short, long)]
    pub protocols: Option<String>,

    /// Ports for the SSH listeners
    #[arg(long, value_name = "SPEC")]
    pub ssh_ports: Option<String>,

    /// Ports for the SNMP listeners
    #[arg(long, value_name = "SPEC")]
    pub snmp_ports: Option<String>,

    /// Path to the SSH host private key
    #[arg(long, value_name = "PATH")]
    pub ssh_host_key: Option<PathBuf>,

    /// Address to bind every listener to
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<IpAddr>,

    /// Seconds to wait for each listener to stop
    #[arg(long, value_name = "SECS")]
    pub stop_timeout: Option<u64>,

    /// Config file path (default: ~/.bounty/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json)?;

    match cli.command {
        Some(Commands::Capture(args)) => commands::capture::run(args).await?,
        Some(Commands::Ports { spec, json }) => commands::ports::run(&spec, json)?,
        Some(Commands::Protocols { json }) => commands::protocols::run(json)?,
        Some(Commands::Config { init, json, config }) => {
            commands::config::run(config, init, json).await?
        }
        None => commands::capture::run(CaptureArgs::default()).await?,
    }

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// Captured interactions are logged at info, so that is the floor unless
/// `RUST_LOG` says otherwise.
fn init_tracing(verbose: u8, json: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let initialized = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    initialized.context("Failed to initialize tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_capture() {
        let cli = Cli::try_parse_from(["bounty", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_capture_flags() {
        let cli = Cli::try_parse_from([
            "bounty",
            "capture",
            "--protocols",
            "ssh,snmp",
            "--ssh-ports",
            "2222-2224",
            "--bind",
            "127.0.0.1",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Capture(args)) => {
                assert_eq!(args.protocols.as_deref(), Some("ssh,snmp"));
                assert_eq!(args.ssh_ports.as_deref(), Some("2222-2224"));
                assert_eq!(args.bind, Some("127.0.0.1".parse().unwrap()));
                assert_eq!(args.snmp_ports, None);
            }
            _ => panic!("expected capture subcommand"),
        }
    }

    #[test]
    fn test_invalid_bind_address_rejected() {
        assert!(Cli::try_parse_from(["bounty", "capture", "--bind", "nope"]).is_err());
    }
}
