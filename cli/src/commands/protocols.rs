//! Protocols command - list supported capture protocols.

use anyhow::Result;
use bounty_core::Protocol;
use serde_json::json;

pub fn run(json: bool) -> Result<()> {
    if json {
        let protocols: Vec<_> = Protocol::ALL
            .iter()
            .map(|p| {
                json!({
                    "name": p.name(),
                    "transport": p.transport(),
                    "defaultPorts": p.default_ports(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&protocols)?);
        return Ok(());
    }

    println!("{:<10} {:<10} DEFAULT PORTS", "PROTOCOL", "TRANSPORT");
    println!("{}", "-".repeat(36));
    for protocol in Protocol::ALL {
        println!(
            "{:<10} {:<10} {}",
            protocol.name(),
            protocol.transport().to_string(),
            protocol.default_ports()
        );
    }
    Ok(())
}
