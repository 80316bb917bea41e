//! Ports command - resolve a port specification.

use anyhow::Result;
use bounty_core::PortSet;

pub fn run(spec: &str, json: bool) -> Result<()> {
    let ports = PortSet::resolve(spec)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    for port in &ports {
        println!("{}", port);
    }
    println!("\nTotal: {} ports", ports.len());
    Ok(())
}
