use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Serialize)]
struct PortEntry {
    name: String,
    kind: String,
}

pub fn execute(json: bool) -> Result<()> {
    let ports = serialport::available_ports().context("Failed to enumerate serial ports")?;

    if json {
        let entries: Vec<PortEntry> = ports
            .iter()
            .map(|p| PortEntry {
                name: p.port_name.clone(),
                kind: format!("{:?}", p.port_type),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    println!("Available Serial Ports:");
    println!("{:-<60}", "");
    for port in &ports {
        println!("  {} [{:?}]", port.port_name, port.port_type);
    }

    Ok(())
}
