//! Find panels on the local network

use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use zkc3::Panel;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let interface = match std::env::var("INTERFACE_IP") {
        Ok(ip) => Some(ip.parse()?),
        Err(_) => None,
    };

    let devices = Panel::discover(interface, Duration::from_secs(2)).await?;
    if devices.is_empty() {
        println!("No panels found");
    }

    for device in devices {
        println!(
            "{} MAC={} SN={} Ver={}",
            device,
            device.mac.as_deref().unwrap_or("-"),
            device.serial_number.as_deref().unwrap_or("-"),
            device.firmware_version.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}
