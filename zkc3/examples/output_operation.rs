//! Open a door and an auxiliary output for a few seconds
//!
//! ```text
//! PANEL_IP=192.168.1.201 cargo run --example output_operation
//! ```

use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;
use zkc3::{ControlDevice, OutputAddress, Panel, PanelConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ip = std::env::var("PANEL_IP").unwrap_or_else(|_| "192.168.1.201".to_string());

    let mut panel = Panel::new(PanelConfig::new(ip));
    if !panel.connect().await {
        bail!("could not connect to {}", panel.host());
    }

    println!("Opening door 1 for 5 seconds...");
    panel
        .control_device(ControlDevice::output(1, OutputAddress::Door, 5))
        .await?;

    println!("Switching auxiliary output 1 on for 3 seconds...");
    panel
        .control_device(ControlDevice::output(1, OutputAddress::Aux, 3))
        .await?;
    println!("Aux out 1: {}", panel.aux_out_status(1));

    sleep(Duration::from_secs(4)).await;
    println!("Aux out 1: {}", panel.aux_out_status(1));

    panel.disconnect().await;
    Ok(())
}
