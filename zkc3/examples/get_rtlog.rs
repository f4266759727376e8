//! Poll the real-time log and print lock status
//!
//! ```text
//! PANEL_IP=192.168.1.201 RUST_LOG=zkc3=debug cargo run --example get_rtlog
//! ```

use std::time::Duration;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;
use zkc3::{Panel, PanelConfig, RtLogRecord};

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
    println!("Connected to {}", panel.device_info());

    for _ in 0..10 {
        for record in panel.get_rt_log().await? {
            match &record {
                RtLogRecord::Event(event) => println!("Event: {}", event),
                RtLogRecord::DoorAlarmStatus(status) => println!("Status: {}", status),
            }
        }

        for door in 1..=panel.lock_count() {
            println!("  Door {}: {}", door, panel.lock_status(door));
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    panel.disconnect().await;
    Ok(())
}
