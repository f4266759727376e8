//! Synchronize the panel clock with the local time

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;
use zkc3::{Panel, PanelConfig};

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

    let now = chrono::Local::now().naive_local();
    panel.set_device_datetime(now).await?;
    println!("Panel time set to {}", now);

    for table in panel.get_data_table_config().await? {
        println!("{}", table);
    }

    panel.disconnect().await;
    Ok(())
}
