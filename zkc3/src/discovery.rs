//! Panel discovery by UDP broadcast

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use zkc3_core::constants::DISCOVERY_MESSAGE;
use zkc3_core::message::reply_payload;
use zkc3_core::{kv, ChecksumMode, Command, Frame, ReplyCode};
use zkc3_transport::{local_ipv4_addresses, DiscoverySocket};
use zkc3_types::{DeviceInfo, DEFAULT_PORT};

use crate::error::Result;

/// Broadcast a discovery request and collect the panels that answer
///
/// With an `interface` address the request goes out on that interface
/// only. Otherwise it is broadcast from every local IPv4 interface at
/// once, and panels seen on several interfaces are reported once. Waits
/// `timeout` for replies.
pub async fn discover(interface: Option<IpAddr>, timeout: Duration) -> Result<Vec<DeviceInfo>> {
    if let Some(address) = interface {
        let socket = DiscoverySocket::bind(Some(address)).await?;
        return discover_on(&socket, timeout, ChecksumMode::Strict).await;
    }

    let mut tasks = JoinSet::new();
    for socket in bind_local_interfaces().await? {
        tasks.spawn(async move { discover_on(&socket, timeout, ChecksumMode::Strict).await });
    }

    let mut devices: Vec<DeviceInfo> = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(found)) => {
                for device in found {
                    if !devices.iter().any(|known| known.host == device.host) {
                        devices.push(device);
                    }
                }
            }
            Ok(Err(e)) => warn!("Discovery on one interface failed: {}", e),
            Err(e) => warn!("Discovery task failed: {}", e),
        }
    }

    Ok(devices)
}

/// One socket per local IPv4 interface, or a single wildcard socket
async fn bind_local_interfaces() -> Result<Vec<DiscoverySocket>> {
    let mut sockets = Vec::new();
    for address in local_ipv4_addresses() {
        match DiscoverySocket::bind(Some(address)).await {
            Ok(socket) => sockets.push(socket),
            Err(e) => warn!("Cannot discover on {}: {}", address, e),
        }
    }

    if sockets.is_empty() {
        debug!("No usable interface address, binding to all interfaces");
        sockets.push(DiscoverySocket::bind(None).await?);
    }

    Ok(sockets)
}

/// Run discovery on an already bound socket
pub async fn discover_on(
    socket: &DiscoverySocket,
    timeout: Duration,
    mode: ChecksumMode,
) -> Result<Vec<DeviceInfo>> {
    let request = Frame::request(Command::Discover, Bytes::from_static(DISCOVERY_MESSAGE.as_bytes()))
        .encode()?;

    debug!("Discovering panels from {}", socket.local_addr()?);
    socket.send(&request).await?;

    let mut devices = Vec::new();
    for (from, data) in socket.receive_all(timeout).await? {
        match parse_reply(&data, from, mode) {
            Ok(Some(device)) => {
                info!("Discovered {}", device);
                devices.push(device);
            }
            Ok(None) => debug!("Ignoring non-OK discovery reply from {}", from),
            Err(e) => warn!("Ignoring malformed discovery reply from {}: {}", from, e),
        }
    }

    Ok(devices)
}

/// Decode one discovery reply
///
/// The reply payload is a `key=value` list:
/// `MAC=00:17:61:C8:EC:17,IP=192.168.1.201,SN=DGD9190019050335134,Device=C3-400,Ver=AC Ver 4.3.4 Apr 28 2017`
fn parse_reply(data: &[u8], from: SocketAddr, mode: ChecksumMode) -> Result<Option<DeviceInfo>> {
    let header = Frame::decode_header(data)?;
    if header.command != ReplyCode::Ok as u8 {
        return Ok(None);
    }

    let frame = Frame::decode(data, mode)?;
    let params = kv::parse(&reply_payload(frame.command, frame.payload)?);

    let host = params
        .get("IP")
        .cloned()
        .unwrap_or_else(|| from.ip().to_string());

    let mut device = DeviceInfo::new(host, DEFAULT_PORT);
    device.mac = params.get("MAC").cloned();
    device.serial_number = params.get("SN").cloned();
    device.device_name = params.get("Device").cloned();
    device.firmware_version = params.get("Ver").cloned();

    Ok(Some(device))
}
