//! UDP broadcast socket for panel discovery
//!
//! Discovery requests are broadcast to port 65535; every panel on the
//! segment answers with one datagram describing itself.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::error::*;
use zkc3_core::constants::BROADCAST_PORT;

/// Maximum size of a discovery reply datagram
const MAX_DATAGRAM: usize = 64 * 1024;

/// IPv4 addresses of the local interfaces, loopback excluded
///
/// Returns an empty list when the interfaces cannot be listed.
pub fn local_ipv4_addresses() -> Vec<IpAddr> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("Listing network interfaces failed: {}", e);
            return Vec::new();
        }
    };

    let mut addresses: Vec<IpAddr> = interfaces
        .into_iter()
        .filter(|interface| !interface.is_loopback())
        .map(|interface| interface.ip())
        .filter(IpAddr::is_ipv4)
        .collect();
    addresses.sort();
    addresses.dedup();
    addresses
}

/// Broadcast socket bound to one local interface
pub struct DiscoverySocket {
    socket: UdpSocket,
    target: SocketAddr,
}

impl DiscoverySocket {
    /// Bind to `interface`, or to all interfaces when `None`
    pub async fn bind(interface: Option<IpAddr>) -> Result<Self> {
        let local = SocketAddr::new(interface.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), 0);

        let socket = UdpSocket::bind(local).await.map_err(Error::Io)?;
        socket.set_broadcast(true)?;

        debug!("Discovery socket bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            target: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), BROADCAST_PORT),
        })
    }

    /// Send requests to `target` instead of the broadcast address
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one request datagram
    pub async fn send(&self, data: &[u8]) -> Result<usize> {
        trace!("Broadcasting {} bytes to {}: {}", data.len(), self.target, hex::encode(data));

        Ok(self.socket.send_to(data, self.target).await?)
    }

    /// Collect reply datagrams until `wait` has elapsed
    pub async fn receive_all(&self, wait: Duration) -> Result<Vec<(SocketAddr, BytesMut)>> {
        let deadline = Instant::now() + wait;
        let mut replies = Vec::new();

        loop {
            let mut buf = BytesMut::zeroed(MAX_DATAGRAM);

            match timeout_at(deadline, self.socket.recv_from(&mut buf)).await {
                Err(_) => break,
                Ok(Err(e)) => {
                    warn!("Discovery receive failed: {}", e);
                    return Err(Error::Io(e));
                }
                Ok(Ok((0, _))) => continue,
                Ok(Ok((n, from))) => {
                    buf.truncate(n);
                    trace!("Received {} bytes from {}: {}", n, from, hex::encode(&buf));
                    replies.push((from, buf));
                }
            }
        }

        debug!("Discovery collected {} replies", replies.len());
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_bind_any() {
        let socket = DiscoverySocket::bind(None).await.unwrap();
        assert!(socket.local_addr().unwrap().ip().is_unspecified());
    }

    #[test]
    fn test_local_addresses_skip_loopback() {
        for address in local_ipv4_addresses() {
            assert!(address.is_ipv4());
            assert!(!address.is_loopback());
        }
    }

    #[tokio::test]
    async fn test_send_and_collect_replies() {
        let responder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let responder_addr = responder.local_addr().unwrap();

        let socket = DiscoverySocket::bind(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)))
            .await
            .unwrap()
            .with_target(responder_addr);

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (n, from) = responder.recv_from(&mut buf).await.unwrap();
            responder.send_to(b"first", from).await.unwrap();
            responder.send_to(b"second", from).await.unwrap();
            buf[..n].to_vec()
        });

        assert_eq!(socket.send(b"hello").await.unwrap(), 5);
        let replies = socket.receive_all(Duration::from_millis(300)).await.unwrap();

        assert_eq!(server.await.unwrap(), b"hello".to_vec());
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].0, responder_addr);
        assert_eq!(replies[0].1.as_ref(), b"first");
        assert_eq!(replies[1].1.as_ref(), b"second");
    }

    #[tokio::test]
    async fn test_no_replies() {
        let socket = DiscoverySocket::bind(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)))
            .await
            .unwrap();

        let replies = socket.receive_all(Duration::from_millis(50)).await.unwrap();
        assert!(replies.is_empty());
    }
}
