//! Transport layer for the C3 protocol
//!
//! Provides the TCP stream used for panel sessions and the UDP broadcast
//! socket used for discovery.

pub mod error;
pub mod tcp;
pub mod udp;

pub use error::{Error, Result};
pub use tcp::TcpTransport;
pub use udp::{local_ipv4_addresses, DiscoverySocket};

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Byte stream to a panel
///
/// A transport can be connected, closed and connected again; the panel
/// client reopens it when falling back to a session-less connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection to `host:port`
    async fn connect(&mut self, host: &str, port: u16) -> Result<()>;

    /// Close the connection; closing a closed transport is a no-op
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Send raw bytes, returning the number of bytes written
    async fn send(&mut self, data: &[u8]) -> Result<usize>;

    /// Receive exactly `len` bytes
    ///
    /// Fails with [`Error::ReadTimeout`] when `len` bytes do not arrive
    /// within `timeout`. Bytes read so far are kept for the next call.
    async fn receive(&mut self, len: usize, timeout: Duration) -> Result<BytesMut>;

    /// Remote address, for logging
    fn remote_addr(&self) -> String;
}
