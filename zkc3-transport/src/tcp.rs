//! TCP transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// TCP transport for C3 panels
pub struct TcpTransport {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,

    /// Bytes received but not yet handed out
    buffer: BytesMut,

    connect_timeout: Duration,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            addr: String::new(),
            port: zkc3_core::DEFAULT_PORT,
            socket_addr: None,
            stream: None,
            buffer: BytesMut::with_capacity(1024),
            connect_timeout: Duration::from_secs(zkc3_core::constants::DEFAULT_CONNECT_TIMEOUT),
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.addr, self.port);

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .collect();

        let addr = addrs
            .first()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))?;

        self.socket_addr = Some(*addr);
        Ok(*addr)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        self.addr = host.to_string();
        self.port = port;
        let addr = self.resolve_addr().await?;

        debug!("Connecting to {}...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Requests are small and strictly request/reply
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        self.buffer.clear();
        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.remote_addr());

            let _ = stream.shutdown().await;
        }

        self.buffer.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {}", data.len(), hex::encode(data));

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(data.len())
    }

    async fn receive(&mut self, len: usize, read_timeout: Duration) -> Result<BytesMut> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let buffer = &mut self.buffer;

        let read = async {
            while buffer.len() < len {
                match stream.read_buf(buffer).await {
                    Ok(0) => return Err(Error::ConnectionClosed),
                    Ok(_) => {}
                    Err(e) => return Err(Error::Io(e)),
                }
            }
            Ok(())
        };

        match timeout(read_timeout, read).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.stream = None;
                self.buffer.clear();
                return Err(e);
            }
            Err(_) => return Err(Error::ReadTimeout),
        }

        let data = self.buffer.split_to(len);
        trace!("Received {} bytes: {}", len, hex::encode(&data));

        Ok(data)
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("TCP transport dropped while still connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_transport_create() {
        let transport = TcpTransport::new();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_tcp_transport_invalid_address() {
        let mut transport = TcpTransport::new().with_connect_timeout(Duration::from_millis(100));

        let result = transport.connect("invalid..address", 4370).await;
        assert!(result.is_err());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_send_before_connect() {
        let mut transport = TcpTransport::new();
        assert!(matches!(transport.send(&[0xAA]).await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_receive_exact_and_keep_remainder() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 3];
            socket.read_exact(&mut request).await.unwrap();
            socket.write_all(&[1, 2, 3, 4, 5, 6, 7, 8]).await.unwrap();
            request
        });

        let mut transport = TcpTransport::new();
        transport.connect("127.0.0.1", port).await.unwrap();
        assert_eq!(transport.send(&[0xAA, 0x01, 0x55]).await.unwrap(), 3);

        let first = transport.receive(5, Duration::from_secs(2)).await.unwrap();
        assert_eq!(first.as_ref(), &[1, 2, 3, 4, 5]);
        let rest = transport.receive(3, Duration::from_secs(2)).await.unwrap();
        assert_eq!(rest.as_ref(), &[6, 7, 8]);

        assert_eq!(server.await.unwrap(), [0xAA, 0x01, 0x55]);
        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_receive_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(&[1, 2]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let mut transport = TcpTransport::new();
        transport.connect("127.0.0.1", port).await.unwrap();

        let result = transport.receive(5, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(Error::ReadTimeout)));
        assert!(transport.is_connected());

        transport.disconnect().await.unwrap();
        server.abort();
    }
}
