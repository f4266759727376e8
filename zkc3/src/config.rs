//! Panel connection configuration

use std::time::Duration;

use zkc3_core::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, MAX_RETRIES};
use zkc3_core::ChecksumMode;
use zkc3_types::{DeviceInfo, DEFAULT_PORT};

/// Real-time log polling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RtLogMode {
    /// 16-byte binary records (RTLOG_BINARY)
    #[default]
    Binary,

    /// `key=value` text records (RTLOG_KEYVALUE)
    KeyValue,
}

/// Panel connection settings
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use zkc3::PanelConfig;
///
/// let config = PanelConfig::new("192.168.1.201")
///     .with_password("secret")
///     .with_read_timeout(Duration::from_secs(5));
/// assert_eq!(config.port, 4370);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Host name or IP address
    pub host: String,

    pub port: u16,

    /// Plain-text password sent with the connect request
    pub password: Option<String>,

    pub connect_timeout: Duration,

    /// Timeout of a single read
    pub read_timeout: Duration,

    /// Header read attempts before the connection is presumed dead
    pub header_retries: usize,

    pub checksum_mode: ChecksumMode,

    /// Polling mode used right after connecting
    pub rtlog_mode: RtLogMode,
}

impl PanelConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set header read attempts; at least one attempt is always made
    pub fn with_header_retries(mut self, retries: usize) -> Self {
        self.header_retries = retries.max(1);
        self
    }

    pub fn with_checksum_mode(mut self, mode: ChecksumMode) -> Self {
        self.checksum_mode = mode;
        self
    }

    pub fn with_rtlog_mode(mut self, mode: RtLogMode) -> Self {
        self.rtlog_mode = mode;
        self
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            password: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
            header_retries: MAX_RETRIES,
            checksum_mode: ChecksumMode::Strict,
            rtlog_mode: RtLogMode::Binary,
        }
    }
}

/// Connect to a discovered panel
impl From<&DeviceInfo> for PanelConfig {
    fn from(device: &DeviceInfo) -> Self {
        Self::new(device.host.clone()).with_port(device.port)
    }
}
