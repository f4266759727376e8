//! Panel connection and identity information

use std::fmt;

/// Default C3 panel TCP port
pub const DEFAULT_PORT: u16 = 4370;

/// Panel information
///
/// Host and port identify the connection; the remaining fields are filled
/// in by discovery or by the parameter fetch that follows a connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Host name or IP address
    pub host: String,
    
    /// TCP port
    pub port: u16,
    
    /// Device serial number
    pub serial_number: Option<String>,
    
    /// MAC address
    pub mac: Option<String>,
    
    /// Device name (user-assigned)
    pub device_name: Option<String>,
    
    /// Firmware version
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            serial_number: None,
            mac: None,
            device_name: None,
            firmware_version: None,
        }
    }
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("?")
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (SN: {}, FW: {}) @ {}:{}",
            or_unknown(&self.device_name),
            or_unknown(&self.serial_number),
            or_unknown(&self.firmware_version),
            self.host,
            self.port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_missing_fields() {
        let mut info = DeviceInfo::new("192.168.1.201", DEFAULT_PORT);
        assert_eq!(info.to_string(), "? (SN: ?, FW: ?) @ 192.168.1.201:4370");

        info.device_name = Some("C3-400".into());
        info.serial_number = Some("6404162101689".into());
        assert!(info.to_string().starts_with("C3-400 (SN: 6404162101689"));
    }
}
