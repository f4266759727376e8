//! Control device messages
//!
//! A control message is a fixed 5-byte payload sent with the CONTROL
//! command. It changes the state of doors, auxiliary relays and alarms.
//!
//! ```text
//! Byte:        0          1         2         3         4
//!          operation   param 1   param 2   param 3   param 4 (reserved, 0)
//! ```
//!
//! | Operation | Param 1 | Param 2 | Param 3 |
//! |-----------|---------|---------|---------|
//! | 1 Output | door or aux number | address type (1 door, 2 aux) | duration: 0 close, 255 normal open, 1-254 seconds |
//! | 2 Cancel alarm | 0 | 0 | 0 |
//! | 3 Restart device | 0 | 0 | 0 |
//! | 4 Normal open state | door number | 0 disable, 1 enable | 0 |

use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};

/// Control operation codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlOperation {
    Output = 1,
    CancelAlarm = 2,
    RestartDevice = 3,
    NormalOpenState = 4,
}

impl ControlOperation {
    pub fn description(self) -> &'static str {
        match self {
            Self::Output => "Output operation (door or auxiliary)",
            Self::CancelAlarm => "Cancel alarm",
            Self::RestartDevice => "Restart device",
            Self::NormalOpenState => "Enable/disable normal open state",
        }
    }
}

impl TryFrom<u8> for ControlOperation {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Output),
            2 => Ok(Self::CancelAlarm),
            3 => Ok(Self::RestartDevice),
            4 => Ok(Self::NormalOpenState),
            _ => Err(Error::InvalidRecord(format!("unknown control operation {value}"))),
        }
    }
}

/// Target of an output operation
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OutputAddress {
    Door = 1,
    Aux = 2,
}

impl OutputAddress {
    pub fn description(self) -> &'static str {
        match self {
            Self::Door => "Door output",
            Self::Aux => "Auxiliary output",
        }
    }
}

impl TryFrom<u8> for OutputAddress {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Door),
            2 => Ok(Self::Aux),
            _ => Err(Error::InvalidRecord(format!("unknown output address {value}"))),
        }
    }
}

/// Control device message
///
/// # Examples
///
/// ```
/// use zkc3_core::{ControlDevice, OutputAddress};
///
/// let open = ControlDevice::output(1, OutputAddress::Door, 200);
/// assert_eq!(open.to_bytes().as_ref(), &[0x01, 0x01, 0x01, 0xC8, 0x00]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlDevice {
    /// Open or close a door lock or auxiliary output
    Output {
        number: u8,
        address: OutputAddress,
        duration: u8,
    },

    /// Cancel all active alarms
    CancelAlarm,

    /// Restart the panel
    Restart,

    /// Enable or disable the normal open state of a door
    NormalOpenState { door: u8, enable: bool },
}

impl ControlDevice {
    /// Duration that keeps an output open until told otherwise
    pub const NORMAL_OPEN: u8 = 255;

    /// Duration that closes an output
    pub const CLOSE: u8 = 0;

    /// Size of an encoded control message
    pub const SIZE: usize = 5;

    pub fn output(number: u8, address: OutputAddress, duration: u8) -> Self {
        Self::Output {
            number,
            address,
            duration,
        }
    }

    pub fn cancel_alarm() -> Self {
        Self::CancelAlarm
    }

    pub fn restart() -> Self {
        Self::Restart
    }

    pub fn normal_open_state(door: u8, enable: bool) -> Self {
        Self::NormalOpenState { door, enable }
    }

    pub fn operation(&self) -> ControlOperation {
        match self {
            Self::Output { .. } => ControlOperation::Output,
            Self::CancelAlarm => ControlOperation::CancelAlarm,
            Self::Restart => ControlOperation::RestartDevice,
            Self::NormalOpenState { .. } => ControlOperation::NormalOpenState,
        }
    }

    fn params(&self) -> [u8; 4] {
        match *self {
            Self::Output {
                number,
                address,
                duration,
            } => [number, address as u8, duration, 0],
            Self::CancelAlarm | Self::Restart => [0; 4],
            Self::NormalOpenState { door, enable } => [door, u8::from(enable), 0, 0],
        }
    }

    /// Encode as CONTROL payload
    pub fn to_bytes(&self) -> Bytes {
        let [p1, p2, p3, p4] = self.params();
        Bytes::copy_from_slice(&[self.operation() as u8, p1, p2, p3, p4])
    }

    /// Decode a CONTROL payload
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::PacketTooShort {
                expected: Self::SIZE,
                actual: data.len(),
            });
        }

        match ControlOperation::try_from(data[0])? {
            ControlOperation::Output => Ok(Self::output(
                data[1],
                OutputAddress::try_from(data[2])?,
                data[3],
            )),
            ControlOperation::CancelAlarm => Ok(Self::CancelAlarm),
            ControlOperation::RestartDevice => Ok(Self::Restart),
            ControlOperation::NormalOpenState => Ok(Self::normal_open_state(data[1], data[2] != 0)),
        }
    }
}

impl fmt::Display for ControlDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Output {
                number,
                address,
                duration,
            } => match duration {
                Self::CLOSE => write!(f, "Close {} {}", address.description(), number),
                Self::NORMAL_OPEN => write!(f, "Open {} {} (normal open)", address.description(), number),
                _ => write!(f, "Open {} {} for {}s", address.description(), number, duration),
            },
            Self::NormalOpenState { door, enable } => write!(
                f,
                "{} normal open state of door {}",
                if enable { "Enable" } else { "Disable" },
                door
            ),
            _ => f.write_str(self.operation().description()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_door() {
        let control = ControlDevice::output(1, OutputAddress::Door, 200);
        assert_eq!(control.to_bytes().as_ref(), &[0x01, 0x01, 0x01, 0xC8, 0x00]);

        let control = ControlDevice::output(3, OutputAddress::Door, 200);
        assert_eq!(control.to_bytes().as_ref(), &[0x01, 0x03, 0x01, 0xC8, 0x00]);
    }

    #[test]
    fn test_output_aux() {
        let control = ControlDevice::output(2, OutputAddress::Aux, 100);
        assert_eq!(control.to_bytes().as_ref(), &[0x01, 0x02, 0x02, 0x64, 0x00]);
    }

    #[test]
    fn test_cancel_alarm() {
        assert_eq!(
            ControlDevice::cancel_alarm().to_bytes().as_ref(),
            &[0x02, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_restart() {
        assert_eq!(
            ControlDevice::restart().to_bytes().as_ref(),
            &[0x03, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_normal_open_state() {
        let control = ControlDevice::normal_open_state(2, true);
        assert_eq!(control.to_bytes().as_ref(), &[0x04, 0x02, 0x01, 0x00, 0x00]);
        assert_eq!(control.to_string(), "Enable normal open state of door 2");
    }

    #[test]
    fn test_from_bytes() {
        let control = ControlDevice::from_bytes(&[0x01, 0x02, 0x02, 0x05, 0x00]).unwrap();
        assert_eq!(control, ControlDevice::output(2, OutputAddress::Aux, 5));

        assert!(ControlDevice::from_bytes(&[0x01, 0x02]).is_err());
        assert!(ControlDevice::from_bytes(&[0x09, 0x00, 0x00, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ControlDevice::output(1, OutputAddress::Door, 255).to_string(),
            "Open Door output 1 (normal open)"
        );
        assert_eq!(ControlDevice::cancel_alarm().to_string(), "Cancel alarm");
    }
}
