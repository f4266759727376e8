//! C3 protocol command and reply codes

use std::fmt;

use crate::error::{Error, Result};

/// Request command codes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    // Connection commands
    ConnectSessionLess = 0x01,
    Disconnect = 0x02,
    ConnectSession = 0x76,

    // Device parameters
    DateTime = 0x03,
    GetParam = 0x04,

    // Device interaction
    Control = 0x05,

    // Data tables
    DataTableCfg = 0x06,
    GetData = 0x08,

    // Real-time events
    RtLogBinary = 0x0B,
    RtLogKeyValue = 0x79,

    // UDP broadcast
    Discover = 0x14,
}

impl Command {
    /// Get command name
    pub fn name(self) -> &'static str {
        match self {
            Self::ConnectSessionLess => "CONNECT_SESSION_LESS",
            Self::Disconnect => "DISCONNECT",
            Self::ConnectSession => "CONNECT_SESSION",
            Self::DateTime => "DATETIME",
            Self::GetParam => "GETPARAM",
            Self::Control => "CONTROL",
            Self::DataTableCfg => "DATATABLE_CFG",
            Self::GetData => "GETDATA",
            Self::RtLogBinary => "RTLOG_BINARY",
            Self::RtLogKeyValue => "RTLOG_KEYVALUE",
            Self::Discover => "DISCOVER",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::ConnectSessionLess),
            0x02 => Ok(Self::Disconnect),
            0x76 => Ok(Self::ConnectSession),
            0x03 => Ok(Self::DateTime),
            0x04 => Ok(Self::GetParam),
            0x05 => Ok(Self::Control),
            0x06 => Ok(Self::DataTableCfg),
            0x08 => Ok(Self::GetData),
            0x0B => Ok(Self::RtLogBinary),
            0x79 => Ok(Self::RtLogKeyValue),
            0x14 => Ok(Self::Discover),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Reply codes sent by the panel in the command field
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReplyCode {
    Ok = 0xC8,
    Error = 0xC9,
}

impl ReplyCode {
    /// Check if this is a success reply
    pub fn is_success(self) -> bool {
        self == Self::Ok
    }
}

impl TryFrom<u8> for ReplyCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0xC8 => Ok(Self::Ok),
            0xC9 => Ok(Self::Error),
            _ => Err(Error::UnknownCommand(value)),
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "REPLY_OK(0xC8)"),
            Self::Error => write!(f, "REPLY_ERROR(0xC9)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_conversion() {
        assert_eq!(u8::from(Command::ConnectSession), 0x76);
        assert_eq!(Command::try_from(0x0B).unwrap(), Command::RtLogBinary);
        assert_eq!(Command::try_from(0x79).unwrap(), Command::RtLogKeyValue);
    }

    #[test]
    fn test_reply_code() {
        assert_eq!(ReplyCode::try_from(0xC8).unwrap(), ReplyCode::Ok);
        assert!(ReplyCode::Ok.is_success());
        assert!(!ReplyCode::Error.is_success());
        assert!(ReplyCode::try_from(0x01).is_err());
    }

    #[test]
    fn test_unknown_command() {
        let result = Command::try_from(0xEE);
        assert!(matches!(result, Err(Error::UnknownCommand(0xEE))));
    }

    #[test]
    fn test_command_display() {
        assert_eq!(Command::GetParam.to_string(), "GETPARAM(0x04)");
    }
}
