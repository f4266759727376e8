//! Error types for zkc3-core

/// Result type alias for zkc3 protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame is too short to be valid
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort {
        expected: usize,
        actual: usize,
    },
    
    /// Frame does not begin with the start marker
    #[error("Frame does not start with start marker: 0x{0:02X}")]
    InvalidStartMarker(u8),
    
    /// Frame does not end with the end marker
    #[error("Frame does not include end marker: 0x{0:02X}")]
    InvalidEndMarker(u8),
    
    /// Payload length differs from the length announced in the header
    #[error("Length of received message ({actual}) does not match specified size ({expected})")]
    LengthMismatch {
        expected: usize,
        actual: usize,
    },
    
    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },
    
    /// Panel replied with an error code
    #[error("Error {code} received in reply: {message}")]
    Device {
        code: i8,
        message: &'static str,
    },
    
    /// Reply carries another session id than the one negotiated
    #[error("Data received with invalid session ID: expected 0x{expected:04X}, got 0x{received:04X}")]
    SessionMismatch {
        expected: u16,
        received: u16,
    },
    
    /// Unknown command code
    #[error("Unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),
    
    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
    
    /// Payload too large
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
    
    /// Malformed real-time log or key/value content
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    
    /// Invalid value type
    #[error("Type error: {0}")]
    Types(#[from] zkc3_types::Error),
}

impl Error {
    /// Check if the error is caused by malformed framing
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            Self::PacketTooShort { .. }
                | Self::InvalidStartMarker(_)
                | Self::InvalidEndMarker(_)
                | Self::LengthMismatch { .. }
        )
    }
}
