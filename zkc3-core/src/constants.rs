//! Protocol constants

/// First byte of every frame
pub const MESSAGE_START: u8 = 0xAA;

/// Last byte of every frame
pub const MESSAGE_END: u8 = 0x55;

/// UDP port discovery requests are broadcast to
pub const BROADCAST_PORT: u16 = 65535;

/// Payload of a discovery request
pub const DISCOVERY_MESSAGE: &str = "CallSecurityDevice";

/// Session id sent while a session is being negotiated
pub const INITIAL_SESSION_ID: u16 = 0xFEFE;

/// First request sequence number of a session
pub const INITIAL_REQUEST_NR: i32 = -258;

/// Default read timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 2;

/// Default connection timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Header read attempts before the connection is presumed dead
pub const MAX_RETRIES: usize = 3;

/// Size of one binary real-time log record
pub const RTLOG_RECORD_SIZE: usize = 16;

/// Number of doors described by a door/alarm status record
pub const STATUS_DOOR_COUNT: usize = 4;

/// Error codes returned in the last payload byte of an error reply
const ERRORS: &[(i8, &str)] = &[
    (-1, "The command is not sent successfully"),
    (-2, "The command has no response"),
    (-3, "The buffer is not enough"),
    (-4, "The decompression fails"),
    (-5, "The length of the read data is not correct"),
    (-6, "The length of the decompressed data is not consistent with the expected length"),
    (-7, "The command is repeated"),
    (-8, "The connection is not authorized"),
    (-9, "Data error: The CRC result is failure"),
    (-10, "Data error: PullSDK cannot resolve the data"),
    (-11, "Data parameter error"),
    (-12, "The command is not executed correctly"),
    (-13, "Command error: This command is not available"),
    (-14, "The communication password is not correct"),
    (-15, "Fail to write the file"),
    (-16, "Fail to read the file"),
    (-17, "The file does not exist"),
    (-99, "Unknown error"),
    (-100, "The table structure does not exist"),
    (-101, "In the table structure, the Condition field does not exist"),
    (-102, "The total number of fields is not consistent"),
    (-103, "The sequence of fields is not consistent"),
    (-104, "Real-time event data error"),
    (-105, "Data errors occur during data resolution"),
    (-106, "Data overflow: The delivered data is more than 4 MB in length"),
    (-107, "Fail to get the table structure"),
    (-108, "Invalid options"),
];

/// Look up the description of a device error code
pub fn error_message(code: i8) -> &'static str {
    ERRORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, message)| *message)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(-13), "Command error: This command is not available");
        assert_eq!(error_message(-14), "The communication password is not correct");
        assert_eq!(error_message(42), "Unknown");
    }
}
