//! # zkc3-core
//!
//! Core protocol implementation for ZKAccess C3 access control panels.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - CRC-16 checksum calculation
//! - Command and reply codes
//! - Control device messages
//! - Real-time log decoding (binary and key/value)
//! - Session bookkeeping

pub mod checksum;
pub mod command;
pub mod constants;
pub mod control;
pub mod error;
pub mod kv;
pub mod message;
pub mod rtlog;
pub mod session;

pub use command::{Command, ReplyCode};
pub use control::{ControlDevice, ControlOperation, OutputAddress};
pub use error::{Error, Result};
pub use message::{ChecksumMode, Frame, FrameHeader};
pub use rtlog::{DoorAlarmStatusRecord, EventRecord, RtLogRecord};
pub use session::{Session, SessionState};

/// Protocol version sent in every request
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Default panel port
pub const DEFAULT_PORT: u16 = 4370;

/// Frame header size (start, version, command, length)
pub const HEADER_SIZE: usize = 5;

/// Frame trailer size (checksum, end)
pub const TRAILER_SIZE: usize = 3;
