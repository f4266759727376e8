//! Type definitions for zkc3
//!
//! Value types shared by the protocol core and the high-level client:
//! device information, the C3 pseudo-calendar, and the wire enumerations
//! found in real-time log records.

#[macro_use]
mod macros;

pub mod datetime;
pub mod device_info;
pub mod error;
pub mod events;
pub mod status;

pub use datetime::C3DateTime;
pub use device_info::{DeviceInfo, DEFAULT_PORT};
pub use error::{Error, Result};
pub use events::{EventType, InOutDirection, VerificationMode};
pub use status::{AlarmStatus, DoorSettings, InOutStatus, SensorType};
