//! # zkc3
//!
//! Client for ZKAccess C3 access control panels (C3-100, C3-200, C3-400).
//!
//! ## Features
//!
//! - Session and session-less connections over TCP
//! - Panel discovery by UDP broadcast
//! - Real-time log polling, binary and key/value
//! - Door lock and auxiliary output control
//! - Tracked lock and auxiliary I/O status, including auto-close of timed outputs
//!
//! ## Quick Start
//!
//! ```no_run
//! use zkc3::{ControlDevice, OutputAddress, Panel, PanelConfig};
//!
//! #[tokio::main]
//! async fn main() -> zkc3::Result<()> {
//!     let mut panel = Panel::new(PanelConfig::new("192.168.1.201"));
//!
//!     if !panel.connect().await {
//!         eprintln!("Panel not reachable");
//!         return Ok(());
//!     }
//!     println!("{}", panel.device_info());
//!
//!     // Open door 1 for five seconds
//!     panel
//!         .control_device(ControlDevice::output(1, OutputAddress::Door, 5))
//!         .await?;
//!
//!     for record in panel.get_rt_log().await? {
//!         println!("{}", record);
//!     }
//!
//!     panel.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod panel;
pub mod state;
pub mod table;

pub use config::{PanelConfig, RtLogMode};
pub use error::{Error, Result};
pub use panel::Panel;
pub use state::{PanelState, PanelStatus, StatusKind};
pub use table::{DataField, DataTable, FieldType};

pub use zkc3_core::{
    ChecksumMode, Command, ControlDevice, ControlOperation, DoorAlarmStatusRecord, EventRecord,
    OutputAddress, RtLogRecord, SessionState,
};
pub use zkc3_transport::{TcpTransport, Transport};
pub use zkc3_types::{
    AlarmStatus, C3DateTime, DeviceInfo, DoorSettings, EventType, InOutDirection, InOutStatus,
    SensorType, VerificationMode,
};
