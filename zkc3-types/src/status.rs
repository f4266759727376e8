//! Door, lock and auxiliary I/O status types

use std::fmt;

use bitflags::bitflags;

/// Open/closed state of a lock, auxiliary input or auxiliary output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum InOutStatus {
    #[default]
    Unknown = 0,
    Closed = 1,
    Open = 2,
}

impl InOutStatus {
    /// Decode a door sensor status nibble
    ///
    /// Only the low nibble carries the sensor state; anything other than
    /// closed or open means the door has no (working) sensor.
    pub fn from_dss(value: u8) -> Self {
        match value & 0x0F {
            1 => Self::Closed,
            2 => Self::Open,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Closed => "Closed",
            Self::Open => "Open",
        }
    }
}

impl fmt::Display for InOutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

bitflags! {
    /// Per-door alarm flags of a door/alarm status record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AlarmStatus: u8 {
        const ALARM = 1;
        const DOOR_OPEN_TIMEOUT = 1 << 1;
    }
}

impl AlarmStatus {
    pub fn description(self) -> &'static str {
        if self.contains(Self::ALARM) {
            "Alarm"
        } else if self.contains(Self::DOOR_OPEN_TIMEOUT) {
            "Door opening timeout"
        } else {
            "None"
        }
    }
}

/// Door sensor wiring, from the `Door{n}SensorType` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SensorType {
    /// No door sensor installed
    #[default]
    None = 0,
    NormalOpen = 1,
    NormalClose = 2,
}

impl SensorType {
    pub fn has_sensor(self) -> bool {
        self != Self::None
    }
}

impl From<u8> for SensorType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::NormalOpen,
            2 => Self::NormalClose,
            _ => Self::None,
        }
    }
}

/// Per-door configuration relevant to status tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoorSettings {
    pub sensor_type: SensorType,

    /// Seconds the lock stays released after an open event
    pub lock_drive_time: u8,

    /// Seconds before an open door raises an alarm
    pub door_alarm_timeout: u8,
}

impl DoorSettings {
    pub fn new(sensor_type: SensorType, lock_drive_time: u8, door_alarm_timeout: u8) -> Self {
        Self {
            sensor_type,
            lock_drive_time,
            door_alarm_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inout_status_from_dss() {
        assert_eq!(InOutStatus::from_dss(0x11), InOutStatus::Closed);
        assert_eq!(InOutStatus::from_dss(0x02), InOutStatus::Open);
        assert_eq!(InOutStatus::from_dss(0x00), InOutStatus::Unknown);
        assert_eq!(InOutStatus::from_dss(0x03), InOutStatus::Unknown);
    }

    #[test]
    fn test_alarm_status_flags() {
        let status = AlarmStatus::from_bits_truncate(0x03);
        assert!(status.contains(AlarmStatus::ALARM));
        assert!(status.contains(AlarmStatus::DOOR_OPEN_TIMEOUT));
        assert_eq!(AlarmStatus::DOOR_OPEN_TIMEOUT.description(), "Door opening timeout");
    }

    #[test]
    fn test_sensor_type() {
        assert_eq!(SensorType::from(2), SensorType::NormalClose);
        assert_eq!(SensorType::from(9), SensorType::None);
        assert!(!DoorSettings::default().sensor_type.has_sensor());
    }
}
