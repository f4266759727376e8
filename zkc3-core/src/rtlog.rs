//! Real-time log records
//!
//! The panel reports events and door/alarm status snapshots either as
//! 16-byte binary records or, on firmware without binary support, as
//! key/value text records.
//!
//! # Binary record layout
//!
//! All multi-byte values are little-endian. Byte 10 tells the two kinds
//! apart: `255` marks a door/alarm status record, anything else an event.
//!
//! ```text
//! Byte:          0  1  2  3 | 4  5  6  7 | 8        | 9        | 10         | 11        | 12 - 15
//! Event:         card no    | pin        | verified | door id  | event type | direction | time
//! Door/alarm:    alarm      | dss        | -        | verified | 255        | -         | time
//! ```

use std::collections::HashMap;
use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use zkc3_types::{
    AlarmStatus, C3DateTime, EventType, InOutDirection, InOutStatus, VerificationMode,
};

use crate::constants::{RTLOG_RECORD_SIZE, STATUS_DOOR_COUNT};
use crate::error::{Error, Result};

/// Door/alarm status snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorAlarmStatusRecord {
    /// Alarm flags per door
    pub alarm_status: [u8; STATUS_DOOR_COUNT],

    /// Door sensor status per door
    pub dss_status: [u8; STATUS_DOOR_COUNT],

    pub verified: VerificationMode,
    pub event_type: EventType,
    pub timestamp: C3DateTime,
}

impl DoorAlarmStatusRecord {
    /// Decode from a 16-byte binary record
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_record_size(data)?;

        let mut alarm_status = [0u8; STATUS_DOOR_COUNT];
        alarm_status.copy_from_slice(&data[0..4]);
        let mut dss_status = [0u8; STATUS_DOOR_COUNT];
        dss_status.copy_from_slice(&data[4..8]);

        Ok(Self {
            alarm_status,
            dss_status,
            verified: VerificationMode::from(data[9]),
            event_type: EventType::from(data[10]),
            timestamp: C3DateTime::from_value(LittleEndian::read_u32(&data[12..16])),
        })
    }

    /// Decode from a key/value record
    ///
    /// ```text
    /// time=2023-12-09 15:09:33  sensor=24  relay=04  alarm=00000000
    /// ```
    ///
    /// `sensor` packs two bits per door, door 1 in the lowest bits.
    pub fn from_kv(data: &HashMap<String, String>) -> Result<Self> {
        let alarm = hex::decode(field(data, "alarm")?)
            .map_err(|e| Error::InvalidRecord(format!("alarm: {e}")))?;
        let alarm_status: [u8; STATUS_DOOR_COUNT] = alarm.try_into().map_err(|v: Vec<u8>| {
            Error::InvalidRecord(format!("alarm: expected 4 bytes, got {}", v.len()))
        })?;

        let sensor = u32::from_str_radix(field(data, "sensor")?, 16)
            .map_err(|e| Error::InvalidRecord(format!("sensor: {e}")))?;
        let mut dss_status = [0u8; STATUS_DOOR_COUNT];
        for (i, dss) in dss_status.iter_mut().enumerate() {
            *dss = ((sensor >> (i * 2)) & 0x03) as u8;
        }

        Ok(Self {
            alarm_status,
            dss_status,
            verified: VerificationMode::None,
            event_type: EventType::DoorAlarmStatus,
            timestamp: field(data, "time")?.parse()?,
        })
    }

    fn door_index(door: u8) -> Option<usize> {
        let index = usize::from(door).checked_sub(1)?;
        (index < STATUS_DOOR_COUNT).then_some(index)
    }

    /// Alarm flags of one door
    pub fn alarm_flags(&self, door: u8) -> AlarmStatus {
        Self::door_index(door)
            .map(|i| AlarmStatus::from_bits_truncate(self.alarm_status[i]))
            .unwrap_or(AlarmStatus::empty())
    }

    /// Distinct alarms of one door, or of all doors when `door` is `None`
    pub fn alarms(&self, door: Option<u8>) -> Vec<AlarmStatus> {
        let mut alarms = Vec::new();

        for i in 0..STATUS_DOOR_COUNT {
            let nr = i as u8 + 1;
            if door.is_some_and(|d| d != nr) {
                continue;
            }

            let flags = self.alarm_flags(nr);
            for status in [AlarmStatus::ALARM, AlarmStatus::DOOR_OPEN_TIMEOUT] {
                if flags.contains(status) && !alarms.contains(&status) {
                    alarms.push(status);
                }
            }
        }

        alarms
    }

    /// Check if a door has an alarm
    ///
    /// Without `status` any alarm flag counts; otherwise all flags of
    /// `status` must be raised.
    pub fn has_alarm(&self, door: u8, status: Option<AlarmStatus>) -> bool {
        let flags = self.alarm_flags(door);
        match status {
            Some(status) => flags.contains(status),
            None => Self::door_index(door).is_some_and(|i| self.alarm_status[i] != 0),
        }
    }

    /// Door sensor status of one door
    pub fn door_sensor_status(&self, door: u8) -> InOutStatus {
        Self::door_index(door)
            .map(|i| InOutStatus::from_dss(self.dss_status[i]))
            .unwrap_or_default()
    }

    /// `Some(true)` if the sensor reports open, `Some(false)` if closed,
    /// `None` without sensor information
    pub fn door_is_open(&self, door: u8) -> Option<bool> {
        match self.door_sensor_status(door) {
            InOutStatus::Open => Some(true),
            InOutStatus::Closed => Some(false),
            InOutStatus::Unknown => None,
        }
    }
}

impl fmt::Display for DoorAlarmStatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Door/Alarm Realtime Status:")?;
        writeln!(f, "{:<12} {}", "time", self.timestamp)?;
        writeln!(f, "{:<12} {}", "event_type", self.event_type)?;
        writeln!(f, "{:<12} {}", "verified", self.verified)?;
        writeln!(f, "{:<12} {}", "alarm_status", hex::encode(self.alarm_status))?;
        for nr in 1..=STATUS_DOOR_COUNT as u8 {
            for status in self.alarms(Some(nr)) {
                writeln!(f, "    Door {:<2} {}", nr, status.description())?;
            }
        }
        write!(f, "{:<12} {}", "dss_status", hex::encode(self.dss_status))?;
        for nr in 1..=STATUS_DOOR_COUNT as u8 {
            write!(f, "\n    Door {:<2} {}", nr, self.door_sensor_status(nr))?;
        }
        Ok(())
    }
}

/// Access event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub card_no: u32,
    pub pin: u32,
    pub verified: VerificationMode,

    /// Door or auxiliary I/O number the event relates to
    pub port_nr: u8,

    pub event_type: EventType,
    pub in_out_direction: InOutDirection,
    pub timestamp: C3DateTime,
}

impl EventRecord {
    /// Decode from a 16-byte binary record
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_record_size(data)?;

        Ok(Self {
            card_no: LittleEndian::read_u32(&data[0..4]),
            pin: LittleEndian::read_u32(&data[4..8]),
            verified: VerificationMode::from(data[8]),
            port_nr: data[9],
            event_type: EventType::from(data[10]),
            in_out_direction: InOutDirection::from(data[11]),
            timestamp: C3DateTime::from_value(LittleEndian::read_u32(&data[12..16])),
        })
    }

    /// Decode from a key/value record
    ///
    /// ```text
    /// time=2023-12-06 22:33:15  pin=0  cardno=0  eventaddr=1  event=8
    /// inoutstatus=2  verifytype=200  index=9
    /// ```
    pub fn from_kv(data: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            card_no: number(data, "cardno")?,
            pin: number(data, "pin")?,
            verified: VerificationMode::from(number::<u8>(data, "verifytype")?),
            port_nr: number(data, "eventaddr")?,
            event_type: EventType::from(number::<u8>(data, "event")?),
            in_out_direction: InOutDirection::from(number::<u8>(data, "inoutstatus")?),
            timestamp: field(data, "time")?.parse()?,
        })
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Realtime Event:")?;
        writeln!(f, "{:<12} {}", "time", self.timestamp)?;
        writeln!(f, "{:<12} {}", "event_type", self.event_type)?;
        writeln!(f, "{:<12} {}", "direction", self.in_out_direction)?;
        writeln!(f, "{:<12} {}", "verified", self.verified)?;
        writeln!(f, "{:<12} {}", "card_no", self.card_no)?;
        write!(f, "{:<12} {}", "port_nr", self.port_nr)
    }
}

/// Real-time log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtLogRecord {
    Event(EventRecord),
    DoorAlarmStatus(DoorAlarmStatusRecord),
}

impl RtLogRecord {
    /// Decode a 16-byte binary record
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_record_size(data)?;

        if EventType::from(data[10]) == EventType::DoorAlarmStatus {
            DoorAlarmStatusRecord::from_bytes(data).map(Self::DoorAlarmStatus)
        } else {
            EventRecord::from_bytes(data).map(Self::Event)
        }
    }

    /// Decode a key/value record; only events carry an `event` key
    pub fn from_kv(data: &HashMap<String, String>) -> Result<Self> {
        if data.contains_key("event") {
            EventRecord::from_kv(data).map(Self::Event)
        } else {
            DoorAlarmStatusRecord::from_kv(data).map(Self::DoorAlarmStatus)
        }
    }

    /// Decode a binary multi-record reply
    ///
    /// # Errors
    ///
    /// Fails if the length is not a multiple of the record size.
    pub fn parse_binary(data: &[u8]) -> Result<Vec<Self>> {
        if data.len() % RTLOG_RECORD_SIZE != 0 {
            return Err(Error::LengthMismatch {
                expected: data.len() / RTLOG_RECORD_SIZE * RTLOG_RECORD_SIZE,
                actual: data.len(),
            });
        }

        data.chunks_exact(RTLOG_RECORD_SIZE)
            .map(Self::from_bytes)
            .collect()
    }

    /// Decode a key/value multi-record reply
    pub fn parse_key_value(data: &[u8]) -> Result<Vec<Self>> {
        crate::kv::records(data).iter().map(Self::from_kv).collect()
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    pub fn is_door_alarm(&self) -> bool {
        matches!(self, Self::DoorAlarmStatus(_))
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::Event(record) => record.event_type,
            Self::DoorAlarmStatus(record) => record.event_type,
        }
    }

    pub fn timestamp(&self) -> C3DateTime {
        match self {
            Self::Event(record) => record.timestamp,
            Self::DoorAlarmStatus(record) => record.timestamp,
        }
    }
}

impl fmt::Display for RtLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(record) => fmt::Display::fmt(record, f),
            Self::DoorAlarmStatus(record) => fmt::Display::fmt(record, f),
        }
    }
}

fn check_record_size(data: &[u8]) -> Result<()> {
    if data.len() < RTLOG_RECORD_SIZE {
        return Err(Error::PacketTooShort {
            expected: RTLOG_RECORD_SIZE,
            actual: data.len(),
        });
    }
    Ok(())
}

fn field<'a>(data: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    data.get(key)
        .map(|value| value.trim())
        .ok_or_else(|| Error::InvalidRecord(format!("missing field '{key}'")))
}

fn number<T: std::str::FromStr>(data: &HashMap<String, String>, key: &str) -> Result<T> {
    field(data, key)?
        .parse()
        .map_err(|_| Error::InvalidRecord(format!("field '{key}' is not a valid number")))
}
