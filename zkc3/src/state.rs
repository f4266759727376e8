//! Lock and auxiliary I/O status tracking
//!
//! The panel only reports what its sensors see. Doors without a door sensor
//! and auxiliary outputs never report closing, so their status is derived
//! from events and control commands, and closed again by auto-close timers.
//!
//! Timers are keyed by `(kind, id)`. Scheduling a close for a key replaces
//! the pending one, and an explicit close cancels it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use zkc3_core::{ControlDevice, DoorAlarmStatusRecord, EventRecord, OutputAddress, RtLogRecord};
use zkc3_types::{DoorSettings, EventType, InOutStatus};

/// Kind of tracked input or output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Lock,
    AuxIn,
    AuxOut,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lock => "lock",
            Self::AuxIn => "aux in",
            Self::AuxOut => "aux out",
        })
    }
}

/// Snapshot of the panel's peripheral status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelStatus {
    pub lock_count: u8,
    pub aux_in_count: u8,
    pub aux_out_count: u8,
    pub lock_status: HashMap<u8, InOutStatus>,
    pub aux_in_status: HashMap<u8, InOutStatus>,
    pub aux_out_status: HashMap<u8, InOutStatus>,
    pub door_settings: HashMap<u8, DoorSettings>,
}

impl PanelStatus {
    fn statuses(&self, kind: StatusKind) -> &HashMap<u8, InOutStatus> {
        match kind {
            StatusKind::Lock => &self.lock_status,
            StatusKind::AuxIn => &self.aux_in_status,
            StatusKind::AuxOut => &self.aux_out_status,
        }
    }

    fn statuses_mut(&mut self, kind: StatusKind) -> &mut HashMap<u8, InOutStatus> {
        match kind {
            StatusKind::Lock => &mut self.lock_status,
            StatusKind::AuxIn => &mut self.aux_in_status,
            StatusKind::AuxOut => &mut self.aux_out_status,
        }
    }

    /// Recorded status, `Unknown` if never observed
    pub fn status(&self, kind: StatusKind, id: u8) -> InOutStatus {
        self.statuses(kind).get(&id).copied().unwrap_or_default()
    }

    pub fn count(&self, kind: StatusKind) -> u8 {
        match kind {
            StatusKind::Lock => self.lock_count,
            StatusKind::AuxIn => self.aux_in_count,
            StatusKind::AuxOut => self.aux_out_count,
        }
    }

    /// Check if `id` is one of the panel's configured inputs/outputs
    pub fn in_range(&self, kind: StatusKind, id: u8) -> bool {
        (1..=self.count(kind)).contains(&id)
    }

    /// Record a status; `Unknown` never replaces a known status
    ///
    /// Returns `true` if the recorded status changed.
    fn set(&mut self, kind: StatusKind, id: u8, status: InOutStatus) -> bool {
        let statuses = self.statuses_mut(kind);

        if !status.is_known() && statuses.get(&id).is_some_and(|s| s.is_known()) {
            return false;
        }

        statuses.insert(id, status) != Some(status)
    }
}

struct PendingClose {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    status: PanelStatus,
    timers: HashMap<(StatusKind, u8), PendingClose>,
    generation: u64,
}

impl Inner {
    fn write(&mut self, kind: StatusKind, id: u8, status: InOutStatus) {
        if status == InOutStatus::Closed {
            self.cancel(kind, id);
        }

        if self.status.set(kind, id, status) {
            debug!("{} {} is now {}", kind, id, status);
        }
    }

    fn cancel(&mut self, kind: StatusKind, id: u8) {
        if let Some(pending) = self.timers.remove(&(kind, id)) {
            pending.handle.abort();
            trace!("Cancelled auto-close of {} {}", kind, id);
        }
    }

    fn open_indefinitely(&mut self, kind: StatusKind, id: u8) {
        self.cancel(kind, id);
        self.write(kind, id, InOutStatus::Open);
    }
}

/// Shared, thread-safe panel status with auto-close timers
///
/// Cloning yields another handle to the same state. Scheduling a close
/// spawns a task, so it must happen inside a tokio runtime.
#[derive(Clone, Default)]
pub struct PanelState {
    inner: Arc<Mutex<Inner>>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current status
    pub fn snapshot(&self) -> PanelStatus {
        self.inner.lock().status.clone()
    }

    pub fn set_counts(&self, lock_count: u8, aux_in_count: u8, aux_out_count: u8) {
        let mut inner = self.inner.lock();
        inner.status.lock_count = lock_count;
        inner.status.aux_in_count = aux_in_count;
        inner.status.aux_out_count = aux_out_count;
    }

    pub fn count(&self, kind: StatusKind) -> u8 {
        self.inner.lock().status.count(kind)
    }

    pub fn status(&self, kind: StatusKind, id: u8) -> InOutStatus {
        self.inner.lock().status.status(kind, id)
    }

    pub fn lock_status(&self, door: u8) -> InOutStatus {
        self.status(StatusKind::Lock, door)
    }

    pub fn aux_in_status(&self, aux: u8) -> InOutStatus {
        self.status(StatusKind::AuxIn, aux)
    }

    pub fn aux_out_status(&self, aux: u8) -> InOutStatus {
        self.status(StatusKind::AuxOut, aux)
    }

    pub fn door_settings(&self, door: u8) -> Option<DoorSettings> {
        self.inner.lock().status.door_settings.get(&door).copied()
    }

    pub fn set_door_settings(&self, door: u8, settings: DoorSettings) {
        self.inner.lock().status.door_settings.insert(door, settings);
    }

    /// Forget cached door settings; they are refetched on the next connection
    pub fn clear_door_settings(&self) {
        self.inner.lock().status.door_settings.clear();
    }

    /// Record a status
    ///
    /// Writing `Closed` cancels a pending auto-close; writing `Unknown`
    /// never replaces a known status.
    pub fn set_status(&self, kind: StatusKind, id: u8, status: InOutStatus) {
        self.inner.lock().write(kind, id, status);
    }

    /// Check if an auto-close is pending
    pub fn has_pending_close(&self, kind: StatusKind, id: u8) -> bool {
        self.inner.lock().timers.contains_key(&(kind, id))
    }

    /// Set `Closed` after `after` has elapsed, replacing a pending close
    pub fn schedule_close(&self, kind: StatusKind, id: u8, after: Duration) {
        let mut inner = self.inner.lock();
        Self::schedule(Arc::downgrade(&self.inner), &mut inner, kind, id, after);
    }

    fn schedule(
        shared: Weak<Mutex<Inner>>,
        inner: &mut Inner,
        kind: StatusKind,
        id: u8,
        after: Duration,
    ) {
        inner.cancel(kind, id);
        inner.generation = inner.generation.wrapping_add(1);
        let generation = inner.generation;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(shared) = shared.upgrade() {
                Self::fire(&shared, kind, id, generation);
            }
        });

        debug!("Auto-close of {} {} in {:?}", kind, id, after);
        inner.timers.insert((kind, id), PendingClose { generation, handle });
    }

    fn fire(shared: &Mutex<Inner>, kind: StatusKind, id: u8, generation: u64) {
        let mut inner = shared.lock();

        // A replaced timer may still fire if it was already running
        if !inner
            .timers
            .get(&(kind, id))
            .is_some_and(|pending| pending.generation == generation)
        {
            trace!("Ignoring superseded auto-close of {} {}", kind, id);
            return;
        }

        inner.timers.remove(&(kind, id));
        if inner.status.set(kind, id, InOutStatus::Closed) {
            debug!("{} {} auto-closed", kind, id);
        }
    }

    /// Update the status from real-time log records
    pub fn apply_records(&self, records: &[RtLogRecord]) {
        let mut inner = self.inner.lock();

        for record in records {
            match record {
                RtLogRecord::DoorAlarmStatus(status) => Self::apply_door_alarm(&mut inner, status),
                RtLogRecord::Event(event) => {
                    Self::apply_event(Arc::downgrade(&self.inner), &mut inner, event)
                }
            }
        }
    }

    fn apply_door_alarm(inner: &mut Inner, record: &DoorAlarmStatusRecord) {
        // Sensor status is authoritative, so no auto-close
        for door in 1..=inner.status.lock_count {
            inner.write(StatusKind::Lock, door, record.door_sensor_status(door));
        }
    }

    fn apply_event(shared: Weak<Mutex<Inner>>, inner: &mut Inner, event: &EventRecord) {
        let port = event.port_nr;

        let (kind, status) = match event.event_type {
            EventType::OpenAuxOutput => (StatusKind::AuxOut, InOutStatus::Open),
            EventType::CloseAuxOutput => (StatusKind::AuxOut, InOutStatus::Closed),
            EventType::AuxInputDisconnect => (StatusKind::AuxIn, InOutStatus::Open),
            EventType::AuxInputShort => (StatusKind::AuxIn, InOutStatus::Closed),
            EventType::OpenedAccidentally | EventType::DoorOpenedCorrectly => {
                (StatusKind::Lock, InOutStatus::Open)
            }
            EventType::DoorClosedCorrectly => (StatusKind::Lock, InOutStatus::Closed),
            event_type => {
                Self::apply_sensorless_door_event(shared, inner, port, event_type);
                return;
            }
        };

        if inner.status.in_range(kind, port) {
            inner.write(kind, port, status);
        } else {
            trace!("Ignoring {} for {} {} out of range", event.event_type, kind, port);
        }
    }

    fn apply_sensorless_door_event(
        shared: Weak<Mutex<Inner>>,
        inner: &mut Inner,
        door: u8,
        event_type: EventType,
    ) {
        if !inner.status.in_range(StatusKind::Lock, door) {
            return;
        }

        let Some(settings) = inner.status.door_settings.get(&door).copied() else {
            trace!("No settings known for door {}, ignoring {}", door, event_type);
            return;
        };
        if settings.sensor_type.has_sensor() {
            return;
        }

        if event_type.is_door_open_event() {
            if event_type.is_indefinite_open_event() {
                inner.open_indefinitely(StatusKind::Lock, door);
            } else {
                inner.write(StatusKind::Lock, door, InOutStatus::Open);
                let after = Duration::from_secs(settings.lock_drive_time.into());
                Self::schedule(shared, inner, StatusKind::Lock, door, after);
            }
        } else if event_type.is_door_close_event() {
            inner.write(StatusKind::Lock, door, InOutStatus::Closed);
        }
    }

    /// Update the status after the panel accepted a control command
    pub fn apply_control(&self, control: &ControlDevice) {
        let ControlDevice::Output {
            number,
            address,
            duration,
        } = *control
        else {
            return;
        };

        let mut inner = self.inner.lock();

        let kind = match address {
            OutputAddress::Aux => StatusKind::AuxOut,
            OutputAddress::Door => {
                match inner.status.door_settings.get(&number) {
                    Some(settings) if !settings.sensor_type.has_sensor() => {}
                    // Doors with a sensor report their status themselves
                    _ => return,
                }
                StatusKind::Lock
            }
        };

        match duration {
            ControlDevice::CLOSE => inner.write(kind, number, InOutStatus::Closed),
            ControlDevice::NORMAL_OPEN => inner.open_indefinitely(kind, number),
            seconds => {
                // Aux outputs report opening through an event
                if kind == StatusKind::Lock {
                    inner.write(kind, number, InOutStatus::Open);
                }
                let after = Duration::from_secs(seconds.into());
                Self::schedule(Arc::downgrade(&self.inner), &mut inner, kind, number, after);
            }
        }
    }
}

impl fmt::Debug for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PanelState")
            .field("status", &inner.status)
            .field("pending_closes", &inner.timers.keys().collect::<Vec<_>>())
            .finish()
    }
}
