//! Real-time log enumerations
//!
//! Values and descriptions follow the event tables of the ZKAccess C3
//! communication protocol.

wire_enum! {
    /// Event type carried in byte 10 of a binary RTLog record
    pub enum EventType {
        NormalPunchOpen = 0 => "Normal Punch Open",
        PunchNormalOpenTimeZone = 1 => "Punch during Normal Open Time Zone",
        FirstCardNormalOpen = 2 => "First Card Normal Open (Punch Card)",
        MultiCardOpen = 3 => "Multi-Card Open (Punching Card)",
        EmergencyPasswordOpen = 4 => "Emergency Password Open",
        OpenNormalOpenTimeZone = 5 => "Open during Normal Open Time Zone",
        LinkageEventTriggered = 6 => "Linkage Event Triggered",
        CancelAlarm = 7 => "Cancel Alarm",
        RemoteOpening = 8 => "Remote Opening",
        RemoteClosing = 9 => "Remote Closing",
        DisableIntradayNormalOpenTimeZone = 10 => "Disable Intraday Normal Open Time Zone",
        EnableIntradayNormalOpenTimeZone = 11 => "Enable Intraday Normal Open Time Zone",
        OpenAuxOutput = 12 => "Open Auxiliary Output",
        CloseAuxOutput = 13 => "Close Auxiliary Output",
        PressFingerprintOpen = 14 => "Press Fingerprint Open",
        MultiCardOpenFingerprint = 15 => "Multi-Card Open (Press Fingerprint)",
        FingerprintNormalOpenTimeZone = 16 => "Press Fingerprint during Normal Open Time Zone",
        CardFingerprintOpen = 17 => "Card plus Fingerprint Open",
        FirstCardNormalOpenFingerprint = 18 => "First Card Normal Open (Press Fingerprint)",
        FirstCardNormalOpenCardFingerprint = 19 => "First Card Normal Open (Card plus Fingerprint)",
        TooShortPunchInterval = 20 => "Too Short Punch Interval",
        DoorInactiveTimeZone = 21 => "Door Inactive Time Zone (Punch Card)",
        IllegalTimeZone = 22 => "Illegal Time Zone",
        AccessDenied = 23 => "Access Denied",
        AntiPassback = 24 => "Anti-Passback",
        Interlock = 25 => "Interlock",
        MultiCardAuthentication = 26 => "Multi-Card Authentication (Punching Card)",
        UnregisteredCard = 27 => "Unregistered Card",
        OpeningTimeout = 28 => "Opening Timeout",
        CardExpired = 29 => "Card Expired",
        PasswordError = 30 => "Password Error",
        TooShortFingerprintInterval = 31 => "Too Short Fingerprint Pressing Interval",
        MultiCardAuthenticationFingerprint = 32 => "Multi-Card Authentication (Press Fingerprint)",
        FingerprintExpired = 33 => "Fingerprint Expired",
        UnregisteredFingerprint = 34 => "Unregistered Fingerprint",
        DoorInactiveTimeZoneFingerprint = 35 => "Door Inactive Time Zone (Press Fingerprint)",
        DoorInactiveTimeZoneExitButton = 36 => "Door Inactive Time Zone (Exit Button)",
        FailedToCloseNormalOpenTimeZone = 37 => "Failed to Close during Normal Open Time Zone",
        DuressPasswordOpen = 101 => "Duress Password Open",
        OpenedAccidentally = 102 => "Opened Accidentally",
        DuressFingerprintOpen = 103 => "Duress Fingerprint Open",
        DoorOpenedCorrectly = 200 => "Door Opened Correctly",
        DoorClosedCorrectly = 201 => "Door Closed Correctly",
        ExitButtonOpen = 202 => "Exit button Open",
        MultiCardOpenCardFingerprint = 203 => "Multi-Card Open (Card plus Fingerprint)",
        NormalOpenTimeZoneOver = 204 => "Normal Open Time Zone Over",
        RemoteNormalOpening = 205 => "Remote Normal Opening",
        DeviceStart = 206 => "Device Start",
        AuxInputDisconnect = 220 => "Auxiliary Input Disconnected",
        AuxInputShort = 221 => "Auxiliary Input Shorted",
        /// Marks a binary record as a door/alarm status snapshot
        DoorAlarmStatus = 255 => "Current door and alarm status",
    }
}

impl EventType {
    /// Events after which a door without a sensor is considered unlocked
    pub fn is_door_open_event(self) -> bool {
        matches!(
            self,
            Self::NormalPunchOpen
                | Self::PunchNormalOpenTimeZone
                | Self::FirstCardNormalOpen
                | Self::MultiCardOpen
                | Self::EmergencyPasswordOpen
                | Self::OpenNormalOpenTimeZone
                | Self::RemoteOpening
                | Self::EnableIntradayNormalOpenTimeZone
                | Self::PressFingerprintOpen
                | Self::MultiCardOpenFingerprint
                | Self::FingerprintNormalOpenTimeZone
                | Self::CardFingerprintOpen
                | Self::FirstCardNormalOpenFingerprint
                | Self::FirstCardNormalOpenCardFingerprint
                | Self::DuressPasswordOpen
                | Self::DuressFingerprintOpen
                | Self::ExitButtonOpen
                | Self::MultiCardOpenCardFingerprint
                | Self::RemoteNormalOpening
        )
    }

    /// Open events that leave the door open without a known duration
    ///
    /// Entering a normal open time zone keeps the lock released until the
    /// zone ends, and a remote open is timed by the control command itself.
    pub fn is_indefinite_open_event(self) -> bool {
        matches!(
            self,
            Self::FirstCardNormalOpen
                | Self::OpenNormalOpenTimeZone
                | Self::RemoteOpening
                | Self::EnableIntradayNormalOpenTimeZone
                | Self::FingerprintNormalOpenTimeZone
                | Self::FirstCardNormalOpenFingerprint
                | Self::FirstCardNormalOpenCardFingerprint
                | Self::RemoteNormalOpening
        )
    }

    /// Events after which a door without a sensor is considered locked
    pub fn is_door_close_event(self) -> bool {
        matches!(self, Self::RemoteClosing | Self::NormalOpenTimeZoneOver)
    }
}

wire_enum! {
    /// How a user identified at the reader
    pub enum VerificationMode {
        None = 0 => "None",
        Finger = 1 => "Only finger",
        Password = 3 => "Only password",
        Card = 4 => "Only card",
        CardOrFinger = 6 => "Card or finger",
        CardWithFinger = 10 => "Card and finger",
        CardWithPassword = 11 => "Card and password",
        Other = 200 => "Others",
    }
}

wire_enum! {
    /// Passage direction reported with an event
    pub enum InOutDirection {
        Entry = 0 => "Entry",
        None = 2 => "None",
        Exit = 3 => "Exit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_type_conversion() {
        assert_eq!(EventType::from(12), EventType::OpenAuxOutput);
        assert_eq!(u8::from(EventType::AuxInputShort), 221);
        assert_eq!(EventType::from(255), EventType::DoorAlarmStatus);
    }

    #[test]
    fn test_unknown_values_are_preserved() {
        let event = EventType::from(150);
        assert_eq!(event, EventType::Unknown(150));
        assert_eq!(event.value(), 150);
        assert!(!event.is_known());
        assert_eq!(event.description(), "Unknown/unsupported");

        assert_eq!(VerificationMode::from(99), VerificationMode::Unknown(99));
        assert_eq!(InOutDirection::from(7), InOutDirection::Unknown(7));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(EventType::CancelAlarm.description(), "Cancel Alarm");
        assert_eq!(VerificationMode::CardWithPassword.description(), "Card and password");
        assert_eq!(InOutDirection::Exit.to_string(), "Exit (3)");
    }

    #[test]
    fn test_indefinite_open_events_are_open_events() {
        for value in 0..=255u8 {
            let event = EventType::from(value);
            if event.is_indefinite_open_event() {
                assert!(event.is_door_open_event(), "{event}");
            }
            assert!(!(event.is_door_open_event() && event.is_door_close_event()));
        }
    }
}
