//! Session bookkeeping for the C3 protocol
//!
//! A session tracks:
//! - Session ID (assigned by the panel on CONNECT_SESSION)
//! - Request number (advanced per request, low 16 bits go on the wire)
//! - Whether the panel accepted a session or fell back to session-less mode

use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::sync::Arc;

use crate::constants::{INITIAL_REQUEST_NR, INITIAL_SESSION_ID};
use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected
    Disconnected,

    /// Connected with a panel-assigned session ID
    SessionActive,

    /// Connected without session (older firmware)
    SessionLess,
}

/// Session manager
///
/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    session_id: parking_lot::RwLock<Option<u16>>,

    request_nr: AtomicI32,

    /// Protocol version reported by the panel reply header
    protocol_version: AtomicU8,

    state: parking_lot::RwLock<SessionState>,
}

impl Session {
    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SessionInner {
                session_id: parking_lot::RwLock::new(None),
                request_nr: AtomicI32::new(INITIAL_REQUEST_NR),
                protocol_version: AtomicU8::new(crate::PROTOCOL_VERSION),
                state: parking_lot::RwLock::new(SessionState::Disconnected),
            }),
        }
    }

    /// Panel-assigned session ID, if a session is active
    pub fn session_id(&self) -> Option<u16> {
        *self.inner.session_id.read()
    }

    /// Session ID to put on the wire while negotiating
    pub fn negotiation_id() -> u16 {
        INITIAL_SESSION_ID
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() != SessionState::Disconnected
    }

    /// Current request number, without advancing it
    pub fn request_nr(&self) -> i32 {
        self.inner.request_nr.load(Ordering::Acquire)
    }

    pub fn protocol_version(&self) -> u8 {
        self.inner.protocol_version.load(Ordering::Acquire)
    }

    pub fn set_protocol_version(&self, version: u8) {
        self.inner.protocol_version.store(version, Ordering::Release);
    }

    /// Activate a session with a panel-assigned session ID
    pub fn establish(&self, session_id: u16) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot establish session from state: {:?}",
                *state
            )));
        }

        *self.inner.session_id.write() = Some(session_id);
        *state = SessionState::SessionActive;

        Ok(())
    }

    /// Mark the connection as session-less
    pub fn establish_session_less(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Disconnected {
            return Err(Error::InvalidSessionState(format!(
                "Cannot fall back to session-less from state: {:?}",
                *state
            )));
        }

        *self.inner.session_id.write() = None;
        *state = SessionState::SessionLess;

        Ok(())
    }

    /// Reset to a fresh disconnected session
    pub fn close(&self) {
        *self.inner.session_id.write() = None;
        self.inner.request_nr.store(INITIAL_REQUEST_NR, Ordering::Release);
        *self.inner.state.write() = SessionState::Disconnected;
        self.inner
            .protocol_version
            .store(crate::PROTOCOL_VERSION, Ordering::Release);
    }

    /// Take the request number for the next request and advance the counter
    ///
    /// The counter wraps on overflow; only its low 16 bits are sent.
    pub fn next_request_nr(&self) -> i32 {
        self.inner.request_nr.fetch_add(1, Ordering::AcqRel)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert_eq!(session.session_id(), None);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.request_nr(), -258);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_establish() {
        let session = Session::new();
        session.establish(0x66EB).unwrap();

        assert_eq!(session.session_id(), Some(0x66EB));
        assert_eq!(session.state(), SessionState::SessionActive);
        assert!(session.is_connected());
    }

    #[test]
    fn test_session_less() {
        let session = Session::new();
        session.establish_session_less().unwrap();

        assert_eq!(session.session_id(), None);
        assert_eq!(session.state(), SessionState::SessionLess);
        assert!(session.is_connected());
    }

    #[test]
    fn test_close() {
        let session = Session::new();
        session.establish(1234).unwrap();
        session.next_request_nr();
        session.set_protocol_version(2);

        session.close();

        assert_eq!(session.session_id(), None);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.request_nr(), INITIAL_REQUEST_NR);
        assert_eq!(session.protocol_version(), crate::PROTOCOL_VERSION);
    }

    #[test]
    fn test_request_nr_sequence() {
        let session = Session::new();
        assert_eq!(session.next_request_nr(), -258);
        assert_eq!(session.next_request_nr() as u16, 0xFEFF);
        assert_eq!(session.request_nr(), -256);
    }

    #[test]
    fn test_request_nr_wraps() {
        let session = Session::new();
        session.inner.request_nr.store(i32::MAX, Ordering::Release);
        assert_eq!(session.next_request_nr(), i32::MAX);
        assert_eq!(session.next_request_nr(), i32::MIN);
    }

    #[test]
    fn test_invalid_state_transitions() {
        let session = Session::new();
        session.establish(100).unwrap();

        assert!(session.establish(200).is_err());
        assert!(session.establish_session_less().is_err());
    }

    #[test]
    fn test_session_clone() {
        let session1 = Session::new();
        let session2 = session1.clone();

        session1.establish(1234).unwrap();

        assert_eq!(session2.session_id(), Some(1234));
        assert_eq!(session2.state(), SessionState::SessionActive);
    }
}
