//! Scripted panel for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use zkc3::{Panel, PanelConfig};
use zkc3_core::Frame;
use zkc3_transport::{Error, Result, Transport};

/// Replies of a panel negotiating session 0x66EB
pub const CONNECT_66EB: &str = "aa01c80400eb6600005c7f55";
pub const GETPARAM_66EB: &str = "aa01c84600eb6601007e53657269616c4e756d6265723d363430343136323130313638392c4c6f636b436f756e743d322c417578496e436f756e743d322c4175784f7574436f756e743d326a2255";
pub const RTLOG_66EB: &str = "aa01c81400eb66030003000000110000000001ff00f5c1ca2caa1f55";

/// Replies of a panel negotiating session 0x8AD1
pub const CONNECT_8AD1: &str = "aa01c80400d18a0000915255";
pub const GETPARAM_8AD1: &str = "aa01c84800d18a02007e5a4b465056657273696f6e3d31302c4c6f636b436f756e743d322c526561646572436f756e743d342c417578496e436f756e743d322c4175784f7574436f756e743d32783f55";

pub const SESSION_66EB: u16 = 0x66EB;

#[derive(Default)]
struct Script {
    incoming: VecDeque<u8>,
    sent: Vec<Vec<u8>>,
    connected: bool,
    connects: usize,
    hang_up: bool,
}

/// Test side of a [`ScriptedTransport`]
#[derive(Clone, Default)]
pub struct ScriptHandle(Arc<Mutex<Script>>);

impl ScriptHandle {
    /// Queue bytes the panel will "send"
    pub fn push(&self, data: impl AsRef<[u8]>) {
        self.0.lock().incoming.extend(data.as_ref());
    }

    pub fn push_hex(&self, data: &str) {
        self.push(hex::decode(data).unwrap());
    }

    /// Frames written by the client so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0.lock().sent.clone()
    }

    pub fn connects(&self) -> usize {
        self.0.lock().connects
    }

    /// Drop the connection on the next read
    pub fn hang_up(&self) {
        self.0.lock().hang_up = true;
    }
}

/// In-memory transport replaying queued replies
///
/// A read of more bytes than queued times out, like a silent panel.
pub struct ScriptedTransport {
    script: ScriptHandle,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self, _host: &str, _port: u16) -> Result<()> {
        let mut script = self.script.0.lock();
        if script.connected {
            return Err(Error::AlreadyConnected);
        }
        script.connected = true;
        script.connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.script.0.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.script.0.lock().connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize> {
        let mut script = self.script.0.lock();
        if !script.connected {
            return Err(Error::NotConnected);
        }
        script.sent.push(data.to_vec());
        Ok(data.len())
    }

    async fn receive(&mut self, len: usize, _timeout: Duration) -> Result<BytesMut> {
        let mut script = self.script.0.lock();
        if script.hang_up {
            script.connected = false;
            return Err(Error::ConnectionClosed);
        }
        if script.incoming.len() < len {
            return Err(Error::ReadTimeout);
        }
        Ok(script.incoming.drain(..len).collect::<Vec<u8>>().as_slice().into())
    }

    fn remote_addr(&self) -> String {
        "scripted".to_string()
    }
}

/// Panel client wired to a scripted transport
pub fn scripted_panel() -> (Panel, ScriptHandle) {
    scripted_panel_with(PanelConfig::new("192.168.1.201"))
}

pub fn scripted_panel_with(config: PanelConfig) -> (Panel, ScriptHandle) {
    let script = ScriptHandle::default();
    let transport = ScriptedTransport {
        script: script.clone(),
    };
    (Panel::with_transport(config, Box::new(transport)), script)
}

/// Encode an OK (0xC8) or error (0xC9) reply
pub fn reply(session: Option<u16>, code: u8, payload: &[u8]) -> Vec<u8> {
    reply_with_version(0x01, session, code, payload)
}

pub fn reply_with_version(version: u8, session: Option<u16>, code: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Frame {
        version,
        command: code,
        session_id: None,
        sequence: None,
        payload: Bytes::copy_from_slice(payload),
    };
    if let Some(session_id) = session {
        frame = frame.with_session(session_id, 0);
    }
    frame.encode().unwrap().to_vec()
}

/// Binary RTLog event record
pub fn event_record(door: u8, event_type: u8) -> [u8; 16] {
    let mut record = [0u8; 16];
    record[8] = 200;
    record[9] = door;
    record[10] = event_type;
    record[11] = 2;
    record[12..16].copy_from_slice(&0x21ae8f32u32.to_le_bytes());
    record
}

/// Connect a scripted panel through session 0x66EB
pub async fn connected_panel() -> (Panel, ScriptHandle) {
    let (mut panel, script) = scripted_panel();
    script.push_hex(CONNECT_66EB);
    script.push_hex(GETPARAM_66EB);
    assert!(panel.connect().await);
    (panel, script)
}
