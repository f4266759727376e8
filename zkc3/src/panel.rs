//! High-level panel interface

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use byteorder::{ByteOrder, LittleEndian};
use bytes::{Bytes, BytesMut};
use chrono::NaiveDateTime;
use tracing::{debug, error, info, trace, warn};

use zkc3_core::constants::RTLOG_RECORD_SIZE;
use zkc3_core::message::reply_payload;
use zkc3_core::{
    kv, Command, ControlDevice, Frame, OutputAddress, RtLogRecord, Session, SessionState,
    HEADER_SIZE, TRAILER_SIZE,
};
use zkc3_transport::{TcpTransport, Transport};
use zkc3_types::{C3DateTime, DeviceInfo, DoorSettings, InOutStatus, SensorType};

use crate::config::{PanelConfig, RtLogMode};
use crate::error::{Error, Result};
use crate::state::{PanelState, StatusKind};
use crate::table::{self, DataTable};

/// Parameters fetched right after connecting
const INIT_PARAMETERS: [&str; 6] = [
    "~SerialNumber",
    "FirmVer",
    "~DeviceName",
    "LockCount",
    "AuxInCount",
    "AuxOutCount",
];

/// Validated reply, framing removed
struct Reply {
    payload: Bytes,
    version: u8,
}

/// C3 access control panel
///
/// One `Panel` drives one connection. Requests are strictly sequential,
/// which `&mut self` on every exchange enforces.
///
/// # Examples
///
/// ```no_run
/// use zkc3::{Panel, PanelConfig};
///
/// #[tokio::main]
/// async fn main() -> zkc3::Result<()> {
///     let mut panel = Panel::new(PanelConfig::new("192.168.1.201"));
///
///     if panel.connect().await {
///         for record in panel.get_rt_log().await? {
///             println!("{}", record);
///         }
///         println!("Door 1: {}", panel.lock_status(1));
///     }
///
///     panel.disconnect().await;
///     Ok(())
/// }
/// ```
pub struct Panel {
    config: PanelConfig,
    transport: Box<dyn Transport>,
    session: Session,
    device_info: DeviceInfo,
    state: PanelState,
    rtlog_mode: RtLogMode,
}

impl Panel {
    /// Create a panel client using TCP
    pub fn new(config: PanelConfig) -> Self {
        let transport = TcpTransport::new().with_connect_timeout(config.connect_timeout);
        Self::with_transport(config, Box::new(transport))
    }

    /// Create a panel client on a custom transport
    pub fn with_transport(config: PanelConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            device_info: DeviceInfo::new(config.host.clone(), config.port),
            rtlog_mode: config.rtlog_mode,
            config,
            transport,
            session: Session::new(),
            state: PanelState::new(),
        }
    }

    /// Broadcast a discovery request and collect the panels that answer
    pub async fn discover(interface: Option<IpAddr>, timeout: Duration) -> Result<Vec<DeviceInfo>> {
        crate::discovery::discover(interface, timeout).await
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Change the host; only allowed while disconnected
    pub fn set_host(&mut self, host: impl Into<String>) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        self.config.host = host.into();
        self.device_info.host = self.config.host.clone();
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Change the port; only allowed while disconnected
    pub fn set_port(&mut self, port: u16) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        self.config.port = port;
        self.device_info.port = port;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected() && self.transport.is_connected()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session_id(&self) -> Option<u16> {
        self.session.session_id()
    }

    /// Protocol version announced by the panel on connect
    pub fn protocol_version(&self) -> u8 {
        self.session.protocol_version()
    }

    /// Panel information, completed by the parameter fetch after connecting
    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Current real-time log polling mode
    pub fn rtlog_mode(&self) -> RtLogMode {
        self.rtlog_mode
    }

    /// Shared status handle
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn lock_count(&self) -> u8 {
        self.state.count(StatusKind::Lock)
    }

    pub fn aux_in_count(&self) -> u8 {
        self.state.count(StatusKind::AuxIn)
    }

    pub fn aux_out_count(&self) -> u8 {
        self.state.count(StatusKind::AuxOut)
    }

    /// Last known lock status
    ///
    /// Only reflects what has been seen by [`Panel::get_rt_log`] and
    /// [`Panel::control_device`]; `Unknown` until then.
    pub fn lock_status(&self, door: u8) -> InOutStatus {
        self.state.lock_status(door)
    }

    /// Last known auxiliary input status (short: closed, disconnected: open)
    pub fn aux_in_status(&self, aux: u8) -> InOutStatus {
        self.state.aux_in_status(aux)
    }

    /// Last known auxiliary output status
    pub fn aux_out_status(&self, aux: u8) -> InOutStatus {
        self.state.aux_out_status(aux)
    }

    /// Connect to the panel
    ///
    /// Tries a session-based connection first and falls back to a
    /// session-less one. On success, serial number, firmware version,
    /// device name and I/O counts are fetched. An error reply there is
    /// logged and does not fail the connect; a timeout drops the connection.
    ///
    /// Returns whether the panel is connected. Connection failures are
    /// logged, not returned.
    pub async fn connect(&mut self) -> bool {
        if self.is_connected() {
            debug!("Already connected to {}", self.transport.remote_addr());
            return true;
        }

        info!("Connecting to {}:{}...", self.config.host, self.config.port);

        self.reset_connection().await;
        self.rtlog_mode = self.config.rtlog_mode;
        let password = self
            .config
            .password
            .clone()
            .map(Bytes::from)
            .unwrap_or_default();

        if let Err(e) = self.connect_with_session(password.clone()).await {
            self.log_connect_failure("with session", &e);
            self.reset_connection().await;

            if let Err(e) = self.connect_session_less(password).await {
                self.log_connect_failure("without session", &e);
                self.reset_connection().await;
                return false;
            }
        }

        self.state.clear_door_settings();
        if let Err(e) = self.initialize().await {
            warn!(
                "Retrieving configuration parameters from {} failed: {}",
                self.config.host, e
            );
            if !self.is_connected() {
                return false;
            }
        }

        info!(
            "Connected to {} ({:?}, session {:?})",
            self.device_info,
            self.session.state(),
            self.session.session_id()
        );

        self.is_connected()
    }

    async fn connect_with_session(&mut self, password: Bytes) -> Result<()> {
        self.transport
            .connect(&self.config.host, self.config.port)
            .await?;

        let frame = Frame::request(Command::ConnectSession, password)
            .with_session(Session::negotiation_id(), self.session.next_request_nr());
        self.send(&frame).await?;

        let reply = self.receive().await?;
        if reply.payload.len() < 2 {
            return Err(Error::InvalidResponse(format!(
                "connect reply carries no session id ({} bytes)",
                reply.payload.len()
            )));
        }

        let session_id = LittleEndian::read_u16(&reply.payload[..2]);
        self.session.set_protocol_version(reply.version);
        self.session.establish(session_id)?;

        debug!("Connected with session ID 0x{:04X}", session_id);
        Ok(())
    }

    async fn connect_session_less(&mut self, password: Bytes) -> Result<()> {
        self.transport
            .connect(&self.config.host, self.config.port)
            .await?;

        // Consumes a request number like every other request
        self.session.next_request_nr();
        let frame = Frame::request(Command::ConnectSessionLess, password);
        self.send(&frame).await?;

        let reply = self.receive().await?;
        self.session.set_protocol_version(reply.version);
        self.session.establish_session_less()?;

        debug!("Connected without session");
        Ok(())
    }

    fn log_connect_failure(&self, attempt: &str, e: &Error) {
        if e.is_connection_error() || e.is_device_error() {
            warn!(
                "Connection attempt {} to {} failed: {}",
                attempt, self.config.host, e
            );
        } else {
            error!("Reply from {} failed: {}", self.config.host, e);
        }
    }

    async fn reset_connection(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            debug!("Closing transport failed: {}", e);
        }
        self.session.close();
    }

    async fn initialize(&mut self) -> Result<()> {
        let params = self.get_device_param(&INIT_PARAMETERS).await?;

        if let Some(serial_number) = params.get("~SerialNumber") {
            self.device_info.serial_number = Some(serial_number.clone());
        }
        if let Some(firmware_version) = params.get("FirmVer") {
            self.device_info.firmware_version = Some(firmware_version.clone());
        }
        if let Some(device_name) = params.get("~DeviceName") {
            self.device_info.device_name = Some(device_name.clone());
        }

        let count = |name: &str, current: u8| match params.get(name) {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid {} '{}'", name, value);
                current
            }),
            None => current,
        };
        self.state.set_counts(
            count("LockCount", self.lock_count()),
            count("AuxInCount", self.aux_in_count()),
            count("AuxOutCount", self.aux_out_count()),
        );

        Ok(())
    }

    /// Disconnect from the panel and end the session
    ///
    /// The DISCONNECT request is best effort: its failure is logged and the
    /// connection is closed regardless. Pending auto-close timers keep
    /// running.
    pub async fn disconnect(&mut self) {
        if self.is_connected() {
            info!("Disconnecting from {}...", self.transport.remote_addr());

            if let Err(e) = self.send_receive(Command::Disconnect, Bytes::new()).await {
                warn!("Failed to send DISCONNECT: {}", e);
            }
        }

        self.reset_connection().await;
        self.state.clear_door_settings();
    }

    /// Send a request and return the reply payload
    ///
    /// With an active session, the reply must carry the same session id;
    /// session id and sequence number are stripped from the returned
    /// payload.
    pub async fn send_receive(&mut self, command: Command, payload: impl Into<Bytes>) -> Result<Bytes> {
        self.ensure_connected()?;

        let request_nr = self.session.next_request_nr();
        let frame = match self.session.session_id() {
            Some(session_id) => Frame::request(command, payload).with_session(session_id, request_nr),
            None => Frame::request(command, payload),
        };

        self.send(&frame).await?;
        let reply = self.receive().await?;

        self.strip_session(reply.payload)
    }

    fn strip_session(&self, payload: Bytes) -> Result<Bytes> {
        let Some(expected) = self.session.session_id() else {
            return Ok(payload);
        };

        if payload.len() <= 2 {
            return Ok(payload);
        }

        let received = LittleEndian::read_u16(&payload[..2]);
        if received != expected {
            return Err(zkc3_core::Error::SessionMismatch { expected, received }.into());
        }

        Ok(payload.slice(payload.len().min(4)..))
    }

    /// Send one frame; a failed write drops the connection
    async fn send(&mut self, frame: &Frame) -> Result<usize> {
        let data = frame.encode()?;
        debug!("Sending {}", frame);

        match self.transport.send(&data).await {
            Ok(sent) => Ok(sent),
            Err(e) => {
                self.drop_connection(&e).await;
                Err(Error::Transport(e))
            }
        }
    }

    /// Receive and validate one reply
    ///
    /// A header timeout or failed body read leaves the stream position
    /// unknown, so the connection is dropped and a late reply can never be
    /// taken for the answer to a newer request.
    async fn receive(&mut self) -> Result<Reply> {
        let data = match self.read_frame().await {
            Ok(data) => data,
            Err(e) if e.is_connection_error() => {
                self.drop_connection(&e).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        trace!("Received {}", hex::encode(&data));

        let frame = Frame::decode(&data, self.config.checksum_mode)?;
        let version = frame.version;
        let payload = reply_payload(frame.command, frame.payload)?;

        Ok(Reply { payload, version })
    }

    async fn read_frame(&mut self) -> Result<BytesMut> {
        let mut data = self.receive_header().await?;
        let frame_header = Frame::decode_header(&data)?;

        let rest = self
            .transport
            .receive(frame_header.payload_size + TRAILER_SIZE, self.config.read_timeout)
            .await?;
        data.extend_from_slice(&rest);

        Ok(data)
    }

    async fn receive_header(&mut self) -> Result<BytesMut> {
        let attempts = self.config.header_retries.max(1);

        for attempt in 1..=attempts {
            match self.transport.receive(HEADER_SIZE, self.config.read_timeout).await {
                Ok(header) => return Ok(header),
                Err(zkc3_transport::Error::ReadTimeout) => {
                    debug!("No reply header yet (attempt {}/{})", attempt, attempts);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::HeaderTimeout { attempts })
    }

    async fn drop_connection(&mut self, e: &(dyn std::fmt::Display + Sync)) {
        if self.is_connected() {
            warn!("Dropping connection to {}: {}", self.transport.remote_addr(), e);
        }
        self.reset_connection().await;
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    /// Fetch device parameters by name
    ///
    /// Names the panel does not know are missing from the result.
    pub async fn get_device_param<S: AsRef<str>>(&mut self, names: &[S]) -> Result<HashMap<String, String>> {
        let request = kv::join_names(names);
        let reply = self.send_receive(Command::GetParam, request).await?;

        Ok(kv::parse(&reply))
    }

    /// Settings of a door, fetched once per connection
    pub async fn door_settings(&mut self, door: u8) -> Result<DoorSettings> {
        if let Some(settings) = self.state.door_settings(door) {
            return Ok(settings);
        }

        let names = [
            format!("Door{door}SensorType"),
            format!("Door{door}Drivertime"),
            format!("Door{door}Detectortime"),
        ];
        let params = self.get_device_param(&names).await?;

        let value = |name: &String| {
            params
                .get(name)
                .and_then(|value| value.trim().parse::<u8>().ok())
                .unwrap_or(0)
        };
        let settings = DoorSettings::new(
            SensorType::from(value(&names[0])),
            value(&names[1]),
            value(&names[2]),
        );

        debug!("Door {} settings: {:?}", door, settings);
        self.state.set_door_settings(door, settings);
        Ok(settings)
    }

    /// Poll the latest real-time log records and update the status
    ///
    /// Binary polling switches to key/value polling for the rest of the
    /// connection when the panel's reply is not a whole number of records.
    pub async fn get_rt_log(&mut self) -> Result<Vec<RtLogRecord>> {
        self.ensure_connected()?;

        let records = match self.rtlog_mode {
            RtLogMode::Binary => {
                let data = self.send_receive(Command::RtLogBinary, Bytes::new()).await?;

                if data.len() % RTLOG_RECORD_SIZE == 0 {
                    RtLogRecord::parse_binary(&data)?
                } else if self.session.protocol_version() == 2 {
                    // Irregular replies of these panels end with the record of interest
                    debug!("Received {} RTLog bytes, only using tail: {}", data.len(), hex::encode(&data));
                    let tail = data.len().saturating_sub(RTLOG_RECORD_SIZE);
                    vec![RtLogRecord::from_bytes(&data[tail..])?]
                } else {
                    info!(
                        "RTLog reply of {} bytes is not binary, switching to key/value polling",
                        data.len()
                    );
                    self.rtlog_mode = RtLogMode::KeyValue;
                    self.poll_key_value().await?
                }
            }
            RtLogMode::KeyValue => self.poll_key_value().await?,
        };

        for record in &records {
            trace!("Received RTLog: {:?}", record);
        }

        self.fetch_missing_door_settings(&records).await;
        self.state.apply_records(&records);

        Ok(records)
    }

    async fn poll_key_value(&mut self) -> Result<Vec<RtLogRecord>> {
        let data = self.send_receive(Command::RtLogKeyValue, Bytes::new()).await?;
        Ok(RtLogRecord::parse_key_value(&data)?)
    }

    /// Door events are interpreted per door sensor type
    async fn fetch_missing_door_settings(&mut self, records: &[RtLogRecord]) {
        let lock_count = self.lock_count();

        for record in records {
            let RtLogRecord::Event(event) = record else {
                continue;
            };
            let door = event.port_nr;
            if !(1..=lock_count).contains(&door)
                || !(event.event_type.is_door_open_event() || event.event_type.is_door_close_event())
                || self.state.door_settings(door).is_some()
            {
                continue;
            }

            if let Err(e) = self.door_settings(door).await {
                warn!("Retrieving settings of door {} failed: {}", door, e);
            }
        }
    }

    /// Send a control command
    ///
    /// Timed opens schedule an auto-close for auxiliary outputs, and for
    /// doors without a door sensor.
    pub async fn control_device(&mut self, control: ControlDevice) -> Result<()> {
        self.ensure_connected()?;

        info!("{}", control);
        self.send_receive(Command::Control, control.to_bytes()).await?;

        if let ControlDevice::Output {
            number,
            address: OutputAddress::Door,
            ..
        } = control
        {
            if let Err(e) = self.door_settings(number).await {
                warn!("Retrieving settings of door {} failed: {}", number, e);
            }
        }

        self.state.apply_control(&control);
        Ok(())
    }

    /// Set the panel clock
    pub async fn set_device_datetime(&mut self, time: NaiveDateTime) -> Result<()> {
        let value = C3DateTime::try_from(time)?.to_value()?;
        debug!("Setting panel time to {} ({})", time, value);

        self.send_receive(Command::DateTime, format!("DateTime={value}"))
            .await?;
        Ok(())
    }

    /// Fetch the layout of the panel's data tables
    pub async fn get_data_table_config(&mut self) -> Result<Vec<DataTable>> {
        let data = self.send_receive(Command::DataTableCfg, Bytes::new()).await?;
        Ok(table::parse_config(&data))
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("device_info", &self.device_info)
            .field("session", &self.session.state())
            .field("rtlog_mode", &self.rtlog_mode)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_panel_create() {
        let panel = Panel::new(PanelConfig::new("192.168.1.201"));

        assert!(!panel.is_connected());
        assert_eq!(panel.session_state(), SessionState::Disconnected);
        assert_eq!(panel.lock_count(), 0);
        assert_eq!(panel.aux_in_count(), 0);
        assert_eq!(panel.aux_out_count(), 0);
        assert_eq!(panel.lock_status(1), InOutStatus::Unknown);
        assert_eq!(panel.aux_in_status(1), InOutStatus::Unknown);
        assert_eq!(panel.aux_out_status(2), InOutStatus::Unknown);
        assert_eq!(panel.device_info().host, "192.168.1.201");
        assert_eq!(panel.rtlog_mode(), RtLogMode::Binary);
    }

    #[test]
    fn test_set_host_and_port_while_disconnected() {
        let mut panel = Panel::new(PanelConfig::new("192.168.1.201"));

        panel.set_host("10.0.0.2").unwrap();
        panel.set_port(4371).unwrap();

        assert_eq!(panel.host(), "10.0.0.2");
        assert_eq!(panel.port(), 4371);
        assert_eq!(panel.device_info().port, 4371);
    }

    #[tokio::test]
    async fn test_requests_need_connection() {
        let mut panel = Panel::new(PanelConfig::new("192.168.1.201"));

        assert!(matches!(panel.get_rt_log().await, Err(Error::NotConnected)));
        assert!(matches!(
            panel.control_device(ControlDevice::cancel_alarm()).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            panel.get_device_param(&["LockCount"]).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_unreachable_returns_false() {
        let config = PanelConfig::new("127.0.0.1")
            .with_port(1)
            .with_connect_timeout(Duration::from_millis(200));
        let mut panel = Panel::new(config);

        assert!(!panel.connect().await);
        assert!(!panel.is_connected());
        assert_eq!(panel.session_state(), SessionState::Disconnected);
    }
}
