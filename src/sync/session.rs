//! Device sync session: connection lifecycle, login handshake, the single
//! outbound slot and inbound dispatch.
//!
//! ```text
//!                retry tick               transport ready
//!  Disconnected ───────────▶ Connecting ──────────────▶ AwaitingLogin
//!        ▲                     │    ▲                         │
//!        │                     └────┘ not ready yet           │ "/login" ack
//!        │                                                    ▼
//!        └──────────── transport lost (next retry tick) ──── LoggedIn
//! ```
//!
//! The retry timer runs slow while disconnected and fast once a
//! connection exists.  Protocol violations close the transport; the loss
//! is noticed on the next retry tick, which performs the full reset.
//!
//! The outbound slot holds one frame until the transport has taken every
//! byte of it.  A busy or short write leaves the rest for the next pass.

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::app::ports::{MessageHandler, SyncPort};
use crate::config::DeviceConfig;
use crate::error::ProtocolViolation;
use crate::scheduler::TickTimer;

use super::codec::{LineDecoder, encode_frame};
use super::message::{Endpoint, Outbound, validate_inbound};
use super::transport::{Connection, Connector};

/// Receive chunk size.
const RX_CHUNK: usize = 512;
/// Bound on reads per pass so a chatty peer cannot stall the loop.
const MAX_READS_PER_PASS: usize = 8;
/// Bound on write attempts per pass.
const MAX_WRITES_PER_PASS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    AwaitingLogin,
    LoggedIn,
}

/// A serialized frame and how much of it the transport has taken.
#[derive(Debug)]
struct OutboundFrame {
    bytes: Vec<u8>,
    written: usize,
}

impl OutboundFrame {
    fn remaining(&self) -> &[u8] {
        &self.bytes[self.written..]
    }
}

pub struct DeviceSyncSession<C: Connector> {
    connector: C,
    connection: Option<C::Connection>,
    state: SessionState,
    logged_in: bool,
    login_sent: bool,
    /// At most one frame waiting to be written.
    outbound_slot: Option<OutboundFrame>,
    decoder: LineDecoder,
    retry_timer: TickTimer,
    reconnect_interval: Duration,
    connected_interval: Duration,
    /// When the current connection attempt started.
    connect_started_us: u64,
    device_id: String,
}

impl<C: Connector> DeviceSyncSession<C> {
    pub fn new(config: &DeviceConfig, connector: C) -> Self {
        Self {
            connector,
            connection: None,
            state: SessionState::Disconnected,
            logged_in: false,
            login_sent: false,
            outbound_slot: None,
            decoder: LineDecoder::new(),
            retry_timer: TickTimer::new(config.reconnect_interval()),
            reconnect_interval: config.reconnect_interval(),
            connected_interval: config.exchange_mode.interval(),
            connect_started_us: 0,
            device_id: config.device_id.clone(),
        }
    }

    /// One cooperative pass.  Does nothing unless the retry timer opens.
    pub fn poll(&mut self, now_us: u64, handler: &mut impl MessageHandler) {
        if !self.retry_timer.should_tick(now_us) {
            return;
        }

        match self.connection.as_ref().map(Connection::is_connected) {
            None => {
                self.retry_timer.set_interval(self.reconnect_interval);
                self.try_connect(now_us);
            }
            Some(false) => {
                self.retry_timer.set_interval(self.reconnect_interval);
                warn!("Server connection lost, resetting session");
                self.reset(handler);
            }
            Some(true) if self.state == SessionState::Connecting => {
                self.advance_connect(now_us);
            }
            Some(true) => {
                self.retry_timer.set_interval(self.connected_interval);
                self.service(handler);
            }
        }
    }

    fn try_connect(&mut self, now_us: u64) {
        self.state = SessionState::Connecting;
        info!("Connecting to server...");

        match self.connector.connect() {
            Ok(conn) => {
                self.connection = Some(conn);
                self.connect_started_us = now_us;
                self.retry_timer.set_interval(self.connected_interval);
                self.advance_connect(now_us);
            }
            Err(e) => warn!("Failed to connect to server: {e}"),
        }
    }

    /// Drive transport setup.  Gives up once a full reconnect interval
    /// has passed without the transport becoming ready.
    fn advance_connect(&mut self, now_us: u64) {
        let Some(conn) = self.connection.as_mut() else {
            return;
        };
        match conn.poll_ready() {
            Ok(true) => {
                info!("Server connection established");
                self.decoder.reset();
                self.state = SessionState::AwaitingLogin;
                self.queue_login();
                self.flush_slot();
            }
            Ok(false) => {
                let elapsed_us = now_us.saturating_sub(self.connect_started_us);
                if elapsed_us >= self.reconnect_interval.as_micros() as u64 {
                    warn!("Server connection timed out during setup");
                    self.close_transport();
                }
            }
            Err(e) => {
                warn!("Failed to connect to server: {e}");
                self.close_transport();
            }
        }
    }

    /// Drain inbound frames, retry login, then flush the outbound slot.
    fn service(&mut self, handler: &mut impl MessageHandler) {
        let mut chunk = [0u8; RX_CHUNK];
        for _ in 0..MAX_READS_PER_PASS {
            let Some(conn) = self.connection.as_mut() else {
                return;
            };
            match conn.receive(&mut chunk) {
                Ok(0) => break,
                Ok(n) => self.decoder.feed(&chunk[..n]),
                Err(e) => {
                    warn!("Receive failed: {e}");
                    self.close_transport();
                    return;
                }
            }
        }

        while let Some(frame) = self.decoder.next_frame() {
            let outcome = frame.and_then(|f| self.process_frame(&f, handler));
            if let Err(violation) = outcome {
                error!("Protocol violation: {violation}; closing connection");
                self.close_transport();
                return;
            }
        }

        self.queue_login();
        self.flush_slot();
    }

    /// Login and dispatch gates, after the envelope gates in [`validate_inbound`].
    fn process_frame(
        &mut self,
        frame: &[u8],
        handler: &mut impl MessageHandler,
    ) -> Result<(), ProtocolViolation> {
        let message = validate_inbound(frame)?;
        debug!(
            "<- {} (code {}){}",
            message.endpoint.as_str(),
            message.code,
            if message.data.is_none() { ", no data" } else { "" }
        );

        if message.endpoint == Endpoint::Login {
            self.logged_in = true;
            self.state = SessionState::LoggedIn;
            info!("Logged in successfully");
            return Ok(());
        }

        if !self.logged_in {
            return Err(ProtocolViolation::BeforeLogin);
        }

        handler.handle(&message);
        Ok(())
    }

    fn queue_login(&mut self) {
        if self.logged_in || self.login_sent {
            return;
        }
        let login = Outbound::Login {
            device_id: self.device_id.clone(),
        };
        if self.send(&login, true) {
            self.login_sent = true;
        }
    }

    /// Hand the slot to the transport.  The slot frees only once the whole
    /// frame is written; a busy transport keeps it for the next pass.
    fn flush_slot(&mut self) {
        for _ in 0..MAX_WRITES_PER_PASS {
            let (Some(conn), Some(frame)) = (self.connection.as_mut(), self.outbound_slot.as_mut())
            else {
                return;
            };
            match conn.send(frame.remaining()) {
                Ok(0) => {
                    debug!("Transport busy, {} bytes held", frame.remaining().len());
                    return;
                }
                Ok(n) => {
                    frame.written += n;
                    if frame.remaining().is_empty() {
                        debug!("-> {} bytes", frame.bytes.len());
                        self.outbound_slot = None;
                        return;
                    }
                }
                Err(e) => {
                    warn!("Failed to send frame to server: {e}");
                    self.close_transport();
                    return;
                }
            }
        }
    }

    fn close_transport(&mut self) {
        if let Some(conn) = self.connection.as_mut() {
            conn.close();
        }
        self.decoder.reset();
    }

    /// Drop the connection and every session-scoped flag.
    fn reset(&mut self, handler: &mut impl MessageHandler) {
        if let Some(mut conn) = self.connection.take() {
            conn.close();
        }
        self.logged_in = false;
        self.login_sent = false;
        self.outbound_slot = None;
        self.decoder.reset();
        self.state = SessionState::Disconnected;
        handler.on_session_reset();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn login_sent(&self) -> bool {
        self.login_sent
    }

    pub fn has_pending_outbound(&self) -> bool {
        self.outbound_slot.is_some()
    }

    /// Whether the network link under the transport is up.
    pub fn link_up(&self) -> bool {
        self.connector.link_up()
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_timer.interval()
    }
}

impl<C: Connector> SyncPort for DeviceSyncSession<C> {
    /// True once the transport is ready to carry frames.
    fn is_connected(&self) -> bool {
        matches!(
            self.state,
            SessionState::AwaitingLogin | SessionState::LoggedIn
        ) && self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn send(&mut self, message: &Outbound, bypass_login_check: bool) -> bool {
        if !self.is_connected() {
            debug!("Server not connected, cannot send {}", message.key());
            return false;
        }
        if !self.logged_in && !bypass_login_check {
            return false;
        }
        if self.outbound_slot.is_some() {
            warn!("Outbound slot occupied, unable to send {} yet", message.key());
            return false;
        }

        match message.encode() {
            Ok(payload) => {
                self.outbound_slot = Some(OutboundFrame {
                    bytes: encode_frame(&payload),
                    written: 0,
                });
                true
            }
            Err(e) => {
                error!("Failed to serialize {}: {e}", message.key());
                false
            }
        }
    }
}
