//! Transport abstraction for any non-blocking server link.
//!
//! Concrete implementations:
//! - WebSocket over TCP ([`WsConnector`](crate::adapters::ws_transport::WsConnector))
//! - In-memory scripted server for tests ([`SimServer`](crate::adapters::sim::SimServer))
//!
//! A fresh connection is still being set up (TCP connect, protocol
//! handshake).  The session drives it with [`Connection::poll_ready`] and
//! sends nothing until that reports ready.
//!
//! The session owns at most one [`Connection`] at a time.  Reconnecting
//! drops the old value and asks the [`Connector`] for a fresh one; nothing
//! is ever reused across connections.

use crate::error::TransportError;

/// One live connection.  Every call returns immediately.
pub trait Connection {
    /// Advance connection setup.  `Ok(true)` once frames can flow.
    fn poll_ready(&mut self) -> Result<bool, TransportError>;

    /// Write `data`.  Returns the number of bytes accepted, `Ok(0)` when
    /// the link is busy.  Message transports accept all of `data` or none.
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read up to `buf.len()` bytes.  Returns `Ok(0)` if nothing is pending.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// False once the peer hung up or [`close`](Self::close) was called.
    fn is_connected(&self) -> bool;

    fn close(&mut self);
}

/// Produces connections to the configured server.
pub trait Connector {
    type Connection: Connection;

    /// Attempt one connection.  Failure is transient; the caller retries later.
    fn connect(&mut self) -> Result<Self::Connection, TransportError>;

    /// Whether the underlying network link (e.g. WiFi association) is up.
    fn link_up(&self) -> bool {
        true
    }
}

/// A connector that never connects.  Runs the device in local-only mode.
pub struct NullConnector;

/// Never constructed; satisfies the associated type.
pub struct NullConnection;

impl Connection for NullConnection {
    fn poll_ready(&mut self) -> Result<bool, TransportError> {
        Err(TransportError::NotConnected)
    }

    fn send(&mut self, _data: &[u8]) -> Result<usize, TransportError> {
        Err(TransportError::NotConnected)
    }

    fn receive(&mut self, _buf: &mut [u8]) -> Result<usize, TransportError> {
        Err(TransportError::NotConnected)
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn close(&mut self) {}
}

impl Connector for NullConnector {
    type Connection = NullConnection;

    fn connect(&mut self) -> Result<NullConnection, TransportError> {
        Err(TransportError::ConnectFailed)
    }
}
