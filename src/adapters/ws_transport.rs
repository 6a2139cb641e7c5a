//! WebSocket transport adapter.
//!
//! Implements [`Connector`] / [`Connection`] with `tungstenite` over a
//! non-blocking `TcpStream`.  No call ever waits on the network.
//!
//! ## Connection model
//!
//! 1. The server host is resolved once, on a helper thread started when
//!    the connector is built.  IP literals skip the lookup.
//! 2. `connect()` starts a non-blocking TCP connect (`socket2`) and returns
//!    at once.  The connection then moves through its phases on every
//!    `poll_ready()`:
//!
//! ```text
//!  TcpConnecting ──writable──▶ Handshaking ──101──▶ Open
//!        │                          │                │
//!        └───── error ──────────────┴──── close ─────┴──▶ Closed
//! ```
//!
//! 3. Each outbound frame goes out as one binary message.  Inbound text
//!    and binary payloads are concatenated into a byte stream; the server
//!    follows every reply with a lone `"\r"` message, which the session's
//!    line decoder splits on.
//!
//! In real-time exchange mode `TCP_NODELAY` and keepalive are enabled.

use std::io::{self, ErrorKind};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use tungstenite::handshake::client::{ClientHandshake, Response};
use tungstenite::handshake::{HandshakeError, MidHandshake};
use tungstenite::{Message, WebSocket};

use crate::config::DeviceConfig;
use crate::error::TransportError;
use crate::sync::transport::{Connection, Connector};

type HandshakeResult =
    Result<(WebSocket<TcpStream>, Response), HandshakeError<ClientHandshake<TcpStream>>>;

// ───────────────────────────────────────────────────────────────
// Address resolution
// ───────────────────────────────────────────────────────────────

enum Resolver {
    Resolved(SocketAddr),
    Pending(Receiver<io::Result<Option<SocketAddr>>>),
    Failed,
}

impl Resolver {
    fn start(host: &str, port: u16) -> Self {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Self::Resolved(SocketAddr::new(ip, port));
        }
        let (tx, rx) = mpsc::channel();
        let target = (host.to_owned(), port);
        let spawned = thread::Builder::new()
            .name("ws-resolve".into())
            .spawn(move || {
                let result = target.to_socket_addrs().map(|mut addrs| addrs.next());
                let _ = tx.send(result);
            });
        match spawned {
            Ok(_) => Self::Pending(rx),
            Err(e) => {
                warn!("WS: cannot start address lookup: {e}");
                Self::Failed
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Connector
// ───────────────────────────────────────────────────────────────

pub struct WsConnector {
    host: String,
    port: u16,
    url: String,
    real_time: bool,
    resolver: Resolver,
}

impl WsConnector {
    /// Build the connector and start resolving the server host.
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            host: config.server_host.clone(),
            port: config.server_port,
            url: config.server_url(),
            real_time: config.exchange_mode.is_real_time(),
            resolver: Resolver::start(&config.server_host, config.server_port),
        }
    }

    /// The resolved server address, if the lookup has finished.  A failed
    /// lookup is restarted so the next attempt can succeed.
    pub fn address(&mut self) -> Option<SocketAddr> {
        if let Resolver::Pending(rx) = &self.resolver {
            let outcome = rx.try_recv();
            self.resolver = match outcome {
                Ok(Ok(Some(addr))) => {
                    info!("WS: {} resolved to {}", self.host, addr);
                    Resolver::Resolved(addr)
                }
                Ok(Ok(None)) => {
                    warn!("WS: {} has no addresses", self.host);
                    Resolver::Failed
                }
                Ok(Err(e)) => {
                    warn!("WS: cannot resolve {}: {e}", self.host);
                    Resolver::Failed
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => Resolver::Failed,
            };
        }
        match self.resolver {
            Resolver::Resolved(addr) => Some(addr),
            Resolver::Failed => {
                self.resolver = Resolver::start(&self.host, self.port);
                None
            }
            Resolver::Pending(_) => None,
        }
    }
}

#[cfg(unix)]
fn connect_in_progress(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EINPROGRESS) || e.kind() == ErrorKind::WouldBlock
}

#[cfg(not(unix))]
fn connect_in_progress(e: &io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock
}

impl Connector for WsConnector {
    type Connection = WsConnection;

    fn connect(&mut self) -> Result<WsConnection, TransportError> {
        let addr = self.address().ok_or(TransportError::Unresolved)?;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        if self.real_time {
            socket.set_keepalive(true)?;
        }
        match socket.connect(&addr.into()) {
            Ok(()) => {}
            Err(ref e) if connect_in_progress(e) => {}
            Err(e) => return Err(e.into()),
        }
        debug!("WS: TCP connect to {} started", addr);

        Ok(WsConnection {
            phase: Phase::TcpConnecting(socket.into()),
            url: self.url.clone(),
            no_delay: self.real_time,
            rx: Vec::new(),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Connection
// ───────────────────────────────────────────────────────────────

enum Phase {
    TcpConnecting(TcpStream),
    Handshaking(MidHandshake<ClientHandshake<TcpStream>>),
    Open(WebSocket<TcpStream>),
    Closed,
}

pub struct WsConnection {
    phase: Phase,
    url: String,
    no_delay: bool,
    /// Received payload bytes not yet handed to the session.
    rx: Vec<u8>,
}

impl WsConnection {
    fn advance(&self, phase: Phase) -> Result<Phase, TransportError> {
        match phase {
            Phase::TcpConnecting(stream) => {
                if let Some(e) = stream.take_error()? {
                    return Err(e.into());
                }
                match stream.peer_addr() {
                    Ok(_) => {}
                    Err(ref e) if e.kind() == ErrorKind::NotConnected => {
                        return Ok(Phase::TcpConnecting(stream));
                    }
                    Err(e) => return Err(e.into()),
                }
                if self.no_delay {
                    stream.set_nodelay(true)?;
                }
                debug!("WS: TCP connected, upgrading {}", self.url);
                Self::handshake(tungstenite::client(self.url.as_str(), stream))
            }
            Phase::Handshaking(mid) => Self::handshake(mid.handshake()),
            Phase::Open(ws) => Ok(Phase::Open(ws)),
            Phase::Closed => Err(TransportError::NotConnected),
        }
    }

    fn handshake(result: HandshakeResult) -> Result<Phase, TransportError> {
        match result {
            Ok((ws, _)) => {
                info!("WS: handshake complete");
                Ok(Phase::Open(ws))
            }
            Err(HandshakeError::Interrupted(mid)) => Ok(Phase::Handshaking(mid)),
            Err(HandshakeError::Failure(e)) => Err(TransportError::WebSocket(e.to_string())),
        }
    }

    fn fail(&mut self, e: tungstenite::Error) -> TransportError {
        self.phase = Phase::Closed;
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                debug!("WS: connection closed");
                TransportError::Closed
            }
            tungstenite::Error::Io(e) => {
                warn!("WS: connection error: {e}");
                TransportError::Io(e.kind())
            }
            other => {
                warn!("WS: protocol error: {other}");
                TransportError::WebSocket(other.to_string())
            }
        }
    }

    /// Flush queued writes and read at most one message into `rx`.
    fn pump(&mut self) -> Result<(), TransportError> {
        let Phase::Open(ws) = &mut self.phase else {
            return Err(TransportError::NotConnected);
        };
        let outcome = match ws.flush() {
            Ok(()) => ws.read(),
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => ws.read(),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(Message::Binary(data)) => self.rx.extend_from_slice(&data),
            Ok(Message::Text(text)) => self.rx.extend_from_slice(text.as_bytes()),
            Ok(Message::Close(frame)) => {
                debug!("WS: server closed the connection ({:?})", frame);
                self.phase = Phase::Closed;
                return Err(TransportError::Closed);
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => return Err(self.fail(e)),
        }
        Ok(())
    }
}

impl Connection for WsConnection {
    fn poll_ready(&mut self) -> Result<bool, TransportError> {
        let phase = core::mem::replace(&mut self.phase, Phase::Closed);
        self.phase = self.advance(phase)?;
        Ok(matches!(self.phase, Phase::Open(_)))
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let Phase::Open(ws) = &mut self.phase else {
            return Err(TransportError::NotConnected);
        };
        // A would-block flush leaves the message queued inside the socket
        // wrapper; later flushes finish it.
        match ws.send(Message::binary(data.to_vec())) {
            Ok(()) => Ok(data.len()),
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                Ok(data.len())
            }
            Err(tungstenite::Error::WriteBufferFull(_)) => Ok(0),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.rx.is_empty() {
            self.pump()?;
        }
        let n = buf.len().min(self.rx.len());
        buf[..n].copy_from_slice(&self.rx[..n]);
        self.rx.drain(..n);
        Ok(n)
    }

    fn is_connected(&self) -> bool {
        !matches!(self.phase, Phase::Closed)
    }

    fn close(&mut self) {
        if let Phase::Open(ws) = &mut self.phase {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
        self.phase = Phase::Closed;
        self.rx.clear();
    }
}
