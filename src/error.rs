//! Unified error types for the PetFeeder control core.
//!
//! A single `Error` enum that every subsystem can convert into.  None of
//! these ever escape the control loop: the loop logs them and turns them
//! into state (a retry, a reconnect, a retained sensor value).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A sensor returned an implausible reading.
    Sensor(SensorError),
    /// The server link failed at the transport level.
    Transport(TransportError),
    /// The server sent something the protocol does not allow.
    Protocol(ProtocolViolation),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Raw ADC value outside the converter's range.
    OutOfRange(i32),
    /// The sensor produced NaN (typically a failed DHT handshake).
    NotANumber,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(raw) => write!(f, "reading out of range ({raw})"),
            Self::NotANumber => write!(f, "reading is NaN"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server address has not been resolved (yet).
    Unresolved,
    /// The connection could not be established.
    ConnectFailed,
    /// An operation was attempted with no live connection.
    NotConnected,
    /// The peer closed the connection.
    Closed,
    /// Any other I/O failure.
    Io(std::io::ErrorKind),
    /// WebSocket handshake or framing failure.
    WebSocket(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "server address not resolved"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::Closed => write!(f, "connection closed by peer"),
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
            Self::WebSocket(msg) => write!(f, "websocket: {msg}"),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol violations
// ---------------------------------------------------------------------------

/// Every variant is fatal to the current connection and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// Frame did not parse as a JSON object.
    Malformed,
    /// One of `status`, `code`, `endpoint` was absent or mistyped.
    MissingField(&'static str),
    /// Server replied with `status: "error"`.
    ServerError { code: i64, message: Option<String> },
    /// `status` was neither `"success"` nor `"error"`.
    UnexpectedStatus(String),
    /// `code` outside `200..300`.
    UnsupportedCode(i64),
    /// A non-login message arrived before the login acknowledgement.
    BeforeLogin,
    /// A frame grew past the decoder limit without a terminator.
    FrameTooLong,
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed envelope"),
            Self::MissingField(name) => write!(f, "missing field '{name}'"),
            Self::ServerError { code, message } => match message {
                Some(m) => write!(f, "server error (code {code}): {m}"),
                None => write!(f, "server error (code {code})"),
            },
            Self::UnexpectedStatus(s) => write!(f, "unexpected status '{s}'"),
            Self::UnsupportedCode(c) => write!(f, "unsupported code {c}"),
            Self::BeforeLogin => write!(f, "message received before login"),
            Self::FrameTooLong => write!(f, "frame exceeds maximum length"),
        }
    }
}

impl std::error::Error for ProtocolViolation {}

impl From<ProtocolViolation> for Error {
    fn from(e: ProtocolViolation) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    Read(std::io::ErrorKind),
    /// The document could not be parsed.
    Parse(String),
    /// A field failed range validation.  Describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(kind) => write!(f, "read error: {kind}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
