//! Line frame codec.
//!
//! Wire format: one JSON envelope per frame, terminated by `\r`.
//!
//! ```text
//! {"key":"/iot/get_data","data":{}}\r{"key":...}\r
//! ```
//!
//! Frames ride inside transport messages, but the two boundaries need not
//! line up: the server sends each reply and its `\r` as separate
//! WebSocket messages.  The decoder accumulates incoming bytes and yields
//! complete frames.  A single `receive` may return part of a frame or
//! several frames concatenated.  `\n` is accepted as a terminator too,
//! and empty frames are skipped.

use crate::error::ProtocolViolation;

/// Maximum frame payload size (protects against memory exhaustion).
pub const MAX_FRAME_SIZE: usize = 4096;

const TERMINATOR: u8 = b'\r';

/// Streaming frame decoder.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete frame, if any.
    ///
    /// A frame longer than [`MAX_FRAME_SIZE`] (terminated or not) yields
    /// `Err(FrameTooLong)` and the buffered input is discarded.
    pub fn next_frame(&mut self) -> Option<Result<Vec<u8>, ProtocolViolation>> {
        loop {
            let Some(end) = self.buf.iter().position(|&b| b == b'\r' || b == b'\n') else {
                if self.buf.len() > MAX_FRAME_SIZE {
                    self.buf.clear();
                    return Some(Err(ProtocolViolation::FrameTooLong));
                }
                return None;
            };

            let mut frame: Vec<u8> = self.buf.drain(..=end).collect();
            frame.pop();

            if frame.is_empty() {
                continue;
            }
            if frame.len() > MAX_FRAME_SIZE {
                self.buf.clear();
                return Some(Err(ProtocolViolation::FrameTooLong));
            }
            return Some(Ok(frame));
        }
    }

    /// Number of buffered bytes not yet forming a frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop buffered input (e.g. after a protocol violation or reconnect).
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

/// Encode a serialized envelope into a terminated frame.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.extend_from_slice(payload);
    out.push(TERMINATOR);
    out
}
