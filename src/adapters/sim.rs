//! Simulated peripherals and server for host runs and tests.
//!
//! Every sim type hands out cheap clones sharing one underlying state
//! (`Rc<Cell<_>>` / `Rc<RefCell<_>>`), so a test can keep a handle while
//! the driver owns another.  Single-threaded only.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType as DigitalErrorType, OutputPin, StatefulOutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};
use serde_json::Value;

use crate::error::TransportError;
use crate::sensors::climate::ClimateSource;
use crate::sensors::water_level::{ADC_MAX, LevelSource};
use crate::sync::transport::{Connection, Connector};

// ───────────────────────────────────────────────────────────────
// GPIO / PWM
// ───────────────────────────────────────────────────────────────

/// Output pin that remembers its level.
#[derive(Clone, Debug)]
pub struct SimPin {
    high: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self {
            high: Rc::new(Cell::new(high)),
        }
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }
}

impl DigitalErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high.get())
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high.get())
    }
}

/// PWM channel with a 16-bit duty range.
#[derive(Clone, Debug, Default)]
pub struct SimPwm {
    duty: Rc<Cell<u16>>,
}

impl SimPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self) -> u16 {
        self.duty.get()
    }
}

impl PwmErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.duty.set(duty);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor sources
// ───────────────────────────────────────────────────────────────

/// Climate source returning whatever was last set.
#[derive(Clone, Debug)]
pub struct SimClimate {
    reading: Rc<Cell<(f32, f32)>>,
}

impl SimClimate {
    pub fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            reading: Rc::new(Cell::new((temperature_c, humidity_pct))),
        }
    }

    pub fn set(&self, temperature_c: f32, humidity_pct: f32) {
        self.reading.set((temperature_c, humidity_pct));
    }
}

impl ClimateSource for SimClimate {
    fn sample(&mut self) -> (f32, f32) {
        self.reading.get()
    }
}

/// Reservoir that fills while the (active-low) pump pin is low and drains
/// slowly otherwise.  Each read advances the model by one step.
#[derive(Clone, Debug)]
pub struct SimTank {
    raw: Rc<Cell<i32>>,
    pump_pin: SimPin,
    fill_per_read: i32,
    drain_per_read: i32,
}

impl SimTank {
    pub fn new(raw: i32, pump_pin: SimPin) -> Self {
        Self {
            raw: Rc::new(Cell::new(raw)),
            pump_pin,
            fill_per_read: 120,
            drain_per_read: 4,
        }
    }

    /// Freeze the level; reads return `raw` until changed.
    pub fn still(mut self) -> Self {
        self.fill_per_read = 0;
        self.drain_per_read = 0;
        self
    }

    pub fn set_raw(&self, raw: i32) {
        self.raw.set(raw);
    }

    pub fn raw(&self) -> i32 {
        self.raw.get()
    }
}

impl LevelSource for SimTank {
    fn read_raw(&mut self) -> i32 {
        let current = self.raw.get();
        if (0..=ADC_MAX).contains(&current) {
            let next = if self.pump_pin.is_high() {
                current - self.drain_per_read
            } else {
                current + self.fill_per_read
            };
            self.raw.set(next.clamp(0, ADC_MAX));
        }
        current
    }
}

// ───────────────────────────────────────────────────────────────
// Server
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ServerState {
    accept: bool,
    link_up: bool,
    /// Bumped on every accepted connect; stale handles see a mismatch.
    generation: u64,
    alive: bool,
    inbox: Vec<u8>,
    received: Vec<u8>,
    connect_count: u32,
    /// Cap on bytes taken per `send`; `Some(0)` means always busy.
    write_limit: Option<usize>,
    /// `poll_ready` calls a new connection answers `false` to.
    setup_polls: u32,
}

/// Scripted in-memory server.  Clones share state.
#[derive(Clone, Debug)]
pub struct SimServer {
    state: Rc<RefCell<ServerState>>,
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimServer {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ServerState {
                accept: true,
                link_up: true,
                generation: 0,
                alive: false,
                inbox: Vec::new(),
                received: Vec::new(),
                connect_count: 0,
                write_limit: None,
                setup_polls: 0,
            })),
        }
    }

    pub fn set_accept(&self, accept: bool) {
        self.state.borrow_mut().accept = accept;
    }

    pub fn set_link_up(&self, up: bool) {
        self.state.borrow_mut().link_up = up;
    }

    /// Accept at most `limit` bytes per write, or everything with `None`.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state.borrow_mut().write_limit = limit;
    }

    /// Make new connections report not-ready for `polls` setup polls.
    pub fn set_setup_polls(&self, polls: u32) {
        self.state.borrow_mut().setup_polls = polls;
    }

    /// Queue a raw frame body for the device; the terminator is added.
    pub fn push_raw(&self, frame: &str) {
        let mut s = self.state.borrow_mut();
        s.inbox.extend_from_slice(frame.as_bytes());
        s.inbox.push(b'\r');
    }

    /// Queue a JSON reply for the device.
    pub fn push_reply(&self, reply: &Value) {
        self.push_raw(&reply.to_string());
    }

    /// Queue a success reply for `endpoint` with optional payload.
    pub fn reply_ok(&self, endpoint: &str, data: Option<Value>) {
        let mut reply = serde_json::json!({
            "endpoint": endpoint,
            "status": "success",
            "code": 200,
        });
        if let (Some(obj), Some(data)) = (reply.as_object_mut(), data) {
            obj.insert("data".to_owned(), data);
        }
        self.push_reply(&reply);
    }

    /// Hang up on the device.
    pub fn drop_connection(&self) {
        self.state.borrow_mut().alive = false;
    }

    pub fn is_alive(&self) -> bool {
        self.state.borrow().alive
    }

    pub fn connect_count(&self) -> u32 {
        self.state.borrow().connect_count
    }

    /// Every complete frame the device has written, parsed as JSON.
    pub fn received(&self) -> Vec<Value> {
        self.state
            .borrow()
            .received
            .split(|&b| b == b'\r')
            .filter(|f| !f.is_empty())
            .filter_map(|f| serde_json::from_slice(f).ok())
            .collect()
    }

    /// The `key` field of every frame received, in order.
    pub fn received_keys(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|v| v.get("key").and_then(Value::as_str).map(str::to_owned))
            .collect()
    }

    /// Raw bytes written by the device, terminators included.
    pub fn received_raw(&self) -> Vec<u8> {
        self.state.borrow().received.clone()
    }

    pub fn clear_received(&self) {
        self.state.borrow_mut().received.clear();
    }
}

/// Device side of one simulated connection.
#[derive(Debug)]
pub struct SimConnection {
    state: Rc<RefCell<ServerState>>,
    generation: u64,
    setup_polls: u32,
}

impl SimConnection {
    fn alive(&self) -> bool {
        let s = self.state.borrow();
        s.alive && s.generation == self.generation
    }
}

impl Connection for SimConnection {
    fn poll_ready(&mut self) -> Result<bool, TransportError> {
        if !self.alive() {
            return Err(TransportError::Closed);
        }
        if self.setup_polls == 0 {
            return Ok(true);
        }
        self.setup_polls -= 1;
        Ok(false)
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.alive() {
            return Err(TransportError::Closed);
        }
        let mut s = self.state.borrow_mut();
        let n = s.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        s.received.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.alive() {
            return Err(TransportError::Closed);
        }
        let mut s = self.state.borrow_mut();
        let n = buf.len().min(s.inbox.len());
        buf[..n].copy_from_slice(&s.inbox[..n]);
        s.inbox.drain(..n);
        Ok(n)
    }

    fn is_connected(&self) -> bool {
        self.alive()
    }

    fn close(&mut self) {
        if self.alive() {
            self.state.borrow_mut().alive = false;
        }
    }
}

impl Connector for SimServer {
    type Connection = SimConnection;

    fn connect(&mut self) -> Result<SimConnection, TransportError> {
        let mut s = self.state.borrow_mut();
        s.connect_count += 1;
        if !s.accept || !s.link_up {
            return Err(TransportError::ConnectFailed);
        }
        s.generation += 1;
        s.alive = true;
        s.inbox.clear();
        Ok(SimConnection {
            state: Rc::clone(&self.state),
            generation: s.generation,
            setup_polls: s.setup_polls,
        })
    }

    fn link_up(&self) -> bool {
        self.state.borrow().link_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tank_fills_while_pump_pin_low() {
        let pin = SimPin::new(true);
        let mut tank = SimTank::new(1000, pin.clone());
        tank.read_raw();
        assert!(tank.raw() < 1000);

        let mut low = pin.clone();
        low.set_low().unwrap();
        let before = tank.raw();
        tank.read_raw();
        assert!(tank.raw() > before);
    }

    #[test]
    fn stale_connection_stays_dead_after_reconnect() {
        let mut server = SimServer::new();
        let mut first = server.connect().unwrap();
        server.drop_connection();
        assert!(!first.is_connected());
        let second = server.connect().unwrap();
        assert!(second.is_connected());
        assert!(!first.is_connected());
        first.close();
        assert!(second.is_connected());
    }

    #[test]
    fn write_limit_truncates_each_send() {
        let mut server = SimServer::new();
        let mut conn = server.connect().unwrap();
        server.set_write_limit(Some(2));
        assert_eq!(conn.send(b"{}\r").unwrap(), 2);
        server.set_write_limit(Some(0));
        assert_eq!(conn.send(b"\r").unwrap(), 0);
    }

    #[test]
    fn setup_polls_delay_readiness() {
        let mut server = SimServer::new();
        server.set_setup_polls(1);
        let mut conn = server.connect().unwrap();
        assert!(!conn.poll_ready().unwrap());
        assert!(conn.poll_ready().unwrap());
    }

    #[test]
    fn receive_drains_inbox() {
        let mut server = SimServer::new();
        let mut conn = server.connect().unwrap();
        server.push_raw("{}");
        let mut buf = [0u8; 16];
        assert_eq!(conn.receive(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"{}\r");
        assert_eq!(conn.receive(&mut buf).unwrap(), 0);
    }
}
