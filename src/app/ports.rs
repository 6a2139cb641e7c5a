//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, event sinks, the server session)
//! implement these traits.  The domain consumes them via generics, so
//! the control core never touches hardware or sockets directly.

use crate::sensors::SensorSnapshot;
use crate::sync::message::{InboundMessage, Outbound};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  Sampled once per loop pass.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.  Never decreases.
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port.  Reads return cached values and never block.
pub trait SensorPort {
    /// Let rate-limited drivers refresh their caches.  Called every pass.
    fn refresh(&mut self, _now_us: u64) {}

    /// Air temperature (°C).
    fn read_temperature(&mut self) -> f32;

    /// Relative humidity (%).
    fn read_humidity(&mut self) -> f32;

    /// Reservoir level 0–100 %, or `None` before the first valid reading.
    fn read_water_level_percent(&mut self) -> Option<u8>;

    fn snapshot(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            temperature_c: self.read_temperature(),
            humidity_pct: self.read_humidity(),
            water_level_pct: self.read_water_level_percent(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Energise or de-energise the water pump.
    fn set_pump(&mut self, on: bool);

    /// Read back the level the pump output is actually holding.
    fn pump_enabled(&mut self) -> bool;

    /// Drive the feed-gate servo to an absolute angle (degrees).
    fn set_dispenser_angle(&mut self, degrees: i32);

    /// Current feed-gate servo angle (degrees).
    fn dispenser_angle(&self) -> i32;

    /// Pump off, gate closed.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Sync ports (domain ↔ server session)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the server session as seen by the coordinator.
pub trait SyncPort {
    fn is_connected(&self) -> bool;

    fn is_logged_in(&self) -> bool;

    /// Queue a message into the single outbound slot.
    ///
    /// Returns `false` with no side effect when the transport is down,
    /// when login is required but absent, or when the slot is occupied.
    /// `false` means "retry later", never a fatal error.
    fn send(&mut self, message: &Outbound, bypass_login_check: bool) -> bool;
}

/// Receives validated application messages from the session.
pub trait MessageHandler {
    fn handle(&mut self, message: &InboundMessage);

    /// The session dropped its connection.  Anything awaiting a reply
    /// will never get one.
    fn on_session_reset(&mut self) {}
}
