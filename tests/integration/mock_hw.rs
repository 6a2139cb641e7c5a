//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.  Sensor values are
//! plain fields the test sets directly.

use petfeeder::app::events::AppEvent;
use petfeeder::app::ports::{ActuatorPort, EventSink, SensorPort};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetPump(bool),
    SetDispenserAngle(i32),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub water_level_pct: Option<u8>,
    pump: bool,
    angle: i32,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            temperature_c: 23.5,
            humidity_pct: 55.0,
            water_level_pct: Some(20),
            pump: false,
            angle: 180,
        }
    }

    pub fn pump_on(&self) -> bool {
        self.pump
    }

    pub fn angle(&self) -> i32 {
        self.angle
    }

    /// Number of distinct off→on pump transitions commanded.
    pub fn pump_activations(&self) -> usize {
        let mut on = false;
        let mut count = 0;
        for call in &self.calls {
            let next = match call {
                ActuatorCall::SetPump(v) => *v,
                ActuatorCall::AllOff => false,
                ActuatorCall::SetDispenserAngle(_) => continue,
            };
            if next && !on {
                count += 1;
            }
            on = next;
        }
        count
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature(&mut self) -> f32 {
        self.temperature_c
    }

    fn read_humidity(&mut self) -> f32 {
        self.humidity_pct
    }

    fn read_water_level_percent(&mut self) -> Option<u8> {
        self.water_level_pct
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::SetPump(on));
        self.pump = on;
    }

    fn pump_enabled(&mut self) -> bool {
        self.pump
    }

    fn set_dispenser_angle(&mut self, degrees: i32) {
        self.calls.push(ActuatorCall::SetDispenserAngle(degrees));
        self.angle = degrees;
    }

    fn dispenser_angle(&self) -> i32 {
        self.angle
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
        self.pump = false;
        self.angle = 180;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
