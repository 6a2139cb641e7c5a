//! Hardware adapter. Bridges peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and both actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  Generic over the
//! `embedded-hal` pin types so the same adapter drives real GPIO or the
//! [`sim`](super::sim) peripherals.

use embedded_hal::digital::StatefulOutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::pump::PumpDriver;
use crate::drivers::servo::ServoDriver;
use crate::sensors::SensorHub;
use crate::sensors::climate::ClimateSource;
use crate::sensors::water_level::LevelSource;

pub struct HardwareAdapter<C, L, P, S>
where
    C: ClimateSource,
    L: LevelSource,
    P: StatefulOutputPin,
    S: SetDutyCycle,
{
    sensors: SensorHub<C, L>,
    pump: PumpDriver<P>,
    servo: ServoDriver<S>,
    /// Angle that holds the feed gate shut.
    closed_angle: i32,
}

impl<C, L, P, S> HardwareAdapter<C, L, P, S>
where
    C: ClimateSource,
    L: LevelSource,
    P: StatefulOutputPin,
    S: SetDutyCycle,
{
    pub fn new(
        sensors: SensorHub<C, L>,
        pump: PumpDriver<P>,
        servo: ServoDriver<S>,
        closed_angle: i32,
    ) -> Self {
        Self {
            sensors,
            pump,
            servo,
            closed_angle,
        }
    }

    pub fn sensors(&self) -> &SensorHub<C, L> {
        &self.sensors
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<C, L, P, S> SensorPort for HardwareAdapter<C, L, P, S>
where
    C: ClimateSource,
    L: LevelSource,
    P: StatefulOutputPin,
    S: SetDutyCycle,
{
    fn refresh(&mut self, now_us: u64) {
        self.sensors.refresh(now_us);
    }

    fn read_temperature(&mut self) -> f32 {
        self.sensors.read_temperature()
    }

    fn read_humidity(&mut self) -> f32 {
        self.sensors.read_humidity()
    }

    fn read_water_level_percent(&mut self) -> Option<u8> {
        self.sensors.read_water_level_percent()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<C, L, P, S> ActuatorPort for HardwareAdapter<C, L, P, S>
where
    C: ClimateSource,
    L: LevelSource,
    P: StatefulOutputPin,
    S: SetDutyCycle,
{
    fn set_pump(&mut self, on: bool) {
        self.pump.set(on);
    }

    fn pump_enabled(&mut self) -> bool {
        self.pump.is_on()
    }

    fn set_dispenser_angle(&mut self, degrees: i32) {
        self.servo.rotate(degrees);
    }

    fn dispenser_angle(&self) -> i32 {
        self.servo.current_angle()
    }

    fn all_off(&mut self) {
        self.pump.set(false);
        self.servo.rotate(self.closed_angle);
    }
}
