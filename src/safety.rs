//! Actuator safety controller.
//!
//! Runs **every loop tick**, independent of the network.  Each actuator
//! reconciles three inputs in strict order:
//!
//! 1. An edge-triggered activation command (consumed exactly once).
//! 2. A hard guard that forces the actuator off regardless of the command.
//! 3. A maximum on-duration that forces it off even with no guard trip.
//!
//! ## Water pump
//!
//! Guard: water level at or above the overflow threshold.  A level that
//! has never been read validly does not trip the guard.  The recorded
//! state is read back from the driver after every write.
//!
//! ## Feed dispenser
//!
//! With no command the gate stays open only if the servo is *physically*
//! open right now; there is no cached intent.  The target angle is
//! re-asserted every tick.

use log::warn;

use crate::app::commands::ActuatorCommands;
use crate::app::ports::ActuatorPort;
use crate::config::DeviceConfig;

/// On/off state of one actuator.
///
/// `enabled_since_ms` is `Some` exactly while `enabled` is true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorState {
    pub enabled: bool,
    pub enabled_since_ms: Option<u64>,
}

impl ActuatorState {
    /// Record the new level, stamping or clearing the on-since time.
    fn record(&mut self, enabled: bool, now_ms: u64) {
        self.enabled = enabled;
        if !enabled {
            self.enabled_since_ms = None;
        } else if self.enabled_since_ms.is_none() {
            self.enabled_since_ms = Some(now_ms);
        }
    }

    /// True once the actuator has been on for strictly longer than `limit_ms`.
    fn expired(&self, now_ms: u64, limit_ms: u64) -> bool {
        self.enabled_since_ms
            .is_some_and(|since| now_ms.saturating_sub(since) > limit_ms)
    }
}

/// What the controller decided this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorOutputs {
    pub pump_on: bool,
    pub dispenser_open: bool,
}

pub struct ActuatorSafetyController {
    pump: ActuatorState,
    dispenser: ActuatorState,
    pump_max_on_ms: u64,
    overflow_level_percent: u8,
    dispenser_max_open_ms: u64,
    open_angle: i32,
    closed_angle: i32,
    midpoint: i32,
}

impl ActuatorSafetyController {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            pump: ActuatorState::default(),
            dispenser: ActuatorState::default(),
            pump_max_on_ms: config.pump_max_on_ms,
            overflow_level_percent: config.overflow_level_percent,
            dispenser_max_open_ms: config.dispenser_max_open_ms,
            open_angle: config.dispenser_open_angle,
            closed_angle: config.dispenser_closed_angle,
            midpoint: config.dispenser_midpoint(),
        }
    }

    /// Evaluate both actuators and drive the hardware.
    ///
    /// `water_level` is `None` when no valid reading exists yet.
    pub fn evaluate(
        &mut self,
        now_ms: u64,
        water_level: Option<u8>,
        commands: &mut ActuatorCommands,
        hw: &mut impl ActuatorPort,
    ) -> ActuatorOutputs {
        self.evaluate_pump(now_ms, water_level, commands, hw);
        self.evaluate_dispenser(now_ms, commands, hw);
        self.outputs()
    }

    fn evaluate_pump(
        &mut self,
        now_ms: u64,
        water_level: Option<u8>,
        commands: &mut ActuatorCommands,
        hw: &mut impl ActuatorPort,
    ) {
        let mut enable = self.pump.enabled;

        if commands.take_enable_pump() {
            enable = true;
        }

        if enable && water_level.is_some_and(|l| l >= self.overflow_level_percent) {
            enable = false;
            warn!("Water overflow detected, water pump will not be enabled");
        }

        if enable && self.pump.expired(now_ms, self.pump_max_on_ms) {
            enable = false;
            self.pump.enabled_since_ms = None;
            warn!("Water pump timeout reached, disabling water pump");
        }

        hw.set_pump(enable);
        let actual = hw.pump_enabled();
        self.pump.record(actual, now_ms);
    }

    fn evaluate_dispenser(
        &mut self,
        now_ms: u64,
        commands: &mut ActuatorCommands,
        hw: &mut impl ActuatorPort,
    ) {
        let mut open = hw.dispenser_angle() < self.midpoint;

        if commands.take_dispense_food() {
            open = true;
        }

        if open && self.dispenser.expired(now_ms, self.dispenser_max_open_ms) {
            open = false;
            self.dispenser.enabled_since_ms = None;
            warn!("Dispenser open timeout reached, closing");
        }

        hw.set_dispenser_angle(if open { self.open_angle } else { self.closed_angle });
        self.dispenser.record(open, now_ms);
    }

    pub fn outputs(&self) -> ActuatorOutputs {
        ActuatorOutputs {
            pump_on: self.pump.enabled,
            dispenser_open: self.dispenser.enabled,
        }
    }

    pub fn pump(&self) -> ActuatorState {
        self.pump
    }

    pub fn dispenser(&self) -> ActuatorState {
        self.dispenser
    }
}
