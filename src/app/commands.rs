//! Edge-triggered actuator commands.
//!
//! A command is raised by a server directive and consumed exactly once by
//! the [`ActuatorSafetyController`](crate::safety::ActuatorSafetyController)
//! on its next evaluation, whether or not it is honoured.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    enable_pump: bool,
    dispense_food: bool,
}

impl ActuatorCommands {
    /// Ask for the pump to be switched on at the next evaluation.
    pub fn request_pump(&mut self) {
        self.enable_pump = true;
    }

    /// Ask for the feed gate to open at the next evaluation.
    pub fn request_food(&mut self) {
        self.dispense_food = true;
    }

    pub fn take_enable_pump(&mut self) -> bool {
        core::mem::take(&mut self.enable_pump)
    }

    pub fn take_dispense_food(&mut self) -> bool {
        core::mem::take(&mut self.dispense_food)
    }

    pub fn pump_requested(&self) -> bool {
        self.enable_pump
    }

    pub fn food_requested(&self) -> bool {
        self.dispense_food
    }
}
