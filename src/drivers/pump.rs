//! Water pump relay driver.
//!
//! The relay input is active-low: driving the pin low energises the pump.
//! The driver is a dumb actuator; overflow and run-time limits live in
//! [`ActuatorSafetyController`](crate::safety::ActuatorSafetyController).
//!
//! [`is_on`](PumpDriver::is_on) reads the output latch back so callers
//! record what the pin actually holds, not what they asked for.

use embedded_hal::digital::StatefulOutputPin;
use log::warn;

pub struct PumpDriver<P: StatefulOutputPin> {
    pin: P,
}

impl<P: StatefulOutputPin> PumpDriver<P> {
    /// Take the pin and switch the pump off.
    pub fn new(pin: P) -> Self {
        let mut driver = Self { pin };
        driver.set(false);
        driver
    }

    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        };
        if let Err(e) = result {
            warn!("Pump pin write failed: {e:?}");
        }
    }

    /// Read back the latched level.  An unreadable pin counts as off.
    pub fn is_on(&mut self) -> bool {
        match self.pin.is_set_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("Pump pin readback failed: {e:?}");
                false
            }
        }
    }
}
