//! Hobby servo driving the feed gate.
//!
//! 50 Hz PWM, 20 ms period.  Pulse width maps linearly onto the angle:
//!
//! ```text
//!   pulse_us = 470 + 11.5 × degrees      (0° → 470 µs, 180° → 2540 µs)
//! ```
//!
//! The PWM peripheral holds the duty cycle between writes, so no periodic
//! refresh is needed.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

pub const PERIOD_US: u32 = 20_000;
const MIN_PULSE_US: f32 = 470.0;
const US_PER_DEGREE: f32 = 11.5;
pub const MAX_ANGLE: i32 = 180;

/// Pulse width for an angle, clamped to `0..=180`.
pub fn pulse_width_us(degrees: i32) -> u32 {
    let deg = degrees.clamp(0, MAX_ANGLE) as f32;
    (MIN_PULSE_US + US_PER_DEGREE * deg).round() as u32
}

pub struct ServoDriver<P: SetDutyCycle> {
    pwm: P,
    angle: i32,
}

impl<P: SetDutyCycle> ServoDriver<P> {
    /// Take the channel and move to `initial_angle`.  The angle is assumed
    /// even if the first duty write fails, so a dead channel never reads
    /// as an open gate.
    pub fn new(pwm: P, initial_angle: i32) -> Self {
        let mut servo = Self {
            pwm,
            angle: initial_angle.clamp(0, MAX_ANGLE),
        };
        servo.rotate(initial_angle);
        servo
    }

    pub fn rotate(&mut self, degrees: i32) {
        let angle = degrees.clamp(0, MAX_ANGLE);
        let max = u32::from(self.pwm.max_duty_cycle());
        let duty = (u64::from(pulse_width_us(angle)) * u64::from(max) / u64::from(PERIOD_US)) as u16;
        if let Err(e) = self.pwm.set_duty_cycle(duty) {
            warn!("Servo duty write failed: {e:?}");
            return;
        }
        self.angle = angle;
    }

    /// Last angle successfully written.
    pub fn current_angle(&self) -> i32 {
        self.angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::SimPwm;
    use embedded_hal::pwm::{ErrorKind, ErrorType};

    #[derive(Debug)]
    struct StuckChannel;

    #[derive(Debug)]
    struct ChannelFault;

    impl embedded_hal::pwm::Error for ChannelFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for StuckChannel {
        type Error = ChannelFault;
    }

    impl SetDutyCycle for StuckChannel {
        fn max_duty_cycle(&self) -> u16 {
            u16::MAX
        }

        fn set_duty_cycle(&mut self, _duty: u16) -> Result<(), ChannelFault> {
            Err(ChannelFault)
        }
    }

    #[test]
    fn pulse_width_endpoints() {
        assert_eq!(pulse_width_us(0), 470);
        assert_eq!(pulse_width_us(135), 2023);
        assert_eq!(pulse_width_us(180), 2540);
    }

    #[test]
    fn angle_is_clamped() {
        assert_eq!(pulse_width_us(-20), 470);
        assert_eq!(pulse_width_us(400), 2540);
        let mut servo = ServoDriver::new(SimPwm::new(), 180);
        servo.rotate(250);
        assert_eq!(servo.current_angle(), 180);
    }

    #[test]
    fn duty_matches_pulse() {
        let pwm = SimPwm::new();
        let mut servo = ServoDriver::new(pwm.clone(), 0);
        servo.rotate(180);
        // 2540 / 20000 of a 16-bit range.
        assert_eq!(pwm.duty(), (2540u64 * 65535 / 20_000) as u16);
        assert_eq!(servo.current_angle(), 180);
    }

    #[test]
    fn failed_first_write_keeps_initial_angle() {
        let mut servo = ServoDriver::new(StuckChannel, 180);
        assert_eq!(servo.current_angle(), 180);
        servo.rotate(90);
        assert_eq!(servo.current_angle(), 180);
    }
}
