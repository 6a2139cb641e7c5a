//! Reservoir water-level sensor on a 12-bit ADC.
//!
//! The analog level sensor reads 0..=4095; the driver converts to a rounded
//! percentage on its own timer.  A raw value outside the converter range
//! is logged and the previous percentage kept.

use core::time::Duration;

use log::warn;

use crate::error::SensorError;
use crate::scheduler::TickTimer;

pub const ADC_MAX: i32 = 4095;

/// Raw ADC access.
pub trait LevelSource {
    fn read_raw(&mut self) -> i32;
}

pub struct WaterLevelSensor<S: LevelSource> {
    source: S,
    timer: TickTimer,
    percent: Option<u8>,
}

impl<S: LevelSource> WaterLevelSensor<S> {
    pub fn new(source: S, read_interval: Duration) -> Self {
        Self {
            source,
            timer: TickTimer::new(read_interval),
            percent: None,
        }
    }

    pub fn refresh(&mut self, now_us: u64) {
        if !self.timer.should_tick(now_us) {
            return;
        }
        match raw_to_percent(self.source.read_raw()) {
            Ok(p) => self.percent = Some(p),
            Err(e) => warn!("Water level {e}, keeping {:?}", self.percent),
        }
    }

    /// `None` until the first valid reading.
    pub fn percent(&self) -> Option<u8> {
        self.percent
    }
}

/// `round(raw / 4095 * 100)`.
pub fn raw_to_percent(raw: i32) -> Result<u8, SensorError> {
    if !(0..=ADC_MAX).contains(&raw) {
        return Err(SensorError::OutOfRange(raw));
    }
    let pct = (raw * 100 + ADC_MAX / 2) / ADC_MAX;
    Ok(pct as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(i32);

    impl LevelSource for Fixed {
        fn read_raw(&mut self) -> i32 {
            self.0
        }
    }

    #[test]
    fn converts_with_rounding() {
        assert_eq!(raw_to_percent(0), Ok(0));
        assert_eq!(raw_to_percent(4095), Ok(100));
        assert_eq!(raw_to_percent(2048), Ok(50));
        assert_eq!(raw_to_percent(2027), Ok(49));
    }

    #[test]
    fn out_of_range_rejected() {
        assert_eq!(raw_to_percent(-1), Err(SensorError::OutOfRange(-1)));
        assert_eq!(raw_to_percent(4096), Err(SensorError::OutOfRange(4096)));
    }

    #[test]
    fn bad_reading_keeps_previous_percent() {
        let mut s = WaterLevelSensor::new(Fixed(4095), Duration::from_secs(1));
        assert_eq!(s.percent(), None);
        s.refresh(0);
        assert_eq!(s.percent(), Some(100));
        s.source.0 = 9000;
        s.refresh(1_000_000);
        assert_eq!(s.percent(), Some(100));
    }
}
