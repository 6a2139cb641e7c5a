//! DHT-style air temperature / humidity sensor.
//!
//! A DHT read takes milliseconds and fails often, so the driver samples
//! on its own slow timer and serves cached values in between.  A failed
//! sample (NaN) is logged and the previous value kept.
//!
//! Before the first good sample both values are NaN.

use core::time::Duration;

use log::warn;

use crate::error::SensorError;
use crate::scheduler::TickTimer;

/// One raw temperature / humidity sample.
pub trait ClimateSource {
    /// `(celsius, relative_humidity_pct)`.  Either may be NaN.
    fn sample(&mut self) -> (f32, f32);
}

pub struct ClimateSensor<S: ClimateSource> {
    source: S,
    timer: TickTimer,
    temperature_c: f32,
    humidity_pct: f32,
}

impl<S: ClimateSource> ClimateSensor<S> {
    pub fn new(source: S, read_interval: Duration) -> Self {
        Self {
            source,
            timer: TickTimer::new(read_interval),
            temperature_c: f32::NAN,
            humidity_pct: f32::NAN,
        }
    }

    /// Sample the source if the read interval has elapsed.
    pub fn refresh(&mut self, now_us: u64) {
        if !self.timer.should_tick(now_us) {
            return;
        }
        let (t, h) = self.source.sample();
        match check(t) {
            Ok(t) => self.temperature_c = t,
            Err(e) => warn!("Temperature {e}, keeping {:.1}", self.temperature_c),
        }
        match check(h) {
            Ok(h) => self.humidity_pct = h,
            Err(e) => warn!("Humidity {e}, keeping {:.1}", self.humidity_pct),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature_c
    }

    pub fn humidity(&self) -> f32 {
        self.humidity_pct
    }
}

fn check(value: f32) -> Result<f32, SensorError> {
    if value.is_nan() {
        Err(SensorError::NotANumber)
    } else {
        Ok(value)
    }
}
