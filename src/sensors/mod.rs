//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! Each driver rate-limits its own hardware access and caches the last
//! good value.  The hub forwards [`SensorPort::refresh`] to every driver
//! and answers reads from the caches.

pub mod climate;
pub mod water_level;

use crate::app::ports::SensorPort;
use climate::{ClimateSensor, ClimateSource};
use water_level::{LevelSource, WaterLevelSensor};

/// Cached sensor values sampled once per loop pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// `None` until the level sensor produced a valid reading.
    pub water_level_pct: Option<u8>,
}

/// Aggregates all sensor drivers.
pub struct SensorHub<C: ClimateSource, L: LevelSource> {
    pub climate: ClimateSensor<C>,
    pub water_level: WaterLevelSensor<L>,
}

impl<C: ClimateSource, L: LevelSource> SensorHub<C, L> {
    pub fn new(climate: ClimateSensor<C>, water_level: WaterLevelSensor<L>) -> Self {
        Self {
            climate,
            water_level,
        }
    }
}

impl<C: ClimateSource, L: LevelSource> SensorPort for SensorHub<C, L> {
    fn refresh(&mut self, now_us: u64) {
        self.climate.refresh(now_us);
        self.water_level.refresh(now_us);
    }

    fn read_temperature(&mut self) -> f32 {
        self.climate.temperature()
    }

    fn read_humidity(&mut self) -> f32 {
        self.climate.humidity()
    }

    fn read_water_level_percent(&mut self) -> Option<u8> {
        self.water_level.percent()
    }
}
