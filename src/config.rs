//! Device configuration parameters
//!
//! All tunable parameters for the PetFeeder control core.  Values are
//! injected at construction and never change while the loop runs.

use core::time::Duration;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{self, ConfigError};

/// How eagerly the device exchanges data with the server once logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeMode {
    /// 100 ms cadence, Nagle disabled on the socket.
    RealTime,
    /// 3 s cadence.
    Normal,
}

impl ExchangeMode {
    /// Cadence of server exchanges (and of session polling once connected).
    pub fn interval(self) -> Duration {
        match self {
            Self::RealTime => Duration::from_millis(100),
            Self::Normal => Duration::from_secs(3),
        }
    }

    pub fn is_real_time(self) -> bool {
        matches!(self, Self::RealTime)
    }
}

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Identity / server ---
    /// Hardware id sent in the login envelope.
    pub device_id: String,
    pub server_host: String,
    pub server_port: u16,
    pub exchange_mode: ExchangeMode,

    // --- Timing ---
    /// Control loop cadence (milliseconds)
    pub loop_interval_ms: u64,
    /// Session retry cadence while disconnected (milliseconds)
    pub reconnect_interval_ms: u64,
    /// DHT read cadence (milliseconds)
    pub climate_read_interval_ms: u64,
    /// Water level ADC read cadence (milliseconds)
    pub water_level_read_interval_ms: u64,
    /// Status report cadence (milliseconds)
    pub status_report_interval_ms: u64,
    /// Frame period of the link-wait animation (milliseconds)
    pub link_wait_frame_ms: u64,

    // --- Water pump ---
    /// Longest the pump may run before it is forced off (milliseconds)
    pub pump_max_on_ms: u64,
    /// Water level (0-100%) at or above which the pump may not run
    pub overflow_level_percent: u8,

    // --- Feed dispenser ---
    /// Longest the gate may stay open (milliseconds)
    pub dispenser_max_open_ms: u64,
    pub dispenser_open_angle: i32,
    pub dispenser_closed_angle: i32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "petfeeder-esp32dev-example".into(),
            server_host: "example.com".into(),
            server_port: 8080,
            exchange_mode: ExchangeMode::RealTime,

            loop_interval_ms: 100,
            reconnect_interval_ms: 5000,
            climate_read_interval_ms: 5000,
            water_level_read_interval_ms: 1000,
            status_report_interval_ms: 1000,
            link_wait_frame_ms: 200,

            pump_max_on_ms: 45_000,
            overflow_level_percent: 50,

            dispenser_max_open_ms: 300,
            dispenser_open_angle: 135,
            dispenser_closed_angle: 180,
        }
    }
}

impl DeviceConfig {
    /// Parse a JSON document.  Absent fields take their defaults; the
    /// result is validated before it is returned.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> error::Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.kind()))?;
        Ok(Self::from_json(&text)?)
    }

    /// Reject out-of-range values rather than clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.is_empty() {
            return Err(ConfigError::ValidationFailed("device_id must not be empty"));
        }
        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms must be > 0"));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "reconnect_interval_ms must be > 0",
            ));
        }
        if self.overflow_level_percent > 100 {
            return Err(ConfigError::ValidationFailed(
                "overflow_level_percent must be 0-100",
            ));
        }
        if !(0..=180).contains(&self.dispenser_open_angle)
            || !(0..=180).contains(&self.dispenser_closed_angle)
        {
            return Err(ConfigError::ValidationFailed(
                "dispenser angles must be 0-180 degrees",
            ));
        }
        if self.dispenser_open_angle >= self.dispenser_closed_angle {
            return Err(ConfigError::ValidationFailed(
                "dispenser_open_angle must be below dispenser_closed_angle",
            ));
        }
        Ok(())
    }

    /// Servo angle below which the dispenser counts as open.
    pub fn dispenser_midpoint(&self) -> i32 {
        (self.dispenser_open_angle + self.dispenser_closed_angle) / 2
    }

    pub fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// WebSocket URL of the server root.  IPv6 literals are bracketed.
    pub fn server_url(&self) -> String {
        if self.server_host.contains(':') {
            format!("ws://[{}]:{}/", self.server_host, self.server_port)
        } else {
            format!("ws://{}:{}/", self.server_host, self.server_port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = DeviceConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.pump_max_on_ms, 45_000);
        assert_eq!(c.dispenser_max_open_ms, 300);
        assert_eq!(c.overflow_level_percent, 50);
        assert_eq!(c.dispenser_midpoint(), 157);
    }

    #[test]
    fn exchange_mode_intervals() {
        assert_eq!(ExchangeMode::RealTime.interval(), Duration::from_millis(100));
        assert_eq!(ExchangeMode::Normal.interval(), Duration::from_secs(3));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = DeviceConfig::from_json(
            r#"{"server_host": "10.0.0.2", "exchange_mode": "normal"}"#,
        )
        .unwrap();
        assert_eq!(c.server_host, "10.0.0.2");
        assert_eq!(c.exchange_mode, ExchangeMode::Normal);
        assert_eq!(c.server_port, 8080);
    }

    #[test]
    fn inverted_angles_rejected() {
        let c = DeviceConfig {
            dispenser_open_angle: 180,
            dispenser_closed_angle: 135,
            ..DeviceConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn garbage_json_is_parse_error() {
        assert!(matches!(
            DeviceConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_device_id_rejected() {
        let c = DeviceConfig {
            device_id: String::new(),
            ..DeviceConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn server_url_brackets_ipv6() {
        let mut c = DeviceConfig {
            server_host: "10.0.0.2".into(),
            ..DeviceConfig::default()
        };
        assert_eq!(c.server_url(), "ws://10.0.0.2:8080/");
        c.server_host = "::1".into();
        assert_eq!(c.server_url(), "ws://[::1]:8080/");
    }

    #[test]
    fn load_reads_and_validates_file() {
        let path = std::env::temp_dir().join(format!("petfeeder-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"device_id": "feeder-7", "server_port": 9000}"#).unwrap();
        let loaded = DeviceConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        let c = loaded.unwrap();
        assert_eq!(c.device_id, "feeder-7");
        assert_eq!(c.server_port, 9000);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = DeviceConfig::load("/nonexistent/petfeeder.json").unwrap_err();
        assert_eq!(
            err,
            error::Error::Config(ConfigError::Read(std::io::ErrorKind::NotFound))
        );
    }
}
