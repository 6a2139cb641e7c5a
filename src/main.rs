//! PetFeeder host simulation entry point.
//!
//! Wires simulated peripherals and a real WebSocket link to the control
//! core and runs the cooperative loop forever.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HardwareAdapter   LogEventSink   SystemClock   WsConnector  │
//! │  (Sensor+Actuator) (EventSink)    (Clock)       (Connector)  │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │           AppService (pure logic, polled)              │  │
//! │  │  Safety · Coordinator · DeviceSyncSession              │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use anyhow::{Context, Result};
use log::info;

use petfeeder::adapters::hardware::HardwareAdapter;
use petfeeder::adapters::log_sink::LogEventSink;
use petfeeder::adapters::sim::{SimClimate, SimPin, SimPwm, SimTank};
use petfeeder::adapters::time::SystemClock;
use petfeeder::adapters::ws_transport::WsConnector;
use petfeeder::app::ports::Clock;
use petfeeder::app::service::AppService;
use petfeeder::config::DeviceConfig;
use petfeeder::drivers::pump::PumpDriver;
use petfeeder::drivers::servo::ServoDriver;
use petfeeder::sensors::SensorHub;
use petfeeder::sensors::climate::ClimateSensor;
use petfeeder::sensors::water_level::WaterLevelSensor;

/// Yield between loop passes so the host CPU is not pegged.
const LOOP_YIELD: Duration = Duration::from_millis(1);

fn load_config() -> Result<DeviceConfig> {
    let Ok(path) = std::env::var("PETFEEDER_CONFIG") else {
        info!("PETFEEDER_CONFIG not set, using defaults");
        let config = DeviceConfig::default();
        config.validate()?;
        return Ok(config);
    };
    let config = DeviceConfig::load(&path).with_context(|| format!("loading {path}"))?;
    info!("Config loaded from {}", path);
    Ok(config)
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  PetFeeder v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config = load_config()?;
    info!(
        "Device ID: {} | server {} | {:?} exchange",
        config.device_id,
        config.server_url(),
        config.exchange_mode
    );

    // ── 3. Peripherals (simulated) ────────────────────────────
    let pump_pin = SimPin::new(true);
    let climate = SimClimate::new(24.0, 55.0);
    let tank = SimTank::new(1200, pump_pin.clone());
    let sensors = SensorHub::new(
        ClimateSensor::new(climate, Duration::from_millis(config.climate_read_interval_ms)),
        WaterLevelSensor::new(tank, Duration::from_millis(config.water_level_read_interval_ms)),
    );
    let mut hw = HardwareAdapter::new(
        sensors,
        PumpDriver::new(pump_pin),
        ServoDriver::new(SimPwm::new(), config.dispenser_closed_angle),
        config.dispenser_closed_angle,
    );

    // ── 4. Application core ───────────────────────────────────
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(&config, WsConnector::new(&config));
    app.start(&mut hw, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 5. Cooperative loop ───────────────────────────────────
    loop {
        app.poll(clock.now_us(), &mut hw, &mut sink);
        std::thread::sleep(LOOP_YIELD);
    }
}
