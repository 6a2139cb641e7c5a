//! The full driver stack: `HardwareAdapter` over simulated pins, PWM,
//! climate source and tank.

use core::time::Duration;

use petfeeder::adapters::hardware::HardwareAdapter;
use petfeeder::adapters::sim::{SimClimate, SimPin, SimPwm, SimTank};
use petfeeder::config::DeviceConfig;
use petfeeder::drivers::pump::PumpDriver;
use petfeeder::drivers::servo::{ServoDriver, pulse_width_us};
use petfeeder::sensors::SensorHub;
use petfeeder::sensors::climate::ClimateSensor;
use petfeeder::sensors::water_level::WaterLevelSensor;
use serde_json::json;

use crate::harness::Harness;

type SimHardware = HardwareAdapter<SimClimate, SimTank, SimPin, SimPwm>;

struct Handles {
    pump_pin: SimPin,
    pwm: SimPwm,
    climate: SimClimate,
    tank: SimTank,
}

fn build() -> (SimHardware, Handles) {
    let config = DeviceConfig::default();
    let pump_pin = SimPin::new(false);
    let pwm = SimPwm::new();
    let climate = SimClimate::new(24.0, 60.0);
    // 1024 / 4095 ≈ 25 %.
    let tank = SimTank::new(1024, pump_pin.clone()).still();

    let hub = SensorHub::new(
        ClimateSensor::new(climate.clone(), Duration::from_millis(config.climate_read_interval_ms)),
        WaterLevelSensor::new(tank.clone(), Duration::from_millis(config.water_level_read_interval_ms)),
    );
    let hw = HardwareAdapter::new(
        hub,
        PumpDriver::new(pump_pin.clone()),
        ServoDriver::new(pwm.clone(), config.dispenser_closed_angle),
        config.dispenser_closed_angle,
    );
    (
        hw,
        Handles {
            pump_pin,
            pwm,
            climate,
            tank,
        },
    )
}

fn duty_for(angle: i32) -> u16 {
    (u64::from(pulse_width_us(angle)) * u64::from(u16::MAX) / 20_000) as u16
}

#[test]
fn boots_safe() {
    let (hw, io) = build();
    let _h = Harness::new(hw);
    assert!(io.pump_pin.is_high(), "active-low relay must be released");
    assert_eq!(io.pwm.duty(), duty_for(180));
}

#[test]
fn report_carries_sensor_readings() {
    let (hw, _io) = build();
    let mut h = Harness::new(hw);
    h.login();
    h.step();
    assert_eq!(
        h.last_sent_data(),
        json!({"te": 24.0, "hu": 60.0, "wa": 25, "PuEn": 0, "DiFo": 0})
    );
}

#[test]
fn directive_drives_pins() {
    let (hw, io) = build();
    let mut h = Harness::new(hw);
    h.login();
    h.deliver_directive(json!({"shouldEnableWaterPump": true, "shouldDispenseFood": true}));

    assert!(!io.pump_pin.is_high());
    assert_eq!(io.pwm.duty(), duty_for(135));
}

#[test]
fn full_tank_cuts_pump_after_next_level_read() {
    let (hw, io) = build();
    let mut h = Harness::new(hw);
    h.login();
    h.deliver_directive(json!({"shouldEnableWaterPump": true}));
    assert!(!io.pump_pin.is_high());

    // The level sensor samples once per second, starting at t=0.
    io.tank.set_raw(4095);
    h.run_until(900_000);
    assert!(!io.pump_pin.is_high());
    h.run_until(1_000_000);
    assert!(io.pump_pin.is_high());
    assert_eq!(h.app.snapshot().water_level_pct, Some(100));
}

#[test]
fn failed_climate_read_keeps_last_values() {
    let (hw, io) = build();
    let mut h = Harness::new(hw);
    h.poll();
    io.climate.set(f32::NAN, f32::NAN);
    h.run_until(5_000_000);
    let snap = h.app.snapshot();
    assert_eq!((snap.temperature_c, snap.humidity_pct), (24.0, 60.0));
}
