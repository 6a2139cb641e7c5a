//! Actuator limits hold regardless of what the network does.

use petfeeder::app::events::AppEvent;
use serde_json::json;

use crate::harness::Harness;
use crate::mock_hw::MockHardware;

fn harness() -> Harness<MockHardware> {
    Harness::new(MockHardware::new())
}

#[test]
fn pump_times_out_during_network_outage() {
    let mut h = harness();
    h.login();
    h.deliver_directive(json!({"shouldEnableWaterPump": true}));
    assert!(h.hw.pump_on());
    let on_at_ms = h.now_ms();

    h.server.drop_connection();
    h.server.set_accept(false);

    h.run_until((on_at_ms + 45_000) * 1000);
    assert!(h.hw.pump_on(), "exactly max-on is still allowed");

    h.step();
    assert!(!h.hw.pump_on());
    assert_eq!(h.app.safety().pump().enabled_since_ms, None);
    assert_eq!(h.hw.pump_activations(), 1);
    assert!(h.sink.events.contains(&AppEvent::PumpChanged(false)));
}

#[test]
fn overflow_blocks_server_directive() {
    let mut h = harness();
    h.hw.water_level_pct = Some(60);
    h.login();
    h.deliver_directive(json!({"shouldEnableWaterPump": true}));
    assert!(!h.hw.pump_on());
    assert_eq!(h.hw.pump_activations(), 0);

    h.step();
    assert_eq!(h.last_sent_data()["PuEn"], json!(0));
}

#[test]
fn rising_level_stops_running_pump() {
    let mut h = harness();
    h.login();
    h.deliver_directive(json!({"shouldEnableWaterPump": true}));
    assert!(h.hw.pump_on());

    h.hw.water_level_pct = Some(50);
    h.step();
    assert!(!h.hw.pump_on());
    assert!(!h.app.outputs().pump_on);
}

#[test]
fn feed_gate_closes_after_open_limit() {
    let mut h = harness();
    h.login();
    h.deliver_directive(json!({"shouldDispenseFood": true}));
    assert_eq!(h.hw.angle(), 135);
    let opened_at = h.now_us;

    h.run_until(opened_at + 300_000);
    assert_eq!(h.hw.angle(), 135);
    h.step();
    assert_eq!(h.hw.angle(), 180);
    assert!(h.sink.events.contains(&AppEvent::DispenserChanged(true)));
    assert!(h.sink.events.contains(&AppEvent::DispenserChanged(false)));
}

#[test]
fn actuators_idle_without_server() {
    let mut h = harness();
    h.server.set_accept(false);
    h.poll();
    h.run_until(10_000_000);
    assert_eq!(h.hw.pump_activations(), 0);
    assert_eq!(h.hw.angle(), 180);
    assert_eq!(h.app.tick_count(), 101);
}
