//! End-to-end exchange between the AppService and the in-memory server.

use petfeeder::app::coordinator::SyncMode;
use petfeeder::app::events::AppEvent;
use petfeeder::sync::session::SessionState;
use serde_json::json;

use crate::harness::Harness;
use crate::mock_hw::MockHardware;

fn harness() -> Harness<MockHardware> {
    Harness::new(MockHardware::new())
}

#[test]
fn handshake_then_first_report() {
    let mut h = harness();
    h.login();
    assert_eq!(h.app.session().state(), SessionState::LoggedIn);
    assert!(h.app.coordinator().awaiting_report_ack());

    h.step();
    assert_eq!(h.server.received_keys(), ["/login", "/iot/post_data"]);
    assert_eq!(
        h.last_sent_data(),
        json!({"te": 23.5, "hu": 55.0, "wa": 20, "PuEn": 0, "DiFo": 0})
    );
}

#[test]
fn nothing_is_sent_before_login() {
    let mut h = harness();
    h.poll();
    h.run_until(1_000_000);
    assert_eq!(h.server.received_keys(), ["/login"]);
}

#[test]
fn report_not_repeated_while_awaiting_ack() {
    let mut h = harness();
    h.login();
    h.run_until(2_000_000);
    assert_eq!(h.server.received_keys(), ["/login", "/iot/post_data"]);
}

#[test]
fn ack_clears_pending_and_next_tick_exchanges_again() {
    let mut h = harness();
    h.login();
    h.step();

    h.server.reply_ok("/iot/post_data", None);
    h.step();
    assert!(!h.app.coordinator().awaiting_report_ack());
    // An acknowledged report hands the next exchange to pull.
    assert_eq!(h.app.coordinator().mode(), SyncMode::Pull);
    assert!(h.app.coordinator().awaiting_actuator_data());

    h.step();
    assert_eq!(
        h.server.received_keys(),
        ["/login", "/iot/post_data", "/iot/get_data"]
    );
}

#[test]
fn directive_drives_pump_and_next_report_reflects_it() {
    let mut h = harness();
    h.login();
    h.deliver_directive(json!({"shouldEnableWaterPump": true, "shouldDispenseFood": false}));

    assert!(h.hw.pump_on());
    assert_eq!(h.app.coordinator().mode(), SyncMode::Push);

    h.step();
    assert_eq!(h.server.received_keys().last().map(String::as_str), Some("/iot/post_data"));
    assert_eq!(h.last_sent_data()["PuEn"], json!(1));
}

#[test]
fn mode_changes_are_emitted() {
    let mut h = harness();
    h.login();
    h.deliver_directive(json!({}));
    let modes: Vec<_> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ModeChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        [(SyncMode::Push, SyncMode::Pull), (SyncMode::Pull, SyncMode::Push)]
    );
}

#[test]
fn dropped_connection_clears_pending_and_recovers() {
    let mut h = harness();
    h.login();
    h.step();
    assert!(h.app.coordinator().awaiting_report_ack());

    h.server.drop_connection();
    h.step();
    assert_eq!(h.app.session().state(), SessionState::Disconnected);
    assert!(!h.app.coordinator().awaiting_report_ack());
    assert!(h.sink.events.contains(&AppEvent::SessionChanged {
        from: SessionState::LoggedIn,
        to: SessionState::Disconnected,
    }));

    // Next attempt after the slow retry interval.
    let dropped_at = h.now_us;
    h.server.clear_received();
    h.run_until(dropped_at + 4_900_000);
    assert_eq!(h.server.connect_count(), 1);
    h.run_until(dropped_at + 5_000_000);
    assert_eq!(h.server.connect_count(), 2);
    assert_eq!(h.server.received_keys(), ["/login"]);

    h.server.reply_ok("/login", None);
    h.step();
    h.step();
    assert_eq!(h.server.received_keys(), ["/login", "/iot/post_data"]);
}

#[test]
fn server_error_reply_forces_reconnect() {
    let mut h = harness();
    h.login();
    h.step();
    h.server.push_reply(&json!({
        "endpoint": "/iot/post_data",
        "status": "error",
        "code": 500,
        "error_message": "database unavailable",
    }));
    h.step();
    assert!(!h.server.is_alive());
    h.step();
    assert_eq!(h.app.session().state(), SessionState::Disconnected);
    assert!(!h.app.coordinator().awaiting_report_ack());
}

#[test]
fn unknown_endpoint_is_ignored() {
    let mut h = harness();
    h.login();
    h.server.reply_ok("/iot/firmware", Some(json!({"version": 2})));
    h.step();
    assert_eq!(h.app.session().state(), SessionState::LoggedIn);
    assert!(h.server.is_alive());
}

#[test]
fn status_report_emitted_every_second() {
    let mut h = harness();
    h.poll();
    h.run_until(3_000_000);
    let n = h.sink.count(|e| matches!(e, AppEvent::Status(_)));
    assert_eq!(n, 4, "t = 0, 1, 2, 3 s");
}

#[test]
fn slow_link_still_delivers_whole_frames() {
    let mut h = harness();
    h.server.set_write_limit(Some(5));
    h.login();
    h.run_until(3_000_000);

    assert_eq!(h.server.received_keys(), ["/login", "/iot/post_data"]);
    assert_eq!(h.server.received_raw().last(), Some(&b'\r'));
    assert!(h.app.coordinator().awaiting_report_ack());

    h.server.reply_ok("/iot/post_data", None);
    h.step();
    assert!(!h.app.coordinator().awaiting_report_ack());
}
