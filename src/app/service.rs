//! Application service, the hexagonal core.
//!
//! [`AppService`] is the application context: it owns exactly one of
//! each subsystem and is driven by repeated calls to [`poll`].  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//! ActuatorPort ◀──│ Safety · Coordinator · Sync  │ ◀─▶ Connector
//!                 └──────────────────────────────┘
//! ```
//!
//! One pass, in order:
//!
//! 1. server session (or the link-wait animation while the link is down)
//! 2. sensor cache refresh
//! 3. on the loop tick: pull request, safety evaluation, push report
//! 4. change events and the periodic status report
//!
//! Safety evaluation always precedes reporting, so a report carries the
//! actuator decision of the same pass.
//!
//! [`poll`]: AppService::poll

use core::time::Duration;

use log::info;

use crate::config::{DeviceConfig, ExchangeMode};
use crate::safety::{ActuatorOutputs, ActuatorSafetyController};
use crate::scheduler::TickTimer;
use crate::sensors::SensorSnapshot;
use crate::sync::message::DeviceReport;
use crate::sync::session::DeviceSyncSession;
use crate::sync::transport::Connector;

use super::coordinator::Coordinator;
use super::events::{AppEvent, StatusReport};
use super::indicator::WaitIndicator;
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<C: Connector> {
    loop_timer: TickTimer,
    status_timer: TickTimer,
    link_wait_timer: TickTimer,
    indicator: WaitIndicator,
    safety: ActuatorSafetyController,
    session: DeviceSyncSession<C>,
    coordinator: Coordinator,
    exchange_mode: ExchangeMode,
    snapshot: SensorSnapshot,
    outputs: ActuatorOutputs,
    tick_count: u64,
}

impl<C: Connector> AppService<C> {
    /// Construct the service.  `config` is expected to be validated.
    pub fn new(config: &DeviceConfig, connector: C) -> Self {
        Self {
            loop_timer: TickTimer::new(config.loop_interval()),
            status_timer: TickTimer::new(Duration::from_millis(config.status_report_interval_ms)),
            link_wait_timer: TickTimer::new(Duration::from_millis(config.link_wait_frame_ms)),
            indicator: WaitIndicator::new(),
            safety: ActuatorSafetyController::new(config),
            session: DeviceSyncSession::new(config, connector),
            coordinator: Coordinator::new(config.exchange_mode.interval()),
            exchange_mode: config.exchange_mode,
            snapshot: SensorSnapshot::default(),
            outputs: ActuatorOutputs::default(),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the actuators in their safe state and announce startup.
    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        hw.all_off();
        sink.emit(&AppEvent::Started);
        info!(
            "AppService started ({:?} exchange, {:?} mode)",
            self.exchange_mode,
            self.coordinator.mode()
        );
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one loop pass.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn poll(
        &mut self,
        now_us: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        let prev_session = self.session.state();
        let prev_mode = self.coordinator.mode();

        // 1. Network
        if self.session.link_up() {
            self.indicator.reset();
            self.session.poll(now_us, &mut self.coordinator);
        } else if self.link_wait_timer.should_tick(now_us) {
            sink.emit(&AppEvent::LinkWaiting(self.indicator.advance()));
        }

        // 2. Sensor caches
        hw.refresh(now_us);

        // 3. Control pass
        if self.loop_timer.should_tick(now_us) {
            self.control_pass(now_us, hw, sink);
        }

        // 4. Change events
        let session = self.session.state();
        if session != prev_session {
            sink.emit(&AppEvent::SessionChanged {
                from: prev_session,
                to: session,
            });
        }
        let mode = self.coordinator.mode();
        if mode != prev_mode {
            sink.emit(&AppEvent::ModeChanged {
                from: prev_mode,
                to: mode,
            });
        }

        if self.status_timer.should_tick(now_us) {
            sink.emit(&AppEvent::Status(self.build_status()));
        }
    }

    fn control_pass(
        &mut self,
        now_us: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        self.coordinator.request_actuator_data(now_us, &mut self.session);

        self.snapshot = hw.snapshot();
        let outputs = self.safety.evaluate(
            now_us / 1000,
            self.snapshot.water_level_pct,
            self.coordinator.commands_mut(),
            hw,
        );

        if outputs.pump_on != self.outputs.pump_on {
            sink.emit(&AppEvent::PumpChanged(outputs.pump_on));
        }
        if outputs.dispenser_open != self.outputs.dispenser_open {
            sink.emit(&AppEvent::DispenserChanged(outputs.dispenser_open));
        }
        self.outputs = outputs;

        let report = DeviceReport::from_state(&self.snapshot, outputs);
        self.coordinator.report(now_us, report, &mut self.session);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_status(&self) -> StatusReport {
        StatusReport {
            temperature_c: self.snapshot.temperature_c,
            humidity_pct: self.snapshot.humidity_pct,
            water_level_pct: self.snapshot.water_level_pct,
            pump_on: self.outputs.pump_on,
            dispenser_open: self.outputs.dispenser_open,
            link_up: self.session.link_up(),
            session: self.session.state(),
            exchange_mode: self.exchange_mode,
            sync_mode: self.coordinator.mode(),
        }
    }

    pub fn session(&self) -> &DeviceSyncSession<C> {
        &self.session
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn safety(&self) -> &ActuatorSafetyController {
        &self.safety
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot
    }

    pub fn outputs(&self) -> ActuatorOutputs {
        self.outputs
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
