//! Data-exchange coordinator.
//!
//! Decides, once per loop pass, whether to request actuator directives
//! (pull) or report device state (push).  The direction is switched only
//! by inbound replies:
//!
//! | Reply             | Effect                                    |
//! |-------------------|-------------------------------------------|
//! | `/iot/get_data`   | raise actuator commands, switch to push   |
//! | `/iot/post_data`  | switch to pull                            |
//!
//! Each direction keeps at most one request in flight.  The pending flag
//! is raised only when the session actually accepted the message and is
//! cleared by the matching reply or by a session reset.

use core::time::Duration;

use log::{debug, info};

use crate::scheduler::TickTimer;
use crate::sync::message::{DeviceReport, Endpoint, InboundMessage, Outbound};

use super::commands::ActuatorCommands;
use super::ports::{MessageHandler, SyncPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// The device reports its state and waits for an acknowledgement.
    Push,
    /// The device asks for desired actuator state and waits for the reply.
    Pull,
}

pub struct Coordinator {
    mode: SyncMode,
    awaiting_actuator_data: bool,
    awaiting_report_ack: bool,
    exchange_timer: TickTimer,
    commands: ActuatorCommands,
}

impl Coordinator {
    pub fn new(exchange_interval: Duration) -> Self {
        Self {
            mode: SyncMode::Push,
            awaiting_actuator_data: false,
            awaiting_report_ack: false,
            exchange_timer: TickTimer::new(exchange_interval),
            commands: ActuatorCommands::default(),
        }
    }

    /// Pull mode: ask the server for actuator directives.
    ///
    /// Returns `true` if a request went into the outbound slot.
    pub fn request_actuator_data(&mut self, now_us: u64, sync: &mut impl SyncPort) -> bool {
        if self.mode != SyncMode::Pull || self.awaiting_actuator_data {
            return false;
        }
        if !self.exchange_timer.should_tick(now_us) {
            return false;
        }
        if sync.send(&Outbound::GetData, false) {
            self.awaiting_actuator_data = true;
            return true;
        }
        false
    }

    /// Push mode: report the state decided this pass.
    ///
    /// Returns `true` if the report went into the outbound slot.
    pub fn report(&mut self, now_us: u64, report: DeviceReport, sync: &mut impl SyncPort) -> bool {
        if self.mode != SyncMode::Push || self.awaiting_report_ack {
            return false;
        }
        if !self.exchange_timer.should_tick(now_us) {
            return false;
        }
        if sync.send(&Outbound::PostData(report), false) {
            self.awaiting_report_ack = true;
            return true;
        }
        false
    }

    fn switch_mode(&mut self, to: SyncMode) {
        if self.mode != to {
            info!("Exchange mode {:?} -> {:?}", self.mode, to);
            self.mode = to;
        }
    }

    pub fn commands_mut(&mut self) -> &mut ActuatorCommands {
        &mut self.commands
    }

    pub fn commands(&self) -> ActuatorCommands {
        self.commands
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn awaiting_actuator_data(&self) -> bool {
        self.awaiting_actuator_data
    }

    pub fn awaiting_report_ack(&self) -> bool {
        self.awaiting_report_ack
    }
}

impl MessageHandler for Coordinator {
    fn handle(&mut self, message: &InboundMessage) {
        match &message.endpoint {
            Endpoint::GetData => {
                let directive = message.directive();
                if directive.should_enable_water_pump {
                    self.commands.request_pump();
                }
                if directive.should_dispense_food {
                    self.commands.request_food();
                }
                self.awaiting_actuator_data = false;
                self.switch_mode(SyncMode::Push);
            }
            Endpoint::PostData => {
                self.awaiting_report_ack = false;
                self.switch_mode(SyncMode::Pull);
            }
            Endpoint::Login => {}
            Endpoint::Other(name) => debug!("Ignoring reply for unknown endpoint {name}"),
        }
    }

    fn on_session_reset(&mut self) {
        self.awaiting_actuator_data = false;
        self.awaiting_report_ack = false;
    }
}
