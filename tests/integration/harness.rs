//! Drives an [`AppService`] against the in-memory server on a virtual
//! clock advancing in fixed steps.

use petfeeder::adapters::sim::SimServer;
use petfeeder::app::ports::{ActuatorPort, SensorPort, SyncPort};
use petfeeder::app::service::AppService;
use petfeeder::config::DeviceConfig;
use serde_json::Value;

use crate::mock_hw::RecordingSink;

/// One loop cadence with the default config.
pub const STEP_US: u64 = 100_000;

pub struct Harness<H: SensorPort + ActuatorPort> {
    pub app: AppService<SimServer>,
    pub server: SimServer,
    pub hw: H,
    pub sink: RecordingSink,
    pub now_us: u64,
}

#[allow(dead_code)]
impl<H: SensorPort + ActuatorPort> Harness<H> {
    pub fn new(hw: H) -> Self {
        Self::with_config(&DeviceConfig::default(), hw)
    }

    pub fn with_config(config: &DeviceConfig, mut hw: H) -> Self {
        let server = SimServer::new();
        let mut app = AppService::new(config, server.clone());
        let mut sink = RecordingSink::new();
        app.start(&mut hw, &mut sink);
        Self {
            app,
            server,
            hw,
            sink,
            now_us: 0,
        }
    }

    pub fn poll(&mut self) {
        self.app.poll(self.now_us, &mut self.hw, &mut self.sink);
    }

    pub fn step(&mut self) {
        self.now_us += STEP_US;
        self.poll();
    }

    pub fn run_until(&mut self, t_us: u64) {
        while self.now_us < t_us {
            self.step();
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_us / 1000
    }

    /// Connect at t=0 and finish the handshake at t=100 ms.  The first
    /// report is queued in the same pass.
    pub fn login(&mut self) {
        self.poll();
        self.server.reply_ok("/login", None);
        self.step();
        assert!(self.app.session().is_logged_in(), "login handshake failed");
    }

    /// From the state [`login`](Self::login) leaves: flush the report,
    /// acknowledge it, let the device pull, and answer with `directive`.
    /// Returns when the directive has been applied.
    pub fn deliver_directive(&mut self, directive: Value) {
        self.step();
        self.server.reply_ok("/iot/post_data", None);
        self.step();
        self.step();
        self.server.reply_ok("/iot/get_data", Some(directive));
        self.step();
    }

    /// The `data` object of the last frame the device wrote.
    pub fn last_sent_data(&self) -> Value {
        self.server
            .received()
            .last()
            .and_then(|v| v.get("data").cloned())
            .unwrap_or(Value::Null)
    }
}
