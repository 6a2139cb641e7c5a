//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (serial console on the device, stderr on the host).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one tagged line.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Status(s) => {
                let level = s
                    .water_level_pct
                    .map_or_else(|| "--".to_owned(), |p| format!("{p}%"));
                info!(
                    "STATUS | T={:.1}\u{00b0}C H={:.1}% | water={} | pump={} gate={} | \
                     link={} session={:?} | {:?}/{:?}",
                    s.temperature_c,
                    s.humidity_pct,
                    level,
                    on_off(s.pump_on),
                    if s.dispenser_open { "OPEN" } else { "CLOSED" },
                    if s.link_up { "UP" } else { "DOWN" },
                    s.session,
                    s.exchange_mode,
                    s.sync_mode,
                );
            }
            AppEvent::SessionChanged { from, to } => {
                info!("SESSION | {:?} -> {:?}", from, to);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::PumpChanged(on) => {
                info!("PUMP | {}", on_off(*on));
            }
            AppEvent::DispenserChanged(open) => {
                info!("FEED | gate {}", if *open { "OPEN" } else { "CLOSED" });
            }
            AppEvent::LinkWaiting(frame) => {
                info!("LINK | {frame}");
            }
            AppEvent::Started => {
                info!("START | control loop running");
            }
        }
    }
}
