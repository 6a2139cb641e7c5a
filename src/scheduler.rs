//! Cooperative periodic gate.
//!
//! Every subsystem is rate-limited by polling a [`TickTimer`] once per
//! loop pass and skipping its body when the gate stays shut.  Nothing
//! here ever blocks.
//!
//! ```text
//!  loop {
//!      now = clock.now_us()
//!      ┌──────────────┐   false
//!      │ should_tick? │──────────▶ skip
//!      └──────┬───────┘
//!             │ true (last_fire = now)
//!             ▼
//!        subsystem body
//!  }
//! ```
//!
//! Spacing is measured between consecutive `true` polls, never against
//! wall time, so a late poll simply shifts the next window.

use core::time::Duration;

/// A non-blocking periodic gate.
#[derive(Debug, Clone)]
pub struct TickTimer {
    /// Monotonic timestamp (µs) of the last poll that returned `true`.
    last_fire_us: Option<u64>,
    interval_us: u64,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_fire_us: None,
            interval_us: duration_to_us(interval),
        }
    }

    /// Poll the gate.
    ///
    /// The first poll after construction always opens.  After that the
    /// gate opens at most once per interval, measured from the previous
    /// opening.  A zero interval opens on every poll.
    pub fn should_tick(&mut self, now_us: u64) -> bool {
        let Some(last) = self.last_fire_us else {
            self.last_fire_us = Some(now_us);
            return true;
        };

        // A clock that steps backwards yields 0 elapsed, not a wrap.
        if now_us.saturating_sub(last) >= self.interval_us {
            self.last_fire_us = Some(now_us);
            return true;
        }
        false
    }

    /// Change the interval.  Takes effect on the next poll.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval_us = duration_to_us(interval);
    }

    pub fn interval(&self) -> Duration {
        Duration::from_micros(self.interval_us)
    }

    /// Forget the last firing so the next poll opens immediately.
    pub fn reset(&mut self) {
        self.last_fire_us = None;
    }
}

fn duration_to_us(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
