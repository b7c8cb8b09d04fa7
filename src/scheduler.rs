//! Fixed-interval tick scheduling.
//!
//! The main loop wakes often to service surface requests and asks the
//! [`Ticker`] whether a control tick is due. Ticks land on a fixed grid
//! (`start + n × interval`). If the loop falls behind, the missed slots
//! are counted and skipped: the regulator never fires a burst of
//! back-to-back ticks to catch up.
//!
//! ```text
//!  t ──┬─────────┬─────────┬─────────┬─────────┬──▶
//!      0        1 s       2 s       3 s       4 s
//!      ▲tick    ▲tick     · stall ·           ▲tick (2 s, 3 s skipped)
//! ```

use log::warn;

#[derive(Debug, Clone)]
pub struct Ticker {
    interval_ms: u64,
    next_due_ms: u64,
    skipped: u64,
}

impl Ticker {
    /// First tick is due immediately at `now_ms`.
    pub fn starting_at(now_ms: u64, interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms.max(1)),
            next_due_ms: now_ms,
            skipped: 0,
        }
    }

    /// `true` exactly once per grid slot reached; advances the grid.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms < self.next_due_ms {
            return false;
        }
        let late_slots = (now_ms - self.next_due_ms) / self.interval_ms;
        if late_slots > 0 {
            self.skipped += late_slots;
            warn!("Tick overrun: skipped {} slot(s)", late_slots);
        }
        self.next_due_ms += (late_slots + 1) * self.interval_ms;
        true
    }

    /// Milliseconds until the next tick (0 if already due).
    pub fn until_due(&self, now_ms: u64) -> u64 {
        self.next_due_ms.saturating_sub(now_ms)
    }

    /// Grid slots missed since start.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
