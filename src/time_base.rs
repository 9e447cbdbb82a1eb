//! Process-wide monotonic tick count. Every elapsed-time delta in the crate
//! (filter `dt`, debounce deadlines) is measured in these ticks.

use core::sync::atomic::{AtomicU32, Ordering};

/// Point in time, counted in TimeBase ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Ticks elapsed since `earlier`, correct across one counter wrap.
    pub fn ticks_since(self, earlier: Timestamp) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    pub fn after(self, ticks: u32) -> Timestamp {
        Timestamp(self.0.wrapping_add(ticks))
    }

    /// True once `self` has reached `deadline`. Valid while the two are less
    /// than half the counter range apart.
    pub fn has_reached(self, deadline: Timestamp) -> bool {
        (self.0.wrapping_sub(deadline.0) as i32) >= 0
    }
}

/// Monotonic tick counter advanced from a fixed-period timer callback.
pub struct TimeBase {
    ticks: AtomicU32,
    period_ms: u32,
}

impl TimeBase {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            ticks: AtomicU32::new(0),
            period_ms,
        }
    }

    /// Timer callback.
    pub fn tick(&self) -> Timestamp {
        Timestamp(self.ticks.fetch_add(1, Ordering::Relaxed).wrapping_add(1))
    }

    pub fn now(&self) -> Timestamp {
        Timestamp(self.ticks.load(Ordering::Relaxed))
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn ms_to_ticks(&self, ms: u32) -> u32 {
        ms.div_ceil(self.period_ms.max(1))
    }

    /// Seconds between two timestamps.
    pub fn seconds_between(&self, earlier: Timestamp, later: Timestamp) -> f32 {
        later.ticks_since(earlier) as f32 * self.period_ms as f32 / 1000.0
    }
}
