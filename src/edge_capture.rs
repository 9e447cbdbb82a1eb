//! Wheel rotation period from hardware-timestamped sensor edges.
//!
//! The edge and overflow handlers only copy timer values and bump counters;
//! subtraction, overflow correction and division all run in the poll path.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Latched edge pair. A period is only valid with `edges_seen == 2`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeCaptureState {
    pub first_edge_ticks: u32,
    pub second_edge_ticks: u32,
    /// Counter wraps between the two edges.
    pub overflow_count: u32,
    pub edges_seen: u8,
}

impl EdgeCaptureState {
    /// Ticks between the two edges, corrected for counter wraps.
    ///
    /// `None` for fewer than two edges, a zero-length period (bounce) or a
    /// pair that cannot be ordered (second edge before the first with no wrap
    /// recorded).
    pub fn period_ticks(&self, timer_modulus: u32) -> Option<u32> {
        if self.edges_seen < 2 {
            return None;
        }
        let corrected_second =
            self.second_edge_ticks as u64 + self.overflow_count as u64 * timer_modulus as u64;
        let period = corrected_second.checked_sub(self.first_edge_ticks as u64)?;
        match period {
            0 => None,
            p => Some(p.min(u32::MAX as u64) as u32),
        }
    }
}

/// `tick_rate / period`, 0 for a zero period.
pub fn frequency_hz(tick_rate: u32, period_ticks: u32) -> f32 {
    if period_ticks == 0 {
        return 0.0;
    }
    tick_rate as f32 / period_ticks as f32
}

#[derive(Clone, Copy, Default)]
struct Capture {
    latched: EdgeCaptureState,
    /// Start of the period currently being timed.
    pending_first: u32,
    /// Wraps since the last edge; moved into `latched` on the next edge.
    pending_overflows: u32,
}

/// Rotation sensor capture, shared between the capture interrupt and the
/// cadence poll.
pub struct EdgeCapture {
    inner: Mutex<CriticalSectionRawMutex, Cell<Capture>>,
    tick_rate: u32,
    timer_modulus: u32,
    idle_overflow_limit: u32,
}

impl EdgeCapture {
    /// `no_signal_timeout_ms` without an edge drops the latched period.
    pub const fn new(tick_rate: u32, timer_modulus: u32, no_signal_timeout_ms: u32) -> Self {
        let timeout_ticks = no_signal_timeout_ms as u64 * tick_rate as u64 / 1000;
        let limit = timeout_ticks.div_ceil(timer_modulus as u64);
        Self {
            inner: Mutex::new(Cell::new(Capture {
                latched: EdgeCaptureState {
                    first_edge_ticks: 0,
                    second_edge_ticks: 0,
                    overflow_count: 0,
                    edges_seen: 0,
                },
                pending_first: 0,
                pending_overflows: 0,
            })),
            tick_rate,
            timer_modulus,
            idle_overflow_limit: if limit == 0 { 1 } else { limit as u32 },
        }
    }

    /// Edge interrupt: `count` is the captured free-running timer value.
    pub fn on_edge(&self, count: u32) {
        self.inner.lock(|cell| {
            let mut c = cell.get();
            if c.latched.edges_seen == 0 {
                c.latched.first_edge_ticks = count;
                c.latched.edges_seen = 1;
            } else {
                c.latched = EdgeCaptureState {
                    first_edge_ticks: c.pending_first,
                    second_edge_ticks: count,
                    overflow_count: c.pending_overflows,
                    edges_seen: 2,
                };
            }
            // This edge opens the next period.
            c.pending_first = count;
            c.pending_overflows = 0;
            cell.set(c);
        });
    }

    /// Counter-wrap interrupt.
    pub fn on_overflow(&self) {
        self.inner.lock(|cell| {
            let mut c = cell.get();
            c.pending_overflows = c.pending_overflows.saturating_add(1);
            if c.pending_overflows >= self.idle_overflow_limit {
                c.latched = EdgeCaptureState::default();
            }
            cell.set(c);
        });
    }

    /// Atomic copy of the latched pair.
    pub fn snapshot(&self) -> EdgeCaptureState {
        self.inner.lock(|cell| cell.get().latched)
    }

    pub fn period_ticks(&self) -> Option<u32> {
        self.snapshot().period_ticks(self.timer_modulus)
    }

    /// Wheel frequency in Hz, 0 without a valid period.
    pub fn frequency(&self) -> f32 {
        match self.period_ticks() {
            Some(period) => frequency_hz(self.tick_rate, period),
            None => {
                trace!("edge capture: no valid period");
                0.0
            }
        }
    }

    pub fn reset(&self) {
        self.inner.lock(|cell| cell.set(Capture::default()));
    }
}
