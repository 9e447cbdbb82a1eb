//! Compile-time constants for the trip computer.
//!
//! Everything the controller needs at runtime is bundled into [`TripConfig`];
//! the remaining constants are consumed directly by the drivers and the
//! firmware tasks.

use crate::state::Rect;
use crate::touch::{Reduction, TouchCalibration};

// ── Wheel / speed ─────────────────────────────────────────────────────────────

/// Rolling circumference of a 700x23C wheel, metres.
pub const WHEEL_CIRCUMFERENCE_M: f32 = 2.075;
/// m/s → km/h
pub const MS_TO_KMH: f32 = 3.6;

// ── Timing ────────────────────────────────────────────────────────────────────

/// Controller cadence.
pub const CADENCE_MS: u32 = 500;
/// Period of the TimeBase tick.
pub const TIME_BASE_PERIOD_MS: u32 = 1;
/// One-shot debounce window after a touch interrupt.
pub const TOUCH_DEBOUNCE_MS: u32 = 5;

// ── Wheel capture timer ───────────────────────────────────────────────────────

/// Capture timer clock after prescaling (TIM5: 84 MHz / 84).
pub const CAPTURE_TICK_HZ: u32 = 1_000_000;
/// Counter wraps after this many ticks (ARR = 0xFFFF).
pub const CAPTURE_TIMER_MODULUS: u32 = 0x1_0000;
/// No edge for this long means the wheel has stopped.
pub const NO_SIGNAL_TIMEOUT_MS: u32 = 5_000;

// ── Orientation ───────────────────────────────────────────────────────────────

/// MPU6050 at ±2 g.
pub const ACCEL_LSB_PER_G: f32 = 16_384.0;
/// MPU6050 at ±250 °/s.
pub const GYRO_LSB_PER_DPS: f32 = 131.0;
/// A longer gap between IMU samples re-seeds the filter (four cadence ticks).
pub const IMU_STALE_AFTER_MS: u32 = 4 * CADENCE_MS;
/// Weight of the gyro-propagated estimate.
pub const FILTER_HPF: f32 = 0.98;
/// Weight of the accelerometer tilt.
pub const FILTER_LPF: f32 = 0.02;

// ── Touch panel ───────────────────────────────────────────────────────────────

pub const SCREEN_WIDTH: u16 = 320;
pub const SCREEN_HEIGHT: u16 = 240;
/// Raw 12-bit readings above this are treated as the panel edge.
pub const TOUCH_RAW_MAX: u16 = 3_840;
pub const TOUCH_SCALE_X: u16 = TOUCH_RAW_MAX / SCREEN_WIDTH;
pub const TOUCH_SCALE_Y: u16 = TOUCH_RAW_MAX / SCREEN_HEIGHT;

/// Both views put their only button in the same spot.
pub const BUTTON_RECT: Rect = Rect {
    x: 180,
    y: 200,
    w: 96,
    h: 32,
};

// ── Persistence ───────────────────────────────────────────────────────────────

pub const RECORD_DISTANCE_OFFSET: u16 = 0x00;
pub const RECORD_AVG_SPEED_OFFSET: u16 = 0x10;

/// Runtime parameters handed to the controller by `main`.
#[derive(Clone, Copy, Debug)]
pub struct TripConfig {
    pub wheel_circumference_m: f32,
    pub cadence_ms: u32,
    pub record_button: Rect,
    pub session_button: Rect,
    pub touch_calibration: TouchCalibration,
    pub touch_reduction: Reduction,
}

impl TripConfig {
    pub fn cadence_s(&self) -> f32 {
        self.cadence_ms as f32 / 1000.0
    }
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            wheel_circumference_m: WHEEL_CIRCUMFERENCE_M,
            cadence_ms: CADENCE_MS,
            record_button: BUTTON_RECT,
            session_button: BUTTON_RECT,
            touch_calibration: TouchCalibration::default(),
            touch_reduction: Reduction::BestPair,
        }
    }
}
