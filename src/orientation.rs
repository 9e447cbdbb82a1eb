//! Frame inclination from a 6-axis IMU sample.
//!
//! The accelerometer tilt is computed with two explicit numeric primitives,
//! [`isqrt`] and [`arctan`], instead of library trig: their iteration count
//! and series length are fixed so results are reproducible bit for bit
//! across targets with and without an FPU.

use core::f32::consts::{FRAC_PI_2, PI};

use crate::config::{ACCEL_LSB_PER_G, FILTER_HPF, FILTER_LPF, GYRO_LSB_PER_DPS, IMU_STALE_AFTER_MS};
use crate::state::{RawImuSample, Vec3};
use crate::time_base::{TimeBase, Timestamp};

/// Newton–Raphson steps in [`isqrt`].
pub const ISQRT_ITERATIONS: usize = 100;
/// Series terms in [`arctan`].
pub const ARCTAN_TERMS: usize = 1000;

const RAD_TO_DEG: f32 = 180.0 / PI;

/// Square root by Newton–Raphson, seeded at `num / 2`.
///
/// Returns 0 for `num <= 0` (and NaN) so callers never divide by a garbage
/// root.
pub fn isqrt(num: f32) -> f32 {
    if !(num > 0.0) {
        return 0.0;
    }
    let mut x = num / 2.0;
    for _ in 0..ISQRT_ITERATIONS {
        x = 0.5 * (x + num / x);
    }
    x
}

/// Arctangent in radians.
///
/// Power series `Σ (-1)^k x^(2k+1) / (2k+1)` over [`ARCTAN_TERMS`] terms for
/// `|x| <= 1`; larger arguments fold through `±π/2 − arctan(1/x)`.
pub fn arctan(x: f32) -> f32 {
    if x > 1.0 {
        FRAC_PI_2 - arctan_series(1.0 / x)
    } else if x < -1.0 {
        -FRAC_PI_2 - arctan_series(1.0 / x)
    } else {
        arctan_series(x)
    }
}

fn arctan_series(x: f32) -> f32 {
    let x2 = x * x;
    let mut power = x;
    let mut sum = 0.0f32;
    for k in 0..ARCTAN_TERMS {
        let term = power / (2 * k + 1) as f32;
        if k % 2 == 0 {
            sum += term;
        } else {
            sum -= term;
        }
        power *= x2;
    }
    sum
}

/// Tilt in degrees from an acceleration vector in g:
/// `arctan(y / sqrt(x² + z²))`.
///
/// With `x = z = 0` the sensor points straight up or down and the result is
/// ±90° (0° when the vector is all zero).
pub fn accel_tilt_deg(accel: Vec3<f32>) -> f32 {
    let den_sq = accel.x * accel.x + accel.z * accel.z;
    if den_sq == 0.0 {
        return if accel.y > 0.0 {
            90.0
        } else if accel.y < 0.0 {
            -90.0
        } else {
            0.0
        };
    }
    let den = isqrt(den_sq);
    if den == 0.0 {
        return 0.0;
    }
    arctan(accel.y / den) * RAD_TO_DEG
}

/// Filter state carried between calls.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OrientationState {
    pub filtered_angle: f32,
    pub last_sample_time: Timestamp,
}

/// Complementary filter over accelerometer tilt and integrated gyro rate.
pub struct OrientationEstimator {
    state: OrientationState,
    initialized: bool,
    hpf: f32,
    lpf: f32,
    accel_lsb_per_g: f32,
    gyro_lsb_per_dps: f32,
    stale_after_s: f32,
}

impl Default for OrientationEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationEstimator {
    pub fn new() -> Self {
        Self::with_weights(FILTER_HPF, FILTER_LPF)
    }

    pub fn with_weights(hpf: f32, lpf: f32) -> Self {
        Self {
            state: OrientationState::default(),
            initialized: false,
            hpf,
            lpf,
            accel_lsb_per_g: ACCEL_LSB_PER_G,
            gyro_lsb_per_dps: GYRO_LSB_PER_DPS,
            stale_after_s: IMU_STALE_AFTER_MS as f32 / 1000.0,
        }
    }

    /// Accelerometer counts → g.
    pub fn normalize_accel(&self, accel: Vec3<i16>) -> Vec3<f32> {
        Vec3::new(
            accel.x as f32 / self.accel_lsb_per_g,
            accel.y as f32 / self.accel_lsb_per_g,
            accel.z as f32 / self.accel_lsb_per_g,
        )
    }

    /// One filter step; returns the new angle in degrees.
    ///
    /// `angle = HPF * (angle_prev + gyro_x * dt) + LPF * tilt_accel`. The first
    /// call seeds the state with the accelerometer tilt.
    pub fn fuse(&mut self, accel: Vec3<i16>, gyro: Vec3<i16>, dt_seconds: f32) -> f32 {
        let tilt_accel = accel_tilt_deg(self.normalize_accel(accel));

        if !self.initialized {
            self.state.filtered_angle = tilt_accel;
            self.initialized = true;
            return tilt_accel;
        }

        let gyro_contrib = gyro.x as f32 / self.gyro_lsb_per_dps * dt_seconds;

        self.state.filtered_angle =
            self.hpf * (self.state.filtered_angle + gyro_contrib) + self.lpf * tilt_accel;
        self.state.filtered_angle
    }

    /// [`fuse`](Self::fuse) with `dt` taken from the previous sample time.
    ///
    /// A gap longer than the stale limit (paused view, run of failed reads)
    /// says nothing about the rate in between, so the filter re-seeds from
    /// the accelerometer instead of integrating across it.
    pub fn fuse_at(&mut self, sample: RawImuSample, now: Timestamp, time_base: &TimeBase) -> f32 {
        let dt = if self.initialized {
            time_base.seconds_between(self.state.last_sample_time, now)
        } else {
            0.0
        };
        if self.initialized && dt > self.stale_after_s {
            debug!("orientation: {} s since last sample, re-seeding", dt);
            self.initialized = false;
        }
        self.state.last_sample_time = now;
        self.fuse(sample.accel, sample.gyro, dt)
    }

    pub fn angle(&self) -> f32 {
        self.state.filtered_angle
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = OrientationState::default();
        self.initialized = false;
    }
}
