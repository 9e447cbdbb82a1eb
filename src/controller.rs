//! Trip controller: the Live/History state machine that sequences sampling,
//! trip accumulation and the persisted-record merge.
//!
//! ```text
//!            RECORD pressed: merge trip into EEPROM
//!   Live ─────────────────────────────────────────▶ History
//!     ▲                                               │
//!     └──────────── SESION pressed: zero trip ────────┘
//! ```
//!
//! Every bus transaction goes through `&mut self`, so the IMU, touch panel
//! and EEPROM exchanges can never overlap.

use embedded_hal::i2c::I2c;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{TripConfig, MS_TO_KMH};
use crate::drivers::mpu6050::Mpu6050;
use crate::edge_capture::EdgeCapture;
use crate::error::{Device, Diagnostics, Fault};
use crate::orientation::OrientationEstimator;
use crate::record::{PersistedRecord, TripRecordStore};
use crate::time_base::TimeBase;
use crate::touch::{TouchPanel, TouchSampler};
use crate::view::{self, Renderer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum View {
    Live,
    History,
}

/// Wheel frequency → ground speed.
pub fn speed_from_frequency(frequency_hz: f32, wheel_circumference_m: f32) -> f32 {
    frequency_hz * wheel_circumference_m * MS_TO_KMH
}

/// Running totals of the current trip.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TripAccumulator {
    pub distance_m: u32,
    pub speed_samples: u32,
    pub speed_sum_kmh: u32,
    pub current_speed_kmh: f32,
    pub prev_speed_kmh: f32,
    /// Sub-metre remainder not yet counted in `distance_m`.
    distance_carry_m: f32,
}

impl TripAccumulator {
    /// One cadence tick. Distance advances with the speed of the *previous*
    /// tick, so the first sample of a trip never adds distance.
    pub fn record_tick(&mut self, speed_kmh: f32, tick_period_s: f32) {
        self.prev_speed_kmh = self.current_speed_kmh;
        self.current_speed_kmh = speed_kmh;
        self.speed_samples = self.speed_samples.saturating_add(1);
        self.speed_sum_kmh = self.speed_sum_kmh.saturating_add(speed_kmh.round() as u32);

        let travelled = self.prev_speed_kmh / MS_TO_KMH * tick_period_s + self.distance_carry_m;
        let whole = travelled.floor();
        self.distance_m = self.distance_m.saturating_add(whole as u32);
        self.distance_carry_m = travelled - whole;
    }

    /// `distance_m / speed_samples`; `None` before the first sample.
    pub fn average_speed(&self) -> Option<u32> {
        self.distance_m.checked_div(self.speed_samples)
    }

    /// Mean of the sampled speeds, km/h.
    pub fn mean_speed_kmh(&self) -> Option<u32> {
        self.speed_sum_kmh.checked_div(self.speed_samples)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Devices the controller talks to. The IMU and the EEPROM share `i2c`.
pub struct TripIo<I2C, P> {
    pub i2c: I2C,
    pub imu: Mpu6050,
    pub panel: P,
    pub store: TripRecordStore,
}

impl<I2C, P> TripIo<I2C, P> {
    pub fn new(i2c: I2C, panel: P) -> Self {
        Self {
            i2c,
            imu: Mpu6050::new(),
            panel,
            store: TripRecordStore::default(),
        }
    }
}

pub struct TripController<I2C, P, R> {
    io: TripIo<I2C, P>,
    renderer: R,
    config: TripConfig,
    view: View,
    trip: TripAccumulator,
    estimator: OrientationEstimator,
    inclination_deg: f32,
    history: PersistedRecord,
    diagnostics: Diagnostics,
}

impl<I2C, P, R> TripController<I2C, P, R>
where
    I2C: I2c,
    P: TouchPanel,
    R: Renderer,
{
    pub fn new(io: TripIo<I2C, P>, renderer: R, config: TripConfig) -> Self {
        Self {
            io,
            renderer,
            config,
            view: View::Live,
            trip: TripAccumulator::default(),
            estimator: OrientationEstimator::new(),
            inclination_deg: 0.0,
            history: PersistedRecord::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Wake the IMU and draw the initial Live view.
    pub fn start(&mut self) {
        if self.io.imu.init(&mut self.io.i2c).is_err() {
            warn!("imu: init failed, inclination stays flat");
            self.diagnostics.record(Fault::Transport(Device::Imu));
        }
        view::draw_live_screen(&mut self.renderer, self.config.record_button);
        self.draw_live_values();
        info!("trip: live");
    }

    /// Cadence tick. Ignored outside the Live view.
    pub fn on_cadence(&mut self, edge: &EdgeCapture, time_base: &TimeBase) {
        if self.view != View::Live {
            return;
        }

        let frequency = edge.frequency();
        if frequency == 0.0 {
            self.diagnostics.record(Fault::NoSignal);
        }
        let speed = speed_from_frequency(frequency, self.config.wheel_circumference_m);

        match self.io.imu.read_sample(&mut self.io.i2c) {
            Ok(sample) => {
                self.inclination_deg = self.estimator.fuse_at(sample, time_base.now(), time_base);
            }
            Err(_) => {
                // Angle freezes at its last value.
                warn!("imu: read failed");
                self.diagnostics.record(Fault::Transport(Device::Imu));
            }
        }

        self.trip.record_tick(speed, self.config.cadence_s());
        trace!(
            "tick: {} km/h, {} deg, {} m",
            speed,
            self.inclination_deg,
            self.trip.distance_m
        );
        self.draw_live_values();
    }

    /// Handle a pending press. Returns the new view when a button was hit.
    pub fn on_touch(&mut self, touch: &TouchSampler) -> Option<View> {
        if !touch.pressed() {
            return None;
        }

        let reading = touch.sample_coordinate(
            &mut self.io.panel,
            &self.config.touch_calibration,
            self.config.touch_reduction,
        );
        touch.clear();

        let reading = match reading {
            Ok(r) => r,
            Err(_) => {
                warn!("touch: read failed");
                self.diagnostics.record(Fault::Transport(Device::TouchPanel));
                return None;
            }
        };
        if reading.clamped {
            debug!("touch: raw sample clamped");
            self.diagnostics.record(Fault::StaleTouch);
        }

        let button = match self.view {
            View::Live => self.config.record_button,
            View::History => self.config.session_button,
        };
        if !button.contains(reading.coordinate) {
            return None;
        }

        match self.view {
            View::Live => self.enter_history(),
            View::History => self.enter_live(),
        }
        Some(self.view)
    }

    fn enter_history(&mut self) {
        let avg = match self.trip.average_speed() {
            Some(avg) => avg,
            None => {
                self.diagnostics.record(Fault::DivideGuard);
                0
            }
        };

        self.history = match self.io.store.merge(&mut self.io.i2c, self.trip.distance_m, avg) {
            Ok(merged) => merged,
            Err(_) => {
                // Show this trip on its own; the stored record is untouched or partial.
                warn!("record: merge failed");
                self.diagnostics.record(Fault::Transport(Device::RecordMemory));
                PersistedRecord {
                    total_distance_m: self.trip.distance_m,
                    avg_speed_kmh: avg,
                }
            }
        };

        self.view = View::History;
        view::draw_history_screen(&mut self.renderer, self.config.session_button, &self.history);
        info!(
            "trip: history ({} m, {} km/h)",
            self.history.total_distance_m,
            self.history.avg_speed_kmh
        );
    }

    fn enter_live(&mut self) {
        self.trip.reset();
        // The frame moved while the record was on screen; start from the accelerometer.
        self.estimator.reset();
        self.view = View::Live;
        view::draw_live_screen(&mut self.renderer, self.config.record_button);
        self.draw_live_values();
        info!("trip: live");
    }

    fn draw_live_values(&mut self) {
        view::draw_live_values(
            &mut self.renderer,
            self.trip.current_speed_kmh,
            self.inclination_deg,
            self.trip.distance_m,
        );
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn trip(&self) -> &TripAccumulator {
        &self.trip
    }

    pub fn inclination(&self) -> f32 {
        self.inclination_deg
    }

    pub fn history(&self) -> PersistedRecord {
        self.history
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn config(&self) -> &TripConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn io_mut(&mut self) -> &mut TripIo<I2C, P> {
        &mut self.io
    }
}
