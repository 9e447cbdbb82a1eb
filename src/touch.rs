//! Resistive touch acquisition: falling-edge press detection with a fire-once
//! debounce window, and outlier-rejecting coordinate sampling.
//!
//! ```text
//!  Idle ──edge──▶ Debouncing ──deadline──▶ Idle
//!                    │  edges ignored, window not extended
//! ```
//!
//! Sampling is driven from the poll loop and does not depend on the debounce
//! state: the window only gates the *next* press interrupt.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH, TOUCH_RAW_MAX, TOUCH_SCALE_X, TOUCH_SCALE_Y};
use crate::state::Coordinate;
use crate::time_base::Timestamp;

/// Samples taken per axis for one coordinate.
pub const SAMPLES_PER_AXIS: usize = 3;

/// Interrupt-side state of the sampler.
///
/// Sampling is not a state of its own: [`TouchSampler::sample_coordinate`]
/// runs to completion inside one poll-loop call, holding the panel by
/// `&mut`, so nothing else can ever observe it in progress. It also runs
/// independently of the debounce window, which only gates the next edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchState {
    /// Edge interrupt armed.
    Idle,
    /// Edge interrupt disarmed until the debounce deadline.
    Debouncing,
}

/// State shared between the touch IRQ, the debounce timer and the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchSession {
    pub pressed_flag: bool,
    pub debounce_deadline: Option<Timestamp>,
    pub last_coordinate: Coordinate,
}

/// How three samples of one axis are reduced to one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reduction {
    /// Average the two closest samples, drop the third.
    BestPair,
    /// Plain mean of all three.
    Mean,
}

impl Reduction {
    pub fn reduce(self, samples: [u16; SAMPLES_PER_AXIS]) -> u16 {
        match self {
            Reduction::BestPair => best_pair_average(samples),
            Reduction::Mean => mean(samples),
        }
    }
}

/// Average of the two samples closest to each other.
pub fn best_pair_average(s: [u16; SAMPLES_PER_AXIS]) -> u16 {
    let d01 = s[0].abs_diff(s[1]);
    let d02 = s[0].abs_diff(s[2]);
    let d12 = s[1].abs_diff(s[2]);

    let (a, b) = if d01 <= d02 && d01 <= d12 {
        (s[0], s[1])
    } else if d02 <= d12 {
        (s[0], s[2])
    } else {
        (s[1], s[2])
    };
    ((a as u32 + b as u32) / 2) as u16
}

pub fn mean(s: [u16; SAMPLES_PER_AXIS]) -> u16 {
    let sum: u32 = s.iter().map(|&v| v as u32).sum();
    (sum / SAMPLES_PER_AXIS as u32) as u16
}

/// Raw controller counts → display pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchCalibration {
    pub raw_max: u16,
    pub scale_x: u16,
    pub scale_y: u16,
    pub width: u16,
    pub height: u16,
}

impl Default for TouchCalibration {
    fn default() -> Self {
        Self {
            raw_max: TOUCH_RAW_MAX,
            scale_x: TOUCH_SCALE_X,
            scale_y: TOUCH_SCALE_Y,
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

impl TouchCalibration {
    /// Clamp to the valid range; the flag reports whether clamping happened.
    pub fn clamp(&self, raw: u16) -> (u16, bool) {
        if raw > self.raw_max {
            (self.raw_max, true)
        } else {
            (raw, false)
        }
    }

    fn axis(&self, raw: u16, scale: u16, extent: u16) -> u16 {
        let (raw, _) = self.clamp(raw);
        let px = (self.raw_max - raw) / scale.max(1);
        px.min(extent.saturating_sub(1))
    }

    /// Clamp, invert and scale both axes.
    pub fn raw_to_screen(&self, raw_x: u16, raw_y: u16) -> Coordinate {
        Coordinate {
            x: self.axis(raw_x, self.scale_x, self.width),
            y: self.axis(raw_y, self.scale_y, self.height),
        }
    }
}

/// Raw samples from one acquisition burst.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawTouchSamples {
    pub x: [u16; SAMPLES_PER_AXIS],
    pub y: [u16; SAMPLES_PER_AXIS],
}

/// A touch controller able to produce one burst of raw samples.
pub trait TouchPanel {
    type Error;

    fn read_samples(&mut self) -> Result<RawTouchSamples, Self::Error>;
}

/// Result of [`TouchSampler::sample_coordinate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchReading {
    pub coordinate: Coordinate,
    /// At least one raw sample was outside the panel range.
    pub clamped: bool,
}

pub struct TouchSampler {
    session: Mutex<CriticalSectionRawMutex, Cell<TouchSession>>,
    debounce_ticks: u32,
}

impl TouchSampler {
    pub const fn new(debounce_ticks: u32) -> Self {
        Self {
            session: Mutex::new(Cell::new(TouchSession {
                pressed_flag: false,
                debounce_deadline: None,
                last_coordinate: Coordinate { x: 0, y: 0 },
            })),
            debounce_ticks,
        }
    }

    /// Touch IRQ falling edge.
    ///
    /// Returns `true` when the press was accepted; the caller then disarms the
    /// edge interrupt and starts the debounce timer. Edges arriving while the
    /// window is open are ignored and do not move the deadline.
    pub fn on_falling_edge(&self, now: Timestamp) -> bool {
        self.session.lock(|cell| {
            let mut s = cell.get();
            if s.debounce_deadline.is_some() {
                return false;
            }
            s.pressed_flag = true;
            s.debounce_deadline = Some(now.after(self.debounce_ticks));
            cell.set(s);
            true
        })
    }

    /// Debounce timer check. Returns `true` exactly once per window, at which
    /// point the caller re-arms the edge interrupt.
    pub fn poll_debounce(&self, now: Timestamp) -> bool {
        self.session.lock(|cell| {
            let mut s = cell.get();
            match s.debounce_deadline {
                Some(deadline) if now.has_reached(deadline) => {
                    s.debounce_deadline = None;
                    cell.set(s);
                    true
                }
                _ => false,
            }
        })
    }

    pub fn state(&self) -> TouchState {
        match self.session().debounce_deadline {
            Some(_) => TouchState::Debouncing,
            None => TouchState::Idle,
        }
    }

    /// Sticky press flag; stays set until [`clear`](Self::clear).
    pub fn pressed(&self) -> bool {
        self.session().pressed_flag
    }

    /// Acknowledge the current press.
    pub fn clear(&self) {
        self.session.lock(|cell| {
            let mut s = cell.get();
            s.pressed_flag = false;
            cell.set(s);
        });
    }

    pub fn last_coordinate(&self) -> Coordinate {
        self.session().last_coordinate
    }

    pub fn session(&self) -> TouchSession {
        self.session.lock(|cell| cell.get())
    }

    /// Read one burst from the panel and reduce it to a screen coordinate.
    ///
    /// The bus exchange runs outside the critical section; only the resulting
    /// coordinate is stored back.
    pub fn sample_coordinate<P: TouchPanel>(
        &self,
        panel: &mut P,
        calibration: &TouchCalibration,
        reduction: Reduction,
    ) -> Result<TouchReading, P::Error> {
        let raw = panel.read_samples()?;

        let mut clamped = false;
        let mut clamp_axis = |samples: [u16; SAMPLES_PER_AXIS]| {
            samples.map(|v| {
                let (v, c) = calibration.clamp(v);
                clamped |= c;
                v
            })
        };
        let xs = clamp_axis(raw.x);
        let ys = clamp_axis(raw.y);

        let raw_x = reduction.reduce(xs);
        let raw_y = reduction.reduce(ys);
        let coordinate = calibration.raw_to_screen(raw_x, raw_y);
        trace!("touch: raw ({}, {}) -> ({}, {})", raw_x, raw_y, coordinate.x, coordinate.y);

        self.session.lock(|cell| {
            let mut s = cell.get();
            s.last_coordinate = coordinate;
            cell.set(s);
        });

        Ok(TouchReading { coordinate, clamped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePanel {
        samples: RawTouchSamples,
        fail: bool,
    }

    impl TouchPanel for FakePanel {
        type Error = ();

        fn read_samples(&mut self) -> Result<RawTouchSamples, ()> {
            if self.fail {
                Err(())
            } else {
                Ok(self.samples)
            }
        }
    }

    fn calibration() -> TouchCalibration {
        TouchCalibration {
            raw_max: 3840,
            scale_x: 12,
            scale_y: 16,
            width: 320,
            height: 240,
        }
    }

    #[test]
    fn best_pair_drops_outlier() {
        assert_eq!(best_pair_average([10, 12, 100]), 11);
        assert_eq!(best_pair_average([100, 10, 12]), 11);
        assert_eq!(best_pair_average([10, 100, 12]), 11);
        assert_eq!(best_pair_average([7, 7, 7]), 7);
        assert_eq!(best_pair_average([u16::MAX, u16::MAX - 2, 0]), u16::MAX - 1);
    }

    #[test]
    fn mean_keeps_all_samples() {
        assert_eq!(mean([10, 12, 100]), 40);
        assert_eq!(mean([u16::MAX; 3]), u16::MAX);
        assert_eq!(Reduction::Mean.reduce([3, 4, 5]), 4);
        assert_eq!(Reduction::BestPair.reduce([3, 4, 50]), 3);
    }

    #[test]
    fn raw_to_screen_inverts_and_clamps() {
        let cal = calibration();
        assert_eq!(cal.raw_to_screen(3840, 3840), Coordinate { x: 0, y: 0 });
        assert_eq!(cal.raw_to_screen(4095, 4095), Coordinate { x: 0, y: 0 });
        assert_eq!(cal.raw_to_screen(1920, 1920), Coordinate { x: 160, y: 120 });
        assert_eq!(cal.raw_to_screen(0, 0), Coordinate { x: 319, y: 239 });
        assert_eq!(cal.clamp(5000), (3840, true));
        assert_eq!(cal.clamp(100), (100, false));
    }

    #[test]
    fn press_is_sticky_until_cleared() {
        let t = TouchSampler::new(5);
        assert!(!t.pressed());
        assert!(t.on_falling_edge(Timestamp(0)));
        assert!(t.pressed());
        assert!(t.poll_debounce(Timestamp(5)));
        assert!(t.pressed());
        t.clear();
        assert!(!t.pressed());
    }

    #[test]
    fn debounce_window_is_fire_once() {
        let t = TouchSampler::new(5);
        assert_eq!(t.state(), TouchState::Idle);
        assert!(t.on_falling_edge(Timestamp(100)));
        assert_eq!(t.state(), TouchState::Debouncing);
        assert_eq!(t.session().debounce_deadline, Some(Timestamp(105)));

        // Bounce inside the window neither resets nor extends it.
        assert!(!t.on_falling_edge(Timestamp(103)));
        assert_eq!(t.session().debounce_deadline, Some(Timestamp(105)));

        assert!(!t.poll_debounce(Timestamp(104)));
        assert!(t.poll_debounce(Timestamp(105)));
        assert!(!t.poll_debounce(Timestamp(106)));
        assert_eq!(t.state(), TouchState::Idle);

        assert!(t.on_falling_edge(Timestamp(107)));
        assert_eq!(t.session().debounce_deadline, Some(Timestamp(112)));
    }

    #[test]
    fn sampling_does_not_move_the_debounce_state() {
        let t = TouchSampler::new(5);
        let mut panel = FakePanel {
            samples: RawTouchSamples {
                x: [1920; 3],
                y: [1920; 3],
            },
            fail: false,
        };

        t.sample_coordinate(&mut panel, &calibration(), Reduction::BestPair)
            .unwrap();
        assert_eq!(t.state(), TouchState::Idle);

        t.on_falling_edge(Timestamp(10));
        t.sample_coordinate(&mut panel, &calibration(), Reduction::Mean)
            .unwrap();
        assert_eq!(t.state(), TouchState::Debouncing);
        assert_eq!(t.session().debounce_deadline, Some(Timestamp(15)));
        assert!(t.pressed());
    }

    #[test]
    fn clear_leaves_debounce_alone() {
        let t = TouchSampler::new(5);
        t.on_falling_edge(Timestamp(0));
        t.clear();
        assert_eq!(t.state(), TouchState::Debouncing);
        assert!(!t.on_falling_edge(Timestamp(1)));
        assert!(!t.pressed());
    }

    #[test]
    fn sample_with_best_pair() {
        let t = TouchSampler::new(5);
        let mut panel = FakePanel {
            samples: RawTouchSamples {
                x: [1920, 1924, 3000],
                y: [100, 1920, 1918],
            },
            fail: false,
        };
        let reading = t
            .sample_coordinate(&mut panel, &calibration(), Reduction::BestPair)
            .unwrap();
        // x: (1920+1924)/2 = 1922 -> (3840-1922)/12 = 159; y: 1919 -> 120
        assert_eq!(reading.coordinate, Coordinate { x: 159, y: 120 });
        assert!(!reading.clamped);
        assert_eq!(t.last_coordinate(), reading.coordinate);
    }

    #[test]
    fn sample_with_mean() {
        let t = TouchSampler::new(5);
        let mut panel = FakePanel {
            samples: RawTouchSamples {
                x: [1800, 1920, 2040],
                y: [1900, 1920, 1940],
            },
            fail: false,
        };
        let reading = t
            .sample_coordinate(&mut panel, &calibration(), Reduction::Mean)
            .unwrap();
        assert_eq!(reading.coordinate, Coordinate { x: 160, y: 120 });
    }

    #[test]
    fn out_of_range_samples_are_clamped_for_both_reductions() {
        for reduction in [Reduction::BestPair, Reduction::Mean] {
            let t = TouchSampler::new(5);
            let mut panel = FakePanel {
                samples: RawTouchSamples {
                    x: [4095, 4095, 4095],
                    y: [9000, 9000, 9000],
                },
                fail: false,
            };
            let reading = t.sample_coordinate(&mut panel, &calibration(), reduction).unwrap();
            assert_eq!(reading.coordinate, Coordinate { x: 0, y: 0 });
            assert!(reading.clamped);
        }
    }

    #[test]
    fn failed_read_keeps_last_coordinate() {
        let t = TouchSampler::new(5);
        let mut panel = FakePanel {
            samples: RawTouchSamples {
                x: [1920; 3],
                y: [1920; 3],
            },
            fail: false,
        };
        t.sample_coordinate(&mut panel, &calibration(), Reduction::Mean).unwrap();
        panel.fail = true;
        assert!(t.sample_coordinate(&mut panel, &calibration(), Reduction::Mean).is_err());
        assert_eq!(t.last_coordinate(), Coordinate { x: 160, y: 120 });
    }
}
