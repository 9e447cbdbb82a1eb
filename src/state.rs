//! Value types handed between interrupt context, the controller and the drivers.
//!
//! All types are `Copy`: crossing a context boundary always means taking a
//! snapshot, never sharing a reference.

// ── Sensor samples ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vec3<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

/// One accelerometer + gyroscope read, raw counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawImuSample {
    pub accel: Vec3<i16>,
    pub gyro: Vec3<i16>,
}

// ── Screen geometry ───────────────────────────────────────────────────────────

/// Display-pixel coordinate of a touch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coordinate {
    pub x: u16,
    pub y: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    /// Half-open on the far edges.
    pub fn contains(&self, p: Coordinate) -> bool {
        p.x >= self.x
            && p.y >= self.y
            && (p.x as u32) < self.x as u32 + self.w as u32
            && (p.y as u32) < self.y as u32 + self.h as u32
    }
}
