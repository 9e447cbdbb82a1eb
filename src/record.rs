//! Lifetime trip record kept in the RTC module EEPROM.

use embedded_hal::i2c::I2c;

use crate::config::{RECORD_AVG_SPEED_OFFSET, RECORD_DISTANCE_OFFSET};
use crate::drivers::at24::At24;

/// Blank cells read back as all ones.
const ERASED_WORD: u32 = u32::MAX;

/// Lifetime totals: metres and a damped average speed in km/h.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PersistedRecord {
    pub total_distance_m: u32,
    pub avg_speed_kmh: u32,
}

impl PersistedRecord {
    /// Fold one finished trip into the record.
    ///
    /// Distance accumulates; the average is the plain mean of the stored and
    /// the new value, so older trips decay by half with every merge.
    pub fn merged(self, trip_distance_m: u32, trip_avg_kmh: u32) -> Self {
        Self {
            total_distance_m: self.total_distance_m.saturating_add(trip_distance_m),
            avg_speed_kmh: ((self.avg_speed_kmh as u64 + trip_avg_kmh as u64) / 2) as u32,
        }
    }
}

/// Read-merge-write access to the two record slots.
pub struct TripRecordStore {
    eeprom: At24,
    distance_offset: u16,
    avg_speed_offset: u16,
}

impl Default for TripRecordStore {
    fn default() -> Self {
        Self::new(At24::new())
    }
}

impl TripRecordStore {
    pub fn new(eeprom: At24) -> Self {
        Self {
            eeprom,
            distance_offset: RECORD_DISTANCE_OFFSET,
            avg_speed_offset: RECORD_AVG_SPEED_OFFSET,
        }
    }

    pub fn load<I: I2c>(&mut self, i2c: &mut I) -> Result<PersistedRecord, I::Error> {
        let distance = self.eeprom.read_u32(i2c, self.distance_offset)?;
        let speed = self.eeprom.read_u32(i2c, self.avg_speed_offset)?;
        Ok(PersistedRecord {
            total_distance_m: unerased(distance),
            avg_speed_kmh: unerased(speed),
        })
    }

    pub fn store<I: I2c>(&mut self, i2c: &mut I, record: &PersistedRecord) -> Result<(), I::Error> {
        self.eeprom
            .write_u32(i2c, self.distance_offset, record.total_distance_m)?;
        self.eeprom
            .write_u32(i2c, self.avg_speed_offset, record.avg_speed_kmh)
    }

    /// Load, fold in the trip and write back. Returns the merged record.
    pub fn merge<I: I2c>(
        &mut self,
        i2c: &mut I,
        trip_distance_m: u32,
        trip_avg_kmh: u32,
    ) -> Result<PersistedRecord, I::Error> {
        let stored = self.load(i2c)?;
        let merged = stored.merged(trip_distance_m, trip_avg_kmh);
        self.store(i2c, &merged)?;
        info!(
            "record: {} m @ {} km/h -> {} m @ {} km/h",
            stored.total_distance_m,
            stored.avg_speed_kmh,
            merged.total_distance_m,
            merged.avg_speed_kmh
        );
        Ok(merged)
    }
}

fn unerased(word: u32) -> u32 {
    if word == ERASED_WORD {
        0
    } else {
        word
    }
}
