use embedded_hal::i2c::I2c;

use crate::state::{RawImuSample, Vec3};

pub const MPU6050_ADDR: u8 = 0x68;

const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_GYRO_XOUT_H: u8 = 0x43;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;

/// MPU6050 on a shared I2C bus. The bus is borrowed per transaction so the
/// caller decides the order of every transfer on it.
pub struct Mpu6050 {
    address: u8,
}

impl Default for Mpu6050 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mpu6050 {
    pub fn new() -> Self {
        Self {
            address: MPU6050_ADDR,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Leave sleep mode; default ranges (±2 g, ±250 °/s) stay in place.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), I::Error> {
        i2c.write(self.address, &[REG_PWR_MGMT_1, 0x00])
    }

    pub fn read_who_am_i<I: I2c>(&mut self, i2c: &mut I) -> Result<u8, I::Error> {
        let mut id = [0u8; 1];
        i2c.write_read(self.address, &[REG_WHO_AM_I], &mut id)?;
        Ok(id[0])
    }

    fn read_vec3<I: I2c>(&mut self, i2c: &mut I, reg: u8) -> Result<Vec3<i16>, I::Error> {
        let mut rx = [0u8; 6];
        i2c.write_read(self.address, &[reg], &mut rx)?;
        Ok(Vec3::new(
            i16::from_be_bytes([rx[0], rx[1]]),
            i16::from_be_bytes([rx[2], rx[3]]),
            i16::from_be_bytes([rx[4], rx[5]]),
        ))
    }

    pub fn read_accel<I: I2c>(&mut self, i2c: &mut I) -> Result<Vec3<i16>, I::Error> {
        self.read_vec3(i2c, REG_ACCEL_XOUT_H)
    }

    pub fn read_gyro<I: I2c>(&mut self, i2c: &mut I) -> Result<Vec3<i16>, I::Error> {
        self.read_vec3(i2c, REG_GYRO_XOUT_H)
    }

    pub fn read_sample<I: I2c>(&mut self, i2c: &mut I) -> Result<RawImuSample, I::Error> {
        Ok(RawImuSample {
            accel: self.read_accel(i2c)?,
            gyro: self.read_gyro(i2c)?,
        })
    }
}
