pub mod at24;
pub mod mpu6050;
pub mod xpt2046;
