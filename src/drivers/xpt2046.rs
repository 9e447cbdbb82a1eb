use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::touch::{RawTouchSamples, TouchPanel, SAMPLES_PER_AXIS};

/// Start bit, differential reference, 12-bit conversion.
pub const CMD_READ_X: u8 = 0xD0;
pub const CMD_READ_Y: u8 = 0x90;
/// Power down between conversions, PENIRQ enabled.
pub const CMD_POWER_DOWN: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<S, P> {
    Spi(S),
    Pin(P),
}

/// XPT2046 resistive touch controller.
pub struct Xpt2046<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Xpt2046<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// One half-duplex exchange: command byte out, 12-bit result in.
    fn exchange(&mut self, cmd: u8) -> Result<u16, Error<SPI::Error, CS::Error>> {
        let mut rx = [0u8; 2];

        self.cs.set_low().map_err(Error::Pin)?;
        let res = self
            .spi
            .write(&[cmd])
            .and_then(|_| self.spi.read(&mut rx))
            .and_then(|_| self.spi.flush());
        self.cs.set_high().map_err(Error::Pin)?;

        res.map_err(Error::Spi)?;
        Ok(u16::from_be_bytes(rx) >> 3)
    }

    pub fn read_x(&mut self) -> Result<u16, Error<SPI::Error, CS::Error>> {
        self.exchange(CMD_READ_X)
    }

    pub fn read_y(&mut self) -> Result<u16, Error<SPI::Error, CS::Error>> {
        self.exchange(CMD_READ_Y)
    }

    pub fn power_down(&mut self) -> Result<(), Error<SPI::Error, CS::Error>> {
        self.exchange(CMD_POWER_DOWN).map(|_| ())
    }

    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> TouchPanel for Xpt2046<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    type Error = Error<SPI::Error, CS::Error>;

    /// Interleaved X/Y conversions, then back to power-down so the pen
    /// interrupt can fire again.
    fn read_samples(&mut self) -> Result<RawTouchSamples, Self::Error> {
        let mut samples = RawTouchSamples::default();
        for i in 0..SAMPLES_PER_AXIS {
            samples.x[i] = self.read_x()?;
            samples.y[i] = self.read_y()?;
        }
        self.power_down()?;
        Ok(samples)
    }
}
