#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};
use embedded_hal::spi::{self, SpiBus};

use trip_computer::view::{Color, Renderer};

pub const MPU_ADDR: u8 = 0x68;
pub const EEPROM_ADDR: u8 = 0x50;

// ── I2C: MPU6050 + AT24 on one bus ────────────────────────────────────────────

pub struct ImuModel {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
    pub awake: bool,
    pub fail: bool,
    reg: u8,
}

impl ImuModel {
    fn register(&self, reg: u8) -> u8 {
        let mut image = [0u8; 14];
        for i in 0..3 {
            image[2 * i..2 * i + 2].copy_from_slice(&self.accel[i].to_be_bytes());
            image[8 + 2 * i..8 + 2 * i + 2].copy_from_slice(&self.gyro[i].to_be_bytes());
        }
        match reg {
            0x3B..=0x48 => image[(reg - 0x3B) as usize],
            0x75 => 0x68,
            _ => 0,
        }
    }
}

pub struct EepromModel {
    pub mem: Vec<u8>,
    pub fail: bool,
    /// NAKs left before the current write cycle completes.
    pub busy: u32,
    /// NAKs issued after every data write.
    pub write_cycle_polls: u32,
    pub writes: usize,
    ptr: u16,
}

impl EepromModel {
    pub fn set_u32(&mut self, addr: u16, v: u32) {
        let a = addr as usize;
        self.mem[a..a + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn u32_at(&self, addr: u16) -> u32 {
        let a = addr as usize;
        u32::from_le_bytes([self.mem[a], self.mem[a + 1], self.mem[a + 2], self.mem[a + 3]])
    }
}

pub struct MockI2c {
    pub imu: ImuModel,
    pub eeprom: EepromModel,
    /// Every (address, bytes) write seen on the bus.
    pub writes: Vec<(u8, Vec<u8>)>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self {
            imu: ImuModel {
                accel: [0, 0, 16384],
                gyro: [0, 0, 0],
                awake: false,
                fail: false,
                reg: 0,
            },
            eeprom: EepromModel {
                mem: vec![0xFF; 4096],
                fail: false,
                busy: 0,
                write_cycle_polls: 2,
                writes: 0,
                ptr: 0,
            },
            writes: Vec::new(),
        }
    }

    fn nak() -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }

    fn imu_transaction(&mut self, ops: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if self.imu.fail {
            return Err(Self::nak());
        }
        for op in ops {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((MPU_ADDR, bytes.to_vec()));
                    if let Some((&reg, data)) = bytes.split_first() {
                        self.imu.reg = reg;
                        if reg == 0x6B && data.first() == Some(&0) {
                            self.imu.awake = true;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.imu.register(self.imu.reg);
                        self.imu.reg = self.imu.reg.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }

    fn eeprom_transaction(&mut self, ops: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if self.eeprom.fail {
            return Err(Self::nak());
        }
        if self.eeprom.busy > 0 {
            self.eeprom.busy -= 1;
            return Err(Self::nak());
        }
        let len = self.eeprom.mem.len();
        for op in ops {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((EEPROM_ADDR, bytes.to_vec()));
                    if bytes.len() >= 2 {
                        self.eeprom.ptr = u16::from_be_bytes([bytes[0], bytes[1]]);
                    }
                    if bytes.len() > 2 {
                        for (i, b) in bytes[2..].iter().enumerate() {
                            self.eeprom.mem[(self.eeprom.ptr as usize + i) % len] = *b;
                        }
                        self.eeprom.writes += 1;
                        self.eeprom.busy = self.eeprom.write_cycle_polls;
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.eeprom.mem[self.eeprom.ptr as usize % len];
                        self.eeprom.ptr = self.eeprom.ptr.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl i2c::I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        match address {
            MPU_ADDR => self.imu_transaction(operations),
            EEPROM_ADDR => self.eeprom_transaction(operations),
            _ => Err(Self::nak()),
        }
    }
}

// ── SPI: XPT2046 ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockTouchSpi {
    pub x: VecDeque<u16>,
    pub y: VecDeque<u16>,
    pub commands: Vec<u8>,
    pub fail: bool,
    last_cmd: u8,
}

impl MockTouchSpi {
    /// Queue one three-sample burst per axis.
    pub fn queue(&mut self, x: [u16; 3], y: [u16; 3]) {
        self.x.extend(x);
        self.y.extend(y);
    }
}

impl spi::ErrorType for MockTouchSpi {
    type Error = spi::ErrorKind;
}

impl SpiBus<u8> for MockTouchSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(spi::ErrorKind::Other);
        }
        let value = match self.last_cmd {
            0xD0 => self.x.pop_front().unwrap_or(0),
            0x90 => self.y.pop_front().unwrap_or(0),
            _ => 0,
        };
        let word = (value << 3).to_be_bytes();
        for (i, w) in words.iter_mut().enumerate() {
            *w = word.get(i).copied().unwrap_or(0);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(spi::ErrorKind::Other);
        }
        if let Some(&cmd) = words.first() {
            self.last_cmd = cmd;
            self.commands.push(cmd);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        self.read(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let cmd = words.to_vec();
        self.transfer(words, &cmd)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPin {
    pub low: bool,
    pub selects: usize,
}

impl PinErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.low = true;
        self.selects += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.low = false;
        Ok(())
    }
}

// ── Renderer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingRenderer {
    pub texts: Vec<(u16, u16, String)>,
    pub fills: Vec<Color>,
    pub windows: usize,
}

impl RecordingRenderer {
    /// Latest text drawn at `(x, y)`.
    pub fn text_at(&self, x: u16, y: u16) -> Option<&str> {
        self.texts
            .iter()
            .rev()
            .find(|t| t.0 == x && t.1 == y)
            .map(|t| t.2.as_str())
    }

    pub fn contains(&self, text: &str) -> bool {
        self.texts.iter().any(|t| t.2 == text)
    }

    pub fn clear(&mut self) {
        self.texts.clear();
        self.fills.clear();
        self.windows = 0;
    }
}

impl Renderer for RecordingRenderer {
    fn write_string(&mut self, x: u16, y: u16, text: &str) {
        self.texts.push((x, y, text.to_string()));
    }

    fn set_window(&mut self, _x: u16, _y: u16, _w: u16, _h: u16) {
        self.windows += 1;
    }

    fn fill(&mut self, color: Color) {
        self.fills.push(color);
    }
}
