use embedded_hal::i2c::I2c;

/// EEPROM on the RTC breakout.
pub const AT24_ADDR: u8 = 0x50;
pub const PAGE_SIZE: usize = 32;

/// Acknowledge polls after a write before giving up (~10 ms write cycle).
const WRITE_POLL_ATTEMPTS: usize = 500;

/// AT24C32-style I2C EEPROM with 12-bit memory addresses.
pub struct At24 {
    address: u8,
}

impl Default for At24 {
    fn default() -> Self {
        Self::new()
    }
}

impl At24 {
    pub fn new() -> Self {
        Self { address: AT24_ADDR }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read<I: I2c>(&mut self, i2c: &mut I, mem_addr: u16, buf: &mut [u8]) -> Result<(), I::Error> {
        i2c.write_read(self.address, &mem_addr.to_be_bytes(), buf)
    }

    /// Write `data` starting at `mem_addr`, one page at a time, waiting out
    /// the internal write cycle after each page.
    ///
    /// The device wraps inside a page, so a write is split wherever it
    /// crosses a page boundary.
    pub fn write<I: I2c>(&mut self, i2c: &mut I, mem_addr: u16, data: &[u8]) -> Result<(), I::Error> {
        let mut addr = mem_addr;
        let mut rest = data;
        while !rest.is_empty() {
            let room = PAGE_SIZE - addr as usize % PAGE_SIZE;
            let (chunk, tail) = rest.split_at(room.min(rest.len()));
            self.write_page(i2c, addr, chunk)?;
            addr = addr.wrapping_add(chunk.len() as u16);
            rest = tail;
        }
        Ok(())
    }

    /// `chunk` must not cross a page boundary.
    fn write_page<I: I2c>(&mut self, i2c: &mut I, mem_addr: u16, chunk: &[u8]) -> Result<(), I::Error> {
        let mut frame = [0u8; 2 + PAGE_SIZE];
        frame[..2].copy_from_slice(&mem_addr.to_be_bytes());
        frame[2..2 + chunk.len()].copy_from_slice(chunk);

        i2c.write(self.address, &frame[..2 + chunk.len()])?;
        self.wait_ready(i2c, mem_addr)
    }

    /// The device NAKs its address until the write cycle completes.
    fn wait_ready<I: I2c>(&mut self, i2c: &mut I, mem_addr: u16) -> Result<(), I::Error> {
        let addr = mem_addr.to_be_bytes();
        let mut attempt = 1;
        loop {
            match i2c.write(self.address, &addr) {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= WRITE_POLL_ATTEMPTS => return Err(e),
                Err(_) => attempt += 1,
            }
        }
    }

    pub fn read_u32<I: I2c>(&mut self, i2c: &mut I, mem_addr: u16) -> Result<u32, I::Error> {
        let mut buf = [0u8; 4];
        self.read(i2c, mem_addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn write_u32<I: I2c>(&mut self, i2c: &mut I, mem_addr: u16, value: u32) -> Result<(), I::Error> {
        self.write(i2c, mem_addr, &value.to_le_bytes())
    }
}
