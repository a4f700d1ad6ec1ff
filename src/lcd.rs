//! HD44780 16x2 character LCD on a 4-bit parallel bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{Error, Result};
use crate::peripherals::CharDisplay;

const FUNCTION_SET_4BIT_2LINE: u8 = 0x28;
const DISPLAY_ON: u8 = 0x0C;
const CLEAR: u8 = 0x01;
const ENTRY_MODE_INCREMENT: u8 = 0x06;
const SET_DDRAM_ADDR: u8 = 0x80;

// Settling times from the controller datasheet
const COMMAND_US: u32 = 39;
const DATA_US: u32 = 43;
const CLEAR_US: u32 = 1530;
const POWER_ON_MS: u32 = 40;

pub const LINE_ONE: u8 = 0x00;
pub const LINE_TWO: u8 = 0x40;
pub const COLUMNS: usize = 16;

pub struct Hd44780<P, D> {
    rs: P,
    en: P,
    /// D4..D7, lowest bit first.
    data: [P; 4],
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    pub fn new(rs: P, en: P, data: [P; 4], delay: D) -> Self {
        Self { rs, en, data, delay }
    }

    /// Forces the controller into 4-bit mode and clears the screen.
    pub fn init(&mut self) -> Result<()> {
        self.delay.delay_ms(POWER_ON_MS);
        self.rs.set_low().map_err(|_| Error::Pin)?;

        // Three 8-bit function sets resynchronise the nibble phase
        for wait_us in [4100, 100, COMMAND_US] {
            self.write_nibble(0x3)?;
            self.delay.delay_us(wait_us);
        }
        self.write_nibble(0x2)?;
        self.delay.delay_us(COMMAND_US);

        self.command(FUNCTION_SET_4BIT_2LINE, COMMAND_US)?;
        self.command(DISPLAY_ON, COMMAND_US)?;
        self.command(CLEAR, CLEAR_US)?;
        self.command(ENTRY_MODE_INCREMENT, COMMAND_US)
    }

    fn command(&mut self, byte: u8, settle_us: u32) -> Result<()> {
        self.rs.set_low().map_err(|_| Error::Pin)?;
        self.write_byte(byte)?;
        self.delay.delay_us(settle_us);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_nibble(byte >> 4)?;
        self.write_nibble(byte & 0x0F)
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<()> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high().map_err(|_| Error::Pin)?;
            } else {
                pin.set_low().map_err(|_| Error::Pin)?;
            }
        }
        self.en.set_high().map_err(|_| Error::Pin)?;
        self.delay.delay_us(1);
        self.en.set_low().map_err(|_| Error::Pin)?;
        Ok(())
    }
}

impl<P: OutputPin, D: DelayNs> CharDisplay for Hd44780<P, D> {
    fn write_string(&mut self, address: u8, text: &[u8]) -> Result<()> {
        self.command(SET_DDRAM_ADDR | address, COMMAND_US)?;
        self.rs.set_high().map_err(|_| Error::Pin)?;
        for &byte in text {
            self.write_byte(byte)?;
            self.delay.delay_us(DATA_US);
        }
        Ok(())
    }
}
