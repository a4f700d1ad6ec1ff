//! SSD1306 128x64 OLED over I2C, driven from an in-memory framebuffer.

use embedded_hal::i2c::{I2c, Operation};

use crate::config::{BUS_ATTEMPTS, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::error::{Error, Result};

pub const SSD1306_ADDRESS: u8 = 0x3C;

pub const BYTE_COUNT: usize = SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize / 8;

// Control byte: Co (bit 7) clear means more bytes follow, D/C# (bit 6) selects data.
pub const CONTROL_COMMAND_STREAM: u8 = 0x00;
pub const CONTROL_DATA_STREAM: u8 = 0x40;

pub mod command {
    pub const SET_CONTRAST: u8 = 0x81;
    pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const MEMORY_ADDR_MODE: u8 = 0x20;
    pub const SET_COLUMN_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEGMENT_REMAP: u8 = 0xA0;
    pub const SET_MULTIPLEX_RATIO: u8 = 0xA8;
    pub const COM_SCAN_DIR_DEC: u8 = 0xC8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const CHARGE_PUMP: u8 = 0x8D;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_VCOM_DESELECT: u8 = 0xDB;
}

use command::*;

#[rustfmt::skip]
static INIT_COMMANDS: [u8; 25] = [
    DISPLAY_OFF,
    SET_CLOCK_DIV, 0x80,
    SET_MULTIPLEX_RATIO, 0x3F,
    SET_DISPLAY_OFFSET, 0x00,
    SET_START_LINE,
    CHARGE_PUMP, 0x14,
    MEMORY_ADDR_MODE, 0x00, // horizontal
    SET_SEGMENT_REMAP | 0x1,
    COM_SCAN_DIR_DEC,
    SET_COM_PINS, 0x12,
    SET_CONTRAST, 0xCF,
    SET_PRECHARGE, 0xF1,
    SET_VCOM_DESELECT, 0x40,
    DISPLAY_ALL_ON_RESUME,
    NORMAL_DISPLAY,
    DISPLAY_ON,
];

static COLUMN_RANGE: [u8; 4] = [CONTROL_COMMAND_STREAM, SET_COLUMN_ADDR, 0, SCREEN_WIDTH - 1];
static PAGE_RANGE: [u8; 4] = [CONTROL_COMMAND_STREAM, SET_PAGE_ADDR, 0, SCREEN_HEIGHT / 8 - 1];

/// 1 bit per pixel, laid out in the controller's page order: each byte is a
/// vertical strip of 8 pixels, bit 0 on top.
pub struct Framebuffer {
    pixels: [u8; BYTE_COUNT],
}

impl Framebuffer {
    pub const fn new() -> Self {
        Self {
            pixels: [0; BYTE_COUNT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn set_pixel(&mut self, x: u8, y: u8) {
        if let Some((byte_index, mask)) = locate(x, y) {
            self.pixels[byte_index] |= mask;
        }
    }

    pub fn clear_pixel(&mut self, x: u8, y: u8) {
        if let Some((byte_index, mask)) = locate(x, y) {
            self.pixels[byte_index] &= !mask;
        }
    }

    /// Sets a pixel given signed coordinates; anything off screen is dropped.
    pub fn plot(&mut self, x: i16, y: i16) {
        if let (Ok(x), Ok(y)) = (u8::try_from(x), u8::try_from(y)) {
            self.set_pixel(x, y);
        }
    }

    pub fn is_set(&self, x: u8, y: u8) -> bool {
        locate(x, y).is_some_and(|(byte_index, mask)| self.pixels[byte_index] & mask != 0)
    }

    pub fn as_bytes(&self) -> &[u8; BYTE_COUNT] {
        &self.pixels
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn locate(x: u8, y: u8) -> Option<(usize, u8)> {
    if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
        return None;
    }
    let byte_index = (y as usize / 8) * SCREEN_WIDTH as usize + x as usize;
    Some((byte_index, 1 << (y % 8)))
}

pub struct Ssd1306<I> {
    i2c: I,
    frame: Framebuffer,
}

impl<I: I2c> Ssd1306<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            frame: Framebuffer::new(),
        }
    }

    /// Runs the power-up command list, then blanks the panel.
    pub fn init(&mut self) -> Result<()> {
        for &cmd in INIT_COMMANDS.iter() {
            self.send(&[CONTROL_COMMAND_STREAM, cmd])?;
        }
        self.frame.clear();
        self.flush()
    }

    pub fn frame(&self) -> &Framebuffer {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Framebuffer {
        &mut self.frame
    }

    /// Selects the whole panel and streams the entire framebuffer to it.
    pub fn flush(&mut self) -> Result<()> {
        self.send(&COLUMN_RANGE)?;
        self.send(&PAGE_RANGE)?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut ops = [
                Operation::Write(&[CONTROL_DATA_STREAM]),
                Operation::Write(self.frame.as_bytes()),
            ];
            match self.i2c.transaction(SSD1306_ADDRESS, &mut ops) {
                Ok(()) => return Ok(()),
                Err(_) if attempts < BUS_ATTEMPTS => continue,
                Err(_) => return Err(Error::Bus),
            }
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        for _ in 0..BUS_ATTEMPTS {
            if self.i2c.write(SSD1306_ADDRESS, bytes).is_ok() {
                return Ok(());
            }
        }
        Err(Error::Bus)
    }
}
