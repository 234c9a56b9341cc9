//! Character LCD adapter.
//!
//! Implements [`DisplayPort`] for an HD44780 panel behind a PCF8574 I2C
//! backpack, driven in 4-bit mode.  Generic over `embedded_hal` I2C and
//! delay traits, so the byte stream can be checked on the host with a
//! recording bus.
//!
//! Backpack bit layout:
//! ```text
//!  P7 P6 P5 P4 | P3        P2  P1  P0
//!  D7 D6 D5 D4 | backlight EN  RW  RS
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info};

use crate::app::ports::DisplayPort;
use crate::error::Error;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_DISPLAY_OFF: u8 = 0x08;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each row on a 4-line panel.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub struct I2cLcd<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    rows: u8,
    columns: u8,
    backlight: bool,
    /// Failed bus writes since construction.
    errors: u32,
}

impl<I: I2c, D: DelayNs> I2cLcd<I, D> {
    /// Reset the controller into 4-bit mode and clear the panel.
    pub fn new(i2c: I, delay: D, address: u8, rows: u8, columns: u8) -> Result<Self, Error> {
        let mut lcd = Self {
            i2c,
            delay,
            address,
            rows,
            columns,
            backlight: true,
            errors: 0,
        };
        lcd.delay.delay_ms(50);
        lcd.expander_write(0).map_err(|_| Error::Init("lcd"))?;
        // Three 8-bit "function set" nibbles, then switch to 4-bit.
        for wait_us in [4500, 150, 150] {
            lcd.write_nibble(0x30, 0).map_err(|_| Error::Init("lcd"))?;
            lcd.delay.delay_us(wait_us);
        }
        lcd.write_nibble(0x20, 0).map_err(|_| Error::Init("lcd"))?;
        for cmd in [CMD_FUNCTION_4BIT_2LINE, CMD_DISPLAY_ON, CMD_CLEAR, CMD_ENTRY_INCREMENT] {
            lcd.command(cmd).map_err(|_| Error::Init("lcd"))?;
        }
        lcd.delay.delay_ms(2);
        info!("lcd: {}x{} panel at 0x{:02x}", columns, rows, address);
        Ok(lcd)
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn expander_write(&mut self, bits: u8) -> Result<(), I::Error> {
        let light = if self.backlight { BACKLIGHT } else { 0 };
        self.i2c.write(self.address, &[bits | light])
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), I::Error> {
        let bits = (nibble & 0xF0) | mode;
        self.expander_write(bits | EN)?;
        self.delay.delay_us(1);
        self.expander_write(bits)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn send(&mut self, byte: u8, mode: u8) -> Result<(), I::Error> {
        self.write_nibble(byte & 0xF0, mode)?;
        self.write_nibble(byte << 4, mode)
    }

    fn command(&mut self, cmd: u8) -> Result<(), I::Error> {
        self.send(cmd, 0)?;
        if cmd == CMD_CLEAR {
            self.delay.delay_ms(2);
        }
        Ok(())
    }

    fn checked(&mut self, result: Result<(), I::Error>) {
        if let Err(e) = result {
            self.errors += 1;
            debug!("lcd: bus write failed: {:?}", e);
        }
    }
}

impl<I: I2c, D: DelayNs> DisplayPort for I2cLcd<I, D> {
    fn columns(&self) -> usize {
        usize::from(self.columns)
    }

    fn clear(&mut self) {
        let r = self.command(CMD_CLEAR);
        self.checked(r);
    }

    fn move_to(&mut self, col: u8, row: u8) {
        let row = row.min(self.rows.saturating_sub(1));
        let col = col.min(self.columns.saturating_sub(1));
        let addr = ROW_OFFSETS[usize::from(row) % ROW_OFFSETS.len()] + col;
        let r = self.command(CMD_SET_DDRAM | addr);
        self.checked(r);
    }

    fn put_str(&mut self, text: &str) {
        for ch in text.chars() {
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            let r = self.send(byte, RS);
            self.checked(r);
        }
    }

    fn power_off(&mut self) {
        let r = self.command(CMD_CLEAR);
        self.checked(r);
        let r = self.command(CMD_DISPLAY_OFF);
        self.checked(r);
        self.backlight = false;
        let r = self.expander_write(0);
        self.checked(r);
    }
}
