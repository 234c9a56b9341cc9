//! Fixed board assignments.
//!
//! Everything wired per installation (sensor, button and team LED pins,
//! the I2C bus pins, the LED strip) comes from the configuration file.
//! This module holds only what is the same on every board.

// ---------------------------------------------------------------------------
// Timeout indicator
// ---------------------------------------------------------------------------

/// On-board LED, lit while a timeout is in progress.
pub const TIMEOUT_LED_GPIO: u8 = 2;

// ---------------------------------------------------------------------------
// Character display (HD44780 behind a PCF8574 I2C backpack)
// ---------------------------------------------------------------------------

pub const LCD_I2C_ADDR: u8 = 0x27;
pub const LCD_ROWS: u8 = 4;
pub const LCD_COLUMNS: u8 = 20;
/// I2C bus clock for the display.
pub const LCD_I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Files on the flash filesystem
// ---------------------------------------------------------------------------

pub const SCHEMA_FILE: &str = "/spiffs/schema.txt";
pub const CONFIG_FILE: &str = "/spiffs/scoreboard.cfg";
