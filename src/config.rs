//! Controller configuration
//!
//! Two layers:
//! - [`ControllerConfig`]: board wiring and timing, converted from a
//!   validated `KEY=VALUE` document (see [`crate::validation`]).
//! - [`GameSettings`]: match rules, adjusted at runtime from the Settings
//!   menu and never persisted.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::events::Team;
use crate::validation::{parse_led_ranges, parse_line};

/// Team each goal sensor reports for, by sensor slot.
/// The third sensor is a second detector on team two's goal.
pub const SENSOR_TEAMS: [Team; 3] = [Team::One, Team::Two, Team::Two];

// --- Edge polarity ---

/// Logic level that means "on" for each input class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLevels {
    /// Break-beam sensors pull low while the beam is interrupted.
    pub sensor_on_high: bool,
    /// Buttons read high while pressed.
    pub button_on_high: bool,
}

impl Default for EdgeLevels {
    fn default() -> Self {
        Self {
            sensor_on_high: false,
            button_on_high: true,
        }
    }
}

// --- Debounce delays ---

/// Settle times (milliseconds) before a channel re-arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceDelays {
    /// After a goal sensor releases.
    pub sensor_ms: u32,
    /// After a timeout button press outside the menu.
    pub timeout_button_ms: u32,
    /// After an action press, and after any press while the menu is open.
    pub action_button_ms: u32,
}

impl Default for DebounceDelays {
    fn default() -> Self {
        Self {
            sensor_ms: 2000,
            timeout_button_ms: 3000,
            action_button_ms: 300,
        }
    }
}

// --- Board configuration ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I2cConfig {
    pub sda: u8,
    pub scl: u8,
    pub bus: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripConfig {
    pub pin: u8,
    pub pixels: u16,
    /// Output channel driving the strip.
    pub channel: u8,
}

/// Typed view of a validated configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub port: u16,
    pub sensor_pins: [u8; 3],
    pub team_led_pins: [u8; 2],
    pub button_pins: [u8; 3],
    pub delays: DebounceDelays,
    pub i2c: I2cConfig,
    pub strip: StripConfig,
    pub team_ranges: [Vec<(u16, u16)>; 2],
    pub debug: bool,
    #[serde(default)]
    pub levels: EdgeLevels,
}

impl ControllerConfig {
    /// Convert document lines into typed fields.
    ///
    /// Expects a document that has already passed validation; any field
    /// that is still missing or unparseable is reported by name.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self, ConfigError> {
        let pairs: Vec<(&str, &str)> = lines
            .iter()
            .filter_map(|l| parse_line(l.as_ref()))
            .collect();
        let doc = Document(&pairs);

        Ok(Self {
            port: doc.number("PORT")?,
            sensor_pins: [doc.number("SENSOR1")?, doc.number("SENSOR2")?, doc.number("SENSOR3")?],
            team_led_pins: [doc.number("LED1")?, doc.number("LED2")?],
            button_pins: [doc.number("PB1")?, doc.number("PB2")?, doc.number("PB3")?],
            delays: DebounceDelays {
                sensor_ms: doc.number("DELAY_SENSOR")?,
                timeout_button_ms: doc.number("DELAY_PB")?,
                action_button_ms: doc.number("DELAY_ACTION_PB")?,
            },
            i2c: I2cConfig {
                sda: doc.number("SDA")?,
                scl: doc.number("SCL")?,
                bus: doc.number("I2C")?,
            },
            strip: StripConfig {
                pin: doc.number("LEDSTRIP")?,
                pixels: doc.number("NUMBER_PIXELS")?,
                channel: doc.number("STATE_MACHINE")?,
            },
            team_ranges: [doc.ranges("TEAM1LEDS")?, doc.ranges("TEAM2LEDS")?],
            debug: doc.number::<u8>("DEBUGMODE")? == 1,
            levels: EdgeLevels::default(),
        })
    }

    /// Pixel ranges lit for `team`.
    pub fn team_ranges(&self, team: Team) -> &[(u16, u16)] {
        &self.team_ranges[team.index()]
    }

    /// Range covering every pixel on the strip.
    pub fn all_pixels(&self) -> (u16, u16) {
        (0, self.strip.pixels.saturating_sub(1))
    }
}

struct Document<'a>(&'a [(&'a str, &'a str)]);

impl Document<'_> {
    fn raw(&self, name: &'static str) -> Result<&str, ConfigError> {
        self.0
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.trim_matches('"'))
            .ok_or(ConfigError::Field(name))
    }

    fn number<T: core::str::FromStr>(&self, name: &'static str) -> Result<T, ConfigError> {
        self.raw(name)?.parse().map_err(|_| ConfigError::Field(name))
    }

    fn ranges(&self, name: &'static str) -> Result<Vec<(u16, u16)>, ConfigError> {
        parse_led_ranges(self.raw(name)?).ok_or(ConfigError::Field(name))
    }
}

// --- Game settings ---

/// Lower bound of every numeric setting.
pub const SETTING_MIN: u8 = 1;
/// Upper bound of every numeric setting.
pub const SETTING_MAX: u8 = 99;

/// Adjustable match rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingId {
    PointsToWin,
    GamesToWin,
    BallsInRack,
    /// Rack mode on, or tourney mode when off.
    RackMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    pub points_to_win: u8,
    pub games_to_win: u8,
    pub balls_in_rack: u8,
    /// `false` means tourney mode.
    pub rack_mode: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            points_to_win: 5,
            games_to_win: 2,
            balls_in_rack: 9,
            rack_mode: true,
        }
    }
}

impl GameSettings {
    /// Step a numeric setting by ±1 within [`SETTING_MIN`, `SETTING_MAX`],
    /// or flip the rack/tourney toggle regardless of direction.
    pub fn step(&mut self, id: SettingId, up: bool) {
        let clamp = |v: u8| {
            if up {
                v.saturating_add(1).min(SETTING_MAX)
            } else {
                v.saturating_sub(1).max(SETTING_MIN)
            }
        };
        match id {
            SettingId::PointsToWin => self.points_to_win = clamp(self.points_to_win),
            SettingId::GamesToWin => self.games_to_win = clamp(self.games_to_win),
            SettingId::BallsInRack => self.balls_in_rack = clamp(self.balls_in_rack),
            SettingId::RackMode => self.rack_mode = !self.rack_mode,
        }
    }

    /// Text shown next to a setting's label.
    pub fn display_value(&self, id: SettingId) -> String {
        match id {
            SettingId::PointsToWin => self.points_to_win.to_string(),
            SettingId::GamesToWin => self.games_to_win.to_string(),
            SettingId::BallsInRack => self.balls_in_rack.to_string(),
            SettingId::RackMode => if self.rack_mode { "On" } else { "Off" }.to_string(),
        }
    }
}
