//! Validation schema: which attributes a config document must carry, how
//! each one is tested, and the sets of values the set-membership tests use.
//!
//! ## File format
//!
//! Seven comma-separated lines; anything after the seventh line is ignored
//! (the shipped file keeps its commentary there).
//!
//! | Line | Content                                           |
//! |------|---------------------------------------------------|
//! | 1    | required attribute names, in order                |
//! | 2    | test kind for each name (parallel to line 1)      |
//! | 3    | valid pins for `PIN`                              |
//! | 4    | `;`-separated groups of valid pins for `SDA`      |
//! | 5    | `;`-separated groups of valid pins for `SCL`      |
//! | 6    | valid bus ids for `I2C`                           |
//! | 7    | valid output channel ids for `SM`                 |

use core::fmt;
use core::str::FromStr;
use std::path::Path;

use crate::error::{ConfigError, Error, StorageError};

/// Number of meaningful lines in a schema file.
const SCHEMA_LINES: usize = 7;

// ---------------------------------------------------------------------------
// Test kinds
// ---------------------------------------------------------------------------

/// How a single attribute value is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    /// TCP port, 0..=65535.
    Port,
    /// Member of the valid pin set.
    Pin,
    /// Milliseconds, 1..=60000.
    Time,
    /// Member of any SDA group.
    Sda,
    /// Member of any SCL group.
    Scl,
    /// Member of the valid I2C bus ids.
    I2c,
    /// Member of the valid output channel ids.
    Sm,
    /// Non-negative integer.
    Int,
    /// `0` or `1`.
    Toggle,
    /// `;`-separated `start-end` pixel ranges.
    Leds,
}

impl TestKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Port => "PORT",
            Self::Pin => "PIN",
            Self::Time => "TIME",
            Self::Sda => "SDA",
            Self::Scl => "SCL",
            Self::I2c => "I2C",
            Self::Sm => "SM",
            Self::Int => "INT",
            Self::Toggle => "TOGGLE",
            Self::Leds => "LEDS",
        }
    }

    /// Whether two attributes of this kind may not share a value.
    /// Delays and pixel ranges legitimately repeat.
    pub const fn rejects_duplicates(self) -> bool {
        !matches!(self, Self::Time | Self::Leds)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "PORT" => Self::Port,
            "PIN" => Self::Pin,
            "TIME" => Self::Time,
            "SDA" => Self::Sda,
            "SCL" => Self::Scl,
            "I2C" => Self::I2c,
            "SM" => Self::Sm,
            "INT" => Self::Int,
            "TOGGLE" => Self::Toggle,
            "LEDS" => Self::Leds,
            other => return Err(ConfigError::Schema(format!("unknown test kind '{other}'"))),
        })
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Immutable validation schema, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigSchema {
    required: Vec<(String, TestKind)>,
    valid_pins: Vec<u32>,
    sda_groups: Vec<Vec<u32>>,
    scl_groups: Vec<Vec<u32>>,
    i2c_ids: Vec<u32>,
    sm_ids: Vec<u32>,
}

impl ConfigSchema {
    /// Build a schema from explicit parts. Set-membership lists start empty;
    /// fill them with the `with_*` methods.
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = (S, TestKind)>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(|(n, k)| (n.into(), k)).collect(),
            ..Self::default()
        }
    }

    pub fn with_pins(mut self, pins: &[u32]) -> Self {
        self.valid_pins = pins.to_vec();
        self
    }

    pub fn with_sda_groups(mut self, groups: &[&[u32]]) -> Self {
        self.sda_groups = groups.iter().map(|g| g.to_vec()).collect();
        self
    }

    pub fn with_scl_groups(mut self, groups: &[&[u32]]) -> Self {
        self.scl_groups = groups.iter().map(|g| g.to_vec()).collect();
        self
    }

    pub fn with_i2c_ids(mut self, ids: &[u32]) -> Self {
        self.i2c_ids = ids.to_vec();
        self
    }

    pub fn with_sm_ids(mut self, ids: &[u32]) -> Self {
        self.sm_ids = ids.to_vec();
        self
    }

    /// Parse the seven-line schema text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let lines: Vec<&str> = text.lines().map(str::trim).take(SCHEMA_LINES).collect();
        if lines.len() < SCHEMA_LINES {
            return Err(ConfigError::Schema(format!(
                "expected {SCHEMA_LINES} lines, found {}",
                lines.len()
            )));
        }

        let names: Vec<&str> = lines[0].split(',').map(str::trim).collect();
        let kinds = lines[1]
            .split(',')
            .map(TestKind::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if names.len() != kinds.len() {
            return Err(ConfigError::Schema(format!(
                "{} names but {} test kinds",
                names.len(),
                kinds.len()
            )));
        }
        if names.iter().any(|n| n.is_empty()) {
            return Err(ConfigError::Schema("empty attribute name".into()));
        }

        Ok(Self {
            required: names.into_iter().map(String::from).zip(kinds).collect(),
            valid_pins: parse_numbers(lines[2])?,
            sda_groups: parse_groups(lines[3])?,
            scl_groups: parse_groups(lines[4])?,
            i2c_ids: parse_numbers(lines[5])?,
            sm_ids: parse_numbers(lines[6])?,
        })
    }

    /// Read and parse a schema file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::ReadFailed,
        })?;
        Ok(Self::parse(&text)?)
    }

    /// Required attributes in schema order.
    pub fn required(&self) -> impl Iterator<Item = (&str, TestKind)> {
        self.required.iter().map(|(n, k)| (n.as_str(), *k))
    }

    /// Test kind for `name`, or `None` if the attribute is unknown.
    pub fn kind_of(&self, name: &str) -> Option<TestKind> {
        self.required
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, k)| *k)
    }

    pub fn valid_pins(&self) -> &[u32] {
        &self.valid_pins
    }

    pub fn is_sda(&self, v: u32) -> bool {
        self.sda_groups.iter().any(|g| g.contains(&v))
    }

    pub fn is_scl(&self, v: u32) -> bool {
        self.scl_groups.iter().any(|g| g.contains(&v))
    }

    pub fn i2c_ids(&self) -> &[u32] {
        &self.i2c_ids
    }

    pub fn sm_ids(&self) -> &[u32] {
        &self.sm_ids
    }
}

fn parse_numbers(line: &str) -> Result<Vec<u32>, ConfigError> {
    line.split(',')
        .map(|v| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::Schema(format!("'{}' is not a number", v.trim())))
        })
        .collect()
}

fn parse_groups(line: &str) -> Result<Vec<Vec<u32>>, ConfigError> {
    line.split(';').map(parse_numbers).collect()
}
