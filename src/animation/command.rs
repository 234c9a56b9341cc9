//! LED animation commands.
//!
//! A command is built once by event or menu code, moved into the queue and
//! executed later by the animation worker.  Its fields are private, so it
//! cannot change after it has been enqueued.

use log::warn;

use crate::drivers::led_patterns::{OFF, Rgb};

/// Maximum number of pixel ranges a single command can target.
pub const MAX_RANGES: usize = 8;

/// Inclusive `(start, end)` pixel ranges.
pub type PixelRanges = heapless::Vec<(u16, u16), MAX_RANGES>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedKind {
    /// On/off at 1 Hz for the duration.
    Blink,
    /// Set and hold for the duration (0 = set and return).
    Solid,
    /// Ramp the whole strip up and back down.
    Fade,
    /// All pixels off.
    Clear,
    /// Three green/red cycles, each phase lasting the duration.
    Score,
    /// Red for two thirds of the duration, green for the rest.
    Timeout,
    /// Single-pixel chase out and back, duration per step.
    Test,
    /// Rotating rainbow gradient.
    RainbowChase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedCommand {
    kind: LedKind,
    ranges: PixelRanges,
    duration_ms: u32,
    color: Rgb,
}

impl LedCommand {
    /// Ranges beyond [`MAX_RANGES`] are dropped with a warning.
    pub fn new(kind: LedKind, ranges: &[(u16, u16)], duration_ms: u32, color: Rgb) -> Self {
        if ranges.len() > MAX_RANGES {
            warn!("queue: {:?} targets {} ranges, keeping {}", kind, ranges.len(), MAX_RANGES);
        }
        Self {
            kind,
            ranges: ranges.iter().copied().take(MAX_RANGES).collect(),
            duration_ms,
            color,
        }
    }

    pub fn clear() -> Self {
        Self::new(LedKind::Clear, &[], 0, OFF)
    }

    pub fn solid(ranges: &[(u16, u16)], color: Rgb) -> Self {
        Self::new(LedKind::Solid, ranges, 0, color)
    }

    pub fn kind(&self) -> LedKind {
        self.kind
    }

    pub fn ranges(&self) -> &[(u16, u16)] {
        &self.ranges
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}
