//! LED strip pattern renderer.
//!
//! Executes one [`LedCommand`] to completion against a [`PixelSink`],
//! pacing itself with an `embedded_hal` delay.  Only the animation worker
//! calls this, so a long pattern never stalls the main loop.
//!
//! ## Pattern timing
//!
//! | Kind          | Steps                                    | Step time         |
//! |---------------|------------------------------------------|-------------------|
//! | Blink         | 2 per second of duration (on, off)       | 500 ms            |
//! | Solid         | set, then hold                           | duration          |
//! | Fade          | 0→255→0 in steps of 5                    | 50 ms             |
//! | Score         | 3 × (green, red), then clear             | duration          |
//! | Timeout       | red, green, clear                        | ⅔ / ⅓ of duration |
//! | Test          | chase up in red, back down in green      | duration          |
//! | RainbowChase  | rotate gradient one pixel                | 42 ms             |

use embedded_hal::delay::DelayNs;

use crate::animation::command::{LedCommand, LedKind};

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

// ── Palette ───────────────────────────────────────────────────

pub const OFF: Rgb = (0, 0, 0);
pub const RED: Rgb = (255, 0, 0);
pub const GREEN: Rgb = (0, 255, 0);
pub const BLUE: Rgb = (0, 0, 255);
pub const YELLOW: Rgb = (255, 255, 0);
pub const ORANGE: Rgb = (255, 50, 0);
pub const INDIGO: Rgb = (100, 0, 90);
pub const VIOLET: Rgb = (200, 0, 100);
pub const SOFT_RED: Rgb = soft(RED);
pub const SOFT_GREEN: Rgb = soft(GREEN);
pub const SOFT_YELLOW: Rgb = soft(YELLOW);

/// Rainbow stops, in strip order.
pub const RAINBOW: [Rgb; 7] = [RED, ORANGE, YELLOW, GREEN, BLUE, INDIGO, VIOLET];

const BLINK_HALF_MS: u32 = 500;
const FADE_STEP_MS: u32 = 50;
const FADE_STEP: usize = 5;
const CHASE_STEP_MS: u32 = 42;
const SCORE_CYCLES: usize = 3;

/// 30 % brightness.
pub const fn soft(c: Rgb) -> Rgb {
    (soft_channel(c.0), soft_channel(c.1), soft_channel(c.2))
}

const fn soft_channel(v: u8) -> u8 {
    (v as u16 * 3 / 10) as u8
}

/// Scale `c` by `level / 255`.
pub fn scale(c: Rgb, level: u8) -> Rgb {
    let s = |v: u8| ((u16::from(v) * u16::from(level)) / 255) as u8;
    (s(c.0), s(c.1), s(c.2))
}

// ── Output seam ───────────────────────────────────────────────

/// An addressable strip's frame buffer.
pub trait PixelSink {
    /// Number of pixels on the strip.
    fn len(&self) -> u16;

    fn set(&mut self, idx: u16, colour: Rgb);

    fn get(&self, idx: u16) -> Rgb;

    /// Push the frame buffer out to the strip.
    fn show(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anything that can execute animation commands.
pub trait LedRenderer {
    fn render(&mut self, cmd: &LedCommand);
}

// ── Renderer ──────────────────────────────────────────────────

pub struct StripRenderer<P, D> {
    strip: P,
    delay: D,
}

impl<P: PixelSink, D: DelayNs> StripRenderer<P, D> {
    pub fn new(strip: P, delay: D) -> Self {
        Self { strip, delay }
    }

    pub fn strip(&self) -> &P {
        &self.strip
    }

    fn fill(&mut self, ranges: &[(u16, u16)], colour: Rgb) {
        let len = self.strip.len();
        for &(start, end) in ranges {
            for i in start..=end.min(len.saturating_sub(1)) {
                self.strip.set(i, colour);
            }
        }
    }

    fn fill_all(&mut self, colour: Rgb) {
        for i in 0..self.strip.len() {
            self.strip.set(i, colour);
        }
    }

    fn clear(&mut self) {
        self.fill_all(OFF);
        self.strip.show();
    }

    fn paint(&mut self, ranges: &[(u16, u16)], colour: Rgb, hold_ms: u32) {
        self.fill(ranges, colour);
        self.strip.show();
        if hold_ms > 0 {
            self.delay.delay_ms(hold_ms);
        }
    }

    fn blink(&mut self, cmd: &LedCommand) {
        let cycles = (cmd.duration_ms() / 1000).max(1) * 2;
        for _ in 0..cycles {
            self.paint(cmd.ranges(), cmd.color(), BLINK_HALF_MS);
            self.clear();
            self.delay.delay_ms(BLINK_HALF_MS);
        }
    }

    fn fade(&mut self, colour: Rgb) {
        let levels = (0..=255u8).step_by(FADE_STEP).chain((0..=255u8).rev().step_by(FADE_STEP));
        for level in levels {
            self.fill_all(scale(colour, level));
            self.strip.show();
            self.delay.delay_ms(FADE_STEP_MS);
        }
        self.clear();
    }

    fn chase(&mut self, step_ms: u32) {
        let len = self.strip.len();
        if len == 0 {
            return;
        }
        for i in 0..len {
            self.strip.set(i, RED);
            self.strip.set(if i == 0 { len - 1 } else { i - 1 }, OFF);
            self.strip.show();
            self.delay.delay_ms(step_ms);
        }
        for i in (0..len).rev() {
            self.strip.set(i, GREEN);
            if i + 1 < len {
                self.strip.set(i + 1, OFF);
            }
            self.strip.show();
            self.delay.delay_ms(step_ms);
        }
        self.clear();
    }

    fn rainbow(&mut self, duration_ms: u32) {
        let len = self.strip.len();
        if len == 0 {
            return;
        }
        for i in 0..len {
            let pos = usize::from(i) * RAINBOW.len() / usize::from(len);
            self.strip.set(i, scale(RAINBOW[pos], 50));
        }
        for _ in 0..(duration_ms / CHASE_STEP_MS) {
            let last = self.strip.get(len - 1);
            for i in (1..len).rev() {
                let prev = self.strip.get(i - 1);
                self.strip.set(i, prev);
            }
            self.strip.set(0, last);
            self.delay.delay_ms(CHASE_STEP_MS);
            self.strip.show();
        }
        self.clear();
    }
}

impl<P: PixelSink, D: DelayNs> LedRenderer for StripRenderer<P, D> {
    fn render(&mut self, cmd: &LedCommand) {
        let ranges = cmd.ranges();
        match cmd.kind() {
            LedKind::Blink => self.blink(cmd),
            LedKind::Solid => self.paint(ranges, cmd.color(), cmd.duration_ms()),
            LedKind::Fade => self.fade(cmd.color()),
            LedKind::Clear => self.clear(),
            LedKind::Score => {
                for _ in 0..SCORE_CYCLES {
                    self.paint(ranges, GREEN, cmd.duration_ms());
                    self.paint(ranges, RED, cmd.duration_ms());
                }
                self.clear();
            }
            LedKind::Timeout => {
                let red_ms = cmd.duration_ms() * 2 / 3;
                self.paint(ranges, RED, red_ms);
                self.paint(ranges, GREEN, cmd.duration_ms() - red_ms);
                self.clear();
            }
            LedKind::Test => self.chase(cmd.duration_ms()),
            LedKind::RainbowChase => self.rainbow(cmd.duration_ms()),
        }
    }
}

// ── Host frame buffer ─────────────────────────────────────────

/// In-memory strip that counts frames; used on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStrip {
    pixels: Vec<Rgb>,
    frames: u32,
}

impl MemoryStrip {
    pub fn new(len: u16) -> Self {
        Self {
            pixels: vec![OFF; usize::from(len)],
            frames: 0,
        }
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Number of `show` calls so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl PixelSink for MemoryStrip {
    fn len(&self) -> u16 {
        self.pixels.len() as u16
    }

    fn set(&mut self, idx: u16, colour: Rgb) {
        if let Some(p) = self.pixels.get_mut(usize::from(idx)) {
            *p = colour;
        }
    }

    fn get(&self, idx: u16) -> Rgb {
        self.pixels.get(usize::from(idx)).copied().unwrap_or(OFF)
    }

    fn show(&mut self) {
        self.frames += 1;
    }
}
