//! Interrupt-to-main-loop flag set.
//!
//! Edge handlers and timer callbacks only ever *raise* flags here; the
//! main loop *takes* them (atomic swap to `false`) once per iteration.
//! No lock is involved, so raising is safe from interrupt context.
//!
//! ```text
//! ┌──────────────┐  raise_*   ┌──────────────┐  take_*   ┌──────────────┐
//! │ sensor ISR   │──────────▶│              │─────────▶│              │
//! │ button ISR   │──────────▶│  EventFlags  │          │  Main Loop   │
//! │ release tmr  │──────────▶│  (atomics)   │◀─────────│  (consumer)  │
//! └──────────────┘            └──────────────┘  set_*    └──────────────┘
//!                                               (mode hints)
//! ```
//!
//! Mode hints (`menu_open`, `test_inputs`) flow the other way: the main
//! loop publishes them so the handlers can pick the right delay or bypass
//! flag-raising entirely.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use serde::{Deserialize, Serialize};

/// Number of push buttons (two timeout buttons plus the action button).
pub const BUTTON_COUNT: usize = 3;

/// Sentinel stored in the "last id" slots before any edge has been seen.
const NO_ID: u8 = u8::MAX;

// ── Team ──────────────────────────────────────────────────────

/// One side of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::One, Team::Two];

    /// Zero-based index for per-team arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// One-based team number used on the wire and on screen.
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Map a one-based team number back to a `Team`.
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }
}

// ── Flag set ──────────────────────────────────────────────────

/// Lock-free flags shared between edge handlers and the main loop.
pub struct EventFlags {
    score_pending: [AtomicBool; 2],
    timeout_pending: [AtomicBool; 2],
    action_pressed: AtomicBool,
    sensor_blocked: AtomicBool,
    button_blocked: [AtomicBool; BUTTON_COUNT],
    last_sensor_pin: AtomicU8,
    last_button_pin: AtomicU8,
    menu_open: AtomicBool,
    test_inputs: AtomicBool,
}

impl EventFlags {
    pub const fn new() -> Self {
        Self {
            score_pending: [AtomicBool::new(false), AtomicBool::new(false)],
            timeout_pending: [AtomicBool::new(false), AtomicBool::new(false)],
            action_pressed: AtomicBool::new(false),
            sensor_blocked: AtomicBool::new(false),
            button_blocked: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
            last_sensor_pin: AtomicU8::new(NO_ID),
            last_button_pin: AtomicU8::new(NO_ID),
            menu_open: AtomicBool::new(false),
            test_inputs: AtomicBool::new(false),
        }
    }

    // ── Producer side (handler context) ──────────────────────

    pub fn raise_score(&self, team: Team, sensor_pin: u8) {
        self.last_sensor_pin.store(sensor_pin, Ordering::Relaxed);
        self.score_pending[team.index()].store(true, Ordering::Release);
    }

    pub fn raise_timeout(&self, team: Team, button_pin: u8) {
        self.last_button_pin.store(button_pin, Ordering::Relaxed);
        self.timeout_pending[team.index()].store(true, Ordering::Release);
    }

    pub fn raise_action(&self, button_pin: u8) {
        self.last_button_pin.store(button_pin, Ordering::Relaxed);
        self.action_pressed.store(true, Ordering::Release);
    }

    pub fn set_sensor_blocked(&self, blocked: bool) {
        self.sensor_blocked.store(blocked, Ordering::Release);
    }

    pub fn set_button_blocked(&self, idx: usize, blocked: bool) {
        if let Some(flag) = self.button_blocked.get(idx) {
            flag.store(blocked, Ordering::Release);
        }
    }

    // ── Consumer side (main loop) ────────────────────────────

    /// Clear and return the pending score flag for `team`.
    pub fn take_score(&self, team: Team) -> bool {
        self.score_pending[team.index()].swap(false, Ordering::AcqRel)
    }

    /// Clear and return the pending timeout flag for `team`.
    pub fn take_timeout(&self, team: Team) -> bool {
        self.timeout_pending[team.index()].swap(false, Ordering::AcqRel)
    }

    /// Clear and return the action-pressed flag.
    pub fn take_action(&self) -> bool {
        self.action_pressed.swap(false, Ordering::AcqRel)
    }

    /// Drop every pending event without acting on it.
    pub fn clear_pending(&self) {
        for team in Team::BOTH {
            self.score_pending[team.index()].store(false, Ordering::Release);
            self.timeout_pending[team.index()].store(false, Ordering::Release);
        }
        self.action_pressed.store(false, Ordering::Release);
    }

    pub fn sensor_blocked(&self) -> bool {
        self.sensor_blocked.load(Ordering::Acquire)
    }

    pub fn button_blocked(&self, idx: usize) -> bool {
        self.button_blocked
            .get(idx)
            .is_some_and(|f| f.load(Ordering::Acquire))
    }

    /// Pin of the sensor that raised the most recent score.
    pub fn last_sensor_pin(&self) -> Option<u8> {
        Some(self.last_sensor_pin.load(Ordering::Relaxed)).filter(|p| *p != NO_ID)
    }

    /// Pin of the button that raised the most recent timeout or action.
    pub fn last_button_pin(&self) -> Option<u8> {
        Some(self.last_button_pin.load(Ordering::Relaxed)).filter(|p| *p != NO_ID)
    }

    // ── Mode hints (main loop → handlers) ────────────────────

    pub fn set_menu_open(&self, open: bool) {
        self.menu_open.store(open, Ordering::Release);
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open.load(Ordering::Acquire)
    }

    pub fn set_test_inputs(&self, on: bool) {
        self.test_inputs.store(on, Ordering::Release);
    }

    pub fn test_inputs(&self) -> bool {
        self.test_inputs.load(Ordering::Acquire)
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Flag set shared by the firmware's interrupt handlers and main loop.
pub static FLAGS: EventFlags = EventFlags::new();
