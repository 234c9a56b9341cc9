//! Push-button channel with per-channel debounce.
//!
//! ## Hardware
//!
//! Three momentary switches with pull-downs; both edges are wired to the
//! GPIO interrupt so the handler sees press and release.
//!
//! ## Roles
//!
//! | Role          | On press (not blocked)                          | Release delay        |
//! |---------------|-------------------------------------------------|----------------------|
//! | `Timeout(t)`  | raise timeout for `t` (menu: navigate up/down)  | menu ? action : PB   |
//! | `Action`      | raise action-pressed                            | action               |
//!
//! In test-input mode timeout buttons raise nothing and only restart their
//! release timer.  Each channel stays blocked until its own timer fires.

use crate::events::Team;
use crate::drivers::hw_timer::OneShotTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    Timeout(Team),
    Action,
}

/// What a button edge asks the detector to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    /// Block the channel, light the indicator, raise the role's flag and
    /// arm the release timer.
    Pressed,
    /// Only restart the release timer.
    Rearm,
    Ignored,
}

pub struct ButtonChannel<T> {
    pin: u8,
    role: ButtonRole,
    timer: T,
}

impl<T: OneShotTimer> ButtonChannel<T> {
    pub fn new(pin: u8, role: ButtonRole, timer: T) -> Self {
        Self { pin, role, timer }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn role(&self) -> ButtonRole {
        self.role
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Classify one edge.
    pub fn on_edge(&self, on: bool, blocked: bool, test_inputs: bool) -> ButtonEdge {
        match self.role {
            ButtonRole::Timeout(_) if test_inputs => ButtonEdge::Rearm,
            _ if on && !blocked => ButtonEdge::Pressed,
            _ => ButtonEdge::Ignored,
        }
    }

    /// Release delay for this channel given the current menu state.
    pub fn release_delay_ms(&self, menu_open: bool, timeout_ms: u32, action_ms: u32) -> u32 {
        match self.role {
            ButtonRole::Action => action_ms,
            ButtonRole::Timeout(_) if menu_open => action_ms,
            ButtonRole::Timeout(_) => timeout_ms,
        }
    }
}
