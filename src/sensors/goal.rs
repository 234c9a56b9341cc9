//! Break-beam goal sensor channel.
//!
//! ## Hardware
//!
//! IR break-beam across the goal mouth, open-collector output.  The beam
//! is interrupted for as long as the ball is in the throat, so a goal is
//! one on-edge followed by one off-edge.
//!
//! ## Debounce
//!
//! | State  | Edge | Shared blocked | Result                          |
//! |--------|------|----------------|---------------------------------|
//! | Idle   | on   | clear          | → Active, goal scored           |
//! | Idle   | on   | set            | ignored                         |
//! | Active | off  | any            | → Idle, arm the release timer   |
//! | any    | else | any            | ignored                         |
//!
//! The shared blocked flag stays set until the release timer fires, so
//! one goal can never be counted twice and a second sensor tripping in
//! the meantime is ignored.

use crate::events::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Idle,
    Active,
}

/// What an edge did to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEdge {
    /// Idle → Active: a goal for the channel's team.
    Scored,
    /// Active → Idle: the release timer should be armed.
    Released,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorChannel {
    pin: u8,
    team: Team,
    state: SensorState,
}

impl SensorChannel {
    pub fn new(pin: u8, team: Team) -> Self {
        Self {
            pin,
            team,
            state: SensorState::Idle,
        }
    }

    /// Start in `Active` when the beam is already broken at power-up, so
    /// the first off-edge is treated as a release rather than ignored.
    pub fn with_initial(mut self, on: bool) -> Self {
        if on {
            self.state = SensorState::Active;
        }
        self
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Apply one edge.  `on` is whether the new level is the on-level.
    pub fn on_edge(&mut self, on: bool, blocked: bool) -> SensorEdge {
        match (self.state, on) {
            (SensorState::Idle, true) if !blocked => {
                self.state = SensorState::Active;
                SensorEdge::Scored
            }
            (SensorState::Active, false) => {
                self.state = SensorState::Idle;
                SensorEdge::Released
            }
            _ => SensorEdge::Ignored,
        }
    }
}
