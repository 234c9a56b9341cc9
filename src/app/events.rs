//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) and the protocol engine
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them.

use crate::fsm::context::{GoalOutcome, Mode};
use crate::events::Team;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller is entering its main loop in this mode.
    Started(Mode),

    /// A goal sensor fired.
    ScoreDetected { team: Team, pin: u8 },

    /// A timeout button was pressed with the menu closed.
    TimeoutCalled { team: Team, pin: u8 },

    /// A stand-alone goal was applied to the scoreboard.
    GoalRecorded { team: Team, outcome: GoalOutcome },

    ModeChanged(Mode),

    /// A remote peer connected; carries the running connection count.
    ClientConnected(u32),

    ClientDisconnected,

    /// A `save` replaced the stored configuration.
    ConfigSaved,

    /// The control loop is exiting.
    Stopping,
}
