//! Menu item actions.
//!
//! Every selectable row carries one [`MenuAction`], resolved once from the
//! table when the action button is pressed.  The controller matches on it;
//! nothing downstream inspects label text.

use crate::config::SettingId;
use crate::events::Team;

use super::MenuLevel;

/// Scoreboard counter touched by an Adjust item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tally {
    Score,
    Games,
    Timeouts,
}

/// Built-in LED strip checks offered by the Test LEDs menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedTest {
    /// Chase then rainbow.
    SelfTest,
    Solid,
    Timeout(Team),
    Score(Team),
    Fade,
    RainbowChase,
    Blink,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    /// Connection status, address and port.
    ShowHost,
    StandAlone,
    Relay,
    TestInputs,
    /// Descend into a submenu.
    Open(MenuLevel),
    /// Scores cleared, StandAlone mode, menu closed.
    NewMatch,
    /// Scores and settings cleared, Relay mode.
    ResetAll,
    /// Pop one level, or close the menu at Root.
    Exit,
    EndProgram,
    /// Toggle value-edit mode on a setting.
    Setting(SettingId),
    /// The rack toggle seen from the other side.
    TourneyMode,
    Adjust { team: Team, tally: Tally, up: bool },
    TestLed(LedTest),
}

impl MenuAction {
    /// Whether selecting this item toggles value-edit mode.
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Setting(_) | Self::TourneyMode)
    }

    /// Setting stepped by the navigation buttons while editing.
    pub const fn setting(self) -> Option<SettingId> {
        match self {
            Self::Setting(id) => Some(id),
            Self::TourneyMode => Some(SettingId::RackMode),
            _ => None,
        }
    }
}
