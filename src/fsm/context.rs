//! Controller state owned by the main loop.
//!
//! [`ModeState`] is the top-level mode plus the menu-open flag;
//! [`Scoreboard`] holds the stand-alone tallies.  Neither is touched from
//! interrupt context.

use serde::Serialize;

use crate::config::GameSettings;
use crate::events::Team;

use super::actions::Tally;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    /// Events are forwarded to the remote peer; the display is a log.
    Relay,
    /// Local scorekeeping on the display.
    StandAlone,
    /// Live input levels on the display; nothing is scored or sent.
    TestInputs,
}

/// Top-level mode and menu visibility.
///
/// The menu and TestInputs are mutually exclusive: entering TestInputs
/// closes the menu, and opening the menu leaves TestInputs for the mode
/// that was active before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeState {
    mode: Mode,
    /// Mode to restore when TestInputs ends.
    resume: Mode,
    menu_open: bool,
}

impl ModeState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            resume: mode,
            menu_open: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn is_test_inputs(&self) -> bool {
        self.mode == Mode::TestInputs
    }

    /// Switch mode; any mode change closes the menu.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == Mode::TestInputs {
            if self.mode != Mode::TestInputs {
                self.resume = self.mode;
            }
        } else {
            self.resume = mode;
        }
        self.mode = mode;
        self.menu_open = false;
    }

    pub fn open_menu(&mut self) {
        if self.mode == Mode::TestInputs {
            self.mode = self.resume;
        }
        self.menu_open = true;
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::new(Mode::Relay)
    }
}

// ---------------------------------------------------------------------------
// Scoreboard
// ---------------------------------------------------------------------------

/// Result of recording a goal in stand-alone mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    Point,
    /// The team reached points-to-win; points and timeouts were reset.
    GameWon,
    /// The team reached games-to-win; the next goal starts a new match.
    MatchWon,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub score: [u16; 2],
    pub games: [u16; 2],
    pub timeouts: [u16; 2],
    pub last_scored: Option<Team>,
    pub game_won: [bool; 2],
    pub match_won: [bool; 2],
    pub new_match_ready: bool,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every tally and flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply one stand-alone goal for `team`.
    pub fn record_goal(&mut self, team: Team, settings: &GameSettings) -> GoalOutcome {
        if self.new_match_ready {
            self.reset();
        }
        let t = team.index();
        self.score[t] = self.score[t].saturating_add(1);
        self.last_scored = Some(team);
        if self.score[t] < u16::from(settings.points_to_win) {
            return GoalOutcome::Point;
        }
        self.games[t] = self.games[t].saturating_add(1);
        self.game_won[t] = true;
        if self.games[t] >= u16::from(settings.games_to_win) {
            self.match_won[t] = true;
            self.new_match_ready = true;
            GoalOutcome::MatchWon
        } else {
            self.score = [0; 2];
            self.timeouts = [0; 2];
            GoalOutcome::GameWon
        }
    }

    pub fn record_timeout(&mut self, team: Team) {
        let slot = &mut self.timeouts[team.index()];
        *slot = slot.saturating_add(1);
    }

    /// Step one counter; decrements stop at zero.
    pub fn adjust(&mut self, team: Team, tally: Tally, up: bool) {
        let slot = match tally {
            Tally::Score => &mut self.score[team.index()],
            Tally::Games => &mut self.games[team.index()],
            Tally::Timeouts => &mut self.timeouts[team.index()],
        };
        *slot = if up {
            slot.saturating_add(1)
        } else {
            slot.saturating_sub(1)
        };
    }
}
