//! Display screens.
//!
//! Every screen is four rows of text built here and pushed through
//! [`DisplayPort::write_row`]; nothing in this module touches hardware.

use crate::config::{GameSettings, SettingId};
use crate::events::Team;
use crate::fsm::actions::MenuAction;
use crate::fsm::context::Scoreboard;
use crate::fsm::Menu;

use super::ports::DisplayPort;

/// Character rows on the display.
pub const ROWS: usize = 4;
/// Character columns on the display.
pub const COLUMNS: usize = 20;

/// Names shown for each team on the score screen.
pub const TEAM_COLOURS: [&str; 2] = ["Yellow", "Black "];

pub type Lines = [String; ROWS];

/// Write all four rows.
pub fn draw(display: &mut impl DisplayPort, lines: &Lines) {
    for (row, line) in lines.iter().enumerate() {
        display.write_row(row as u8, line);
    }
}

// ── Relay log ─────────────────────────────────────────────────

/// Rolling four-line event log shown in Relay mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayLog {
    lines: Lines,
}

impl RelayLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scroll up one row and append `line` at the bottom.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.rotate_left(1);
        self.lines[ROWS - 1] = line.into();
    }

    pub fn clear(&mut self) {
        self.lines = Lines::default();
    }

    pub fn lines(&self) -> &Lines {
        &self.lines
    }
}

// ── Screens ───────────────────────────────────────────────────

pub fn score_lines(board: &Scoreboard) -> Lines {
    let team = |t: Team| {
        let i = t.index();
        format!(
            "{}: G{} P{} T{}",
            TEAM_COLOURS[i], board.games[i], board.score[i], board.timeouts[i]
        )
    };
    let last = board.last_scored.map_or("-", |t| TEAM_COLOURS[t.index()]);
    [
        "Mode: Stand Alone".into(),
        team(Team::One),
        team(Team::Two),
        format!("Last Scored: {last}"),
    ]
}

/// Static part of the test-input screen; row 3 is refreshed separately.
pub fn test_input_header(sensor_pins: [u8; 3], button_pins: [u8; 2]) -> Lines {
    let [s1, s2, s3] = sensor_pins;
    let [b1, b2] = button_pins;
    [
        "Mode: Test Inputs".into(),
        "L1  L2  L3  PB1 PB2".into(),
        format!("P{s1} P{s2} P{s3} P{b1} P{b2}"),
        String::new(),
    ]
}

/// Row 3 of the test-input screen.
pub fn input_levels_row(levels: [bool; 5]) -> String {
    let digit = |on: bool| if on { '1' } else { '0' };
    levels.iter().fold(String::new(), |mut row, &on| {
        row.push(' ');
        row.push(digit(on));
        row.push_str("  ");
        row
    })
}

pub fn host_lines(client_connected: bool, host: Option<&str>, port: u16) -> Lines {
    [
        if client_connected {
            "Client Connected"
        } else {
            "No Client Connected"
        }
        .into(),
        host.unwrap_or("No IP Address").into(),
        format!("Port: {port}"),
        String::new(),
    ]
}

pub fn banner_lines(port: u16, peer: &str, count: u32) -> Lines {
    [
        format!("Connect on: {port}"),
        peer.into(),
        format!("Connection# {count}"),
        String::new(),
    ]
}

/// Label shown for a menu item, with live values for settings.
fn item_text(label: &str, action: MenuAction, settings: &GameSettings) -> String {
    match action {
        MenuAction::Setting(id) => format!("{label}  {}", settings.display_value(id)),
        MenuAction::TourneyMode => {
            let on = !settings.rack_mode;
            format!("{label}  {}", if on { "On" } else { "Off" })
        }
        _ => label.into(),
    }
}

/// Menu window with cursor marks; value-edit mode inverts the marks.
pub fn menu_lines(menu: &Menu, settings: &GameSettings) -> Lines {
    let (open, close) = if menu.editing() { ('>', '<') } else { ('<', '>') };
    let mut lines = Lines::default();
    for (slot, (item, selected)) in lines.iter_mut().zip(menu.visible()) {
        let text = item_text(item.label, item.action, settings);
        let body: String = text
            .chars()
            .chain(core::iter::repeat(' '))
            .take(COLUMNS - 2)
            .collect();
        *slot = if selected {
            format!("{open}{body}{close}")
        } else {
            format!(" {body} ")
        };
    }
    lines
}

/// Debug dump of the settings shown at startup.
pub fn settings_summary(settings: &GameSettings) -> String {
    [
        SettingId::PointsToWin,
        SettingId::GamesToWin,
        SettingId::BallsInRack,
        SettingId::RackMode,
    ]
    .iter()
    .map(|&id| format!("{id:?}={}", settings.display_value(id)))
    .collect::<Vec<_>>()
    .join(" ")
}
