//! Static menu table.
//!
//! ```text
//!  Root ──[Settings]──▶ Settings ──[Exit Settings]──┐
//!    │ ──[Adjust]────▶ Adjust   ──[Exit Adjust]────┤
//!    │ ──[Test LEDs]─▶ TestLeds ──[Exit Test LEDs]─┤
//!    ▲                                              │
//!    └──────────────────────────────────────────────┘
//!  Root ──[Exit Menu]──▶ (closed)
//! ```

use crate::config::SettingId;
use crate::events::Team;

use super::actions::{LedTest, MenuAction, Tally};
use super::{MenuDescriptor, MenuLevel};

/// One selectable row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
}

const fn item(label: &'static str, action: MenuAction) -> MenuItem {
    MenuItem { label, action }
}

const fn adjust(label: &'static str, team: Team, tally: Tally, up: bool) -> MenuItem {
    item(label, MenuAction::Adjust { team, tally, up })
}

static ROOT: [MenuItem; 11] = [
    item("Show Host", MenuAction::ShowHost),
    item("StandAlone Mode", MenuAction::StandAlone),
    item("FoosOBS+Mode", MenuAction::Relay),
    item("Adjust", MenuAction::Open(MenuLevel::Adjust)),
    item("New Match", MenuAction::NewMatch),
    item("Reset All", MenuAction::ResetAll),
    item("Test Inputs", MenuAction::TestInputs),
    item("Test LEDs", MenuAction::Open(MenuLevel::TestLeds)),
    item("Settings", MenuAction::Open(MenuLevel::Settings)),
    item("Exit Menu", MenuAction::Exit),
    item("End Program", MenuAction::EndProgram),
];

static SETTINGS: [MenuItem; 6] = [
    item("Points To Win", MenuAction::Setting(SettingId::PointsToWin)),
    item("Games To Win", MenuAction::Setting(SettingId::GamesToWin)),
    item("Balls In Rack", MenuAction::Setting(SettingId::BallsInRack)),
    item("Rack Mode", MenuAction::Setting(SettingId::RackMode)),
    item("Tourney Mode", MenuAction::TourneyMode),
    item("Exit Settings", MenuAction::Exit),
];

static ADJUST: [MenuItem; 13] = [
    adjust("T1 Score+", Team::One, Tally::Score, true),
    adjust("T2 Score+", Team::Two, Tally::Score, true),
    adjust("T1 Score-", Team::One, Tally::Score, false),
    adjust("T2 Score-", Team::Two, Tally::Score, false),
    adjust("T1 Game+", Team::One, Tally::Games, true),
    adjust("T2 Game+", Team::Two, Tally::Games, true),
    adjust("T1 Game-", Team::One, Tally::Games, false),
    adjust("T2 Game-", Team::Two, Tally::Games, false),
    adjust("T1 TO+", Team::One, Tally::Timeouts, true),
    adjust("T2 TO+", Team::Two, Tally::Timeouts, true),
    adjust("T1 TO-", Team::One, Tally::Timeouts, false),
    adjust("T2 TO-", Team::Two, Tally::Timeouts, false),
    item("Exit Adjust", MenuAction::Exit),
];

static TEST_LEDS: [MenuItem; 11] = [
    item("Test", MenuAction::TestLed(LedTest::SelfTest)),
    item("Solid", MenuAction::TestLed(LedTest::Solid)),
    item("Time Out Team 1", MenuAction::TestLed(LedTest::Timeout(Team::One))),
    item("Time Out Team 2", MenuAction::TestLed(LedTest::Timeout(Team::Two))),
    item("Score Team 1", MenuAction::TestLed(LedTest::Score(Team::One))),
    item("Score Team 2", MenuAction::TestLed(LedTest::Score(Team::Two))),
    item("Fade", MenuAction::TestLed(LedTest::Fade)),
    item("Rainbow Chase", MenuAction::TestLed(LedTest::RainbowChase)),
    item("Blink", MenuAction::TestLed(LedTest::Blink)),
    item("Clear", MenuAction::TestLed(LedTest::Clear)),
    item("Exit Test LEDs", MenuAction::Exit),
];

/// Build the menu table, indexed by `MenuLevel as usize`.
pub fn build_menu_table() -> [MenuDescriptor; MenuLevel::COUNT] {
    [
        MenuDescriptor {
            level: MenuLevel::Root,
            name: "Root",
            items: &ROOT,
        },
        MenuDescriptor {
            level: MenuLevel::Settings,
            name: "Settings",
            items: &SETTINGS,
        },
        MenuDescriptor {
            level: MenuLevel::Adjust,
            name: "Adjust",
            items: &ADJUST,
        },
        MenuDescriptor {
            level: MenuLevel::TestLeds,
            name: "Test LEDs",
            items: &TEST_LEDS,
        },
    ]
}
