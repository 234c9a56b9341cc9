//! Integration tests for the flags → Controller → display / peer / LED
//! pipeline, driven through the public port traits only.

use foosboard::adapters::file_store::MemoryConfigStore;
use foosboard::animation::{AnimationQueue, LedKind};
use foosboard::app::events::AppEvent;
use foosboard::app::ports::NoPeer;
use foosboard::app::screen;
use foosboard::app::service::Controller;
use foosboard::config::GameSettings;
use foosboard::events::{EventFlags, Team};
use foosboard::fsm::MenuLevel;
use foosboard::fsm::actions::{MenuAction, Tally};
use foosboard::fsm::context::{GoalOutcome, Mode, Scoreboard};
use foosboard::rpc::engine::{ProtocolEngine, ProtocolEvent};

use crate::mock_hw::{FixedLevels, MockLcd, MockListener, RecordingSink, config, schema, shipped_lines};

fn drain(queue: &AnimationQueue) {
    while queue.pop().is_some() {}
}

fn goal(c: &mut Controller<'_>, flags: &EventFlags, team: Team, lcd: &mut MockLcd, sink: &mut RecordingSink) {
    flags.raise_score(team, 34);
    c.process_pending(lcd, &mut NoPeer, sink);
}

// ── Relay mode ────────────────────────────────────────────────

#[test]
fn relay_score_reaches_peer_and_log() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let listener = MockListener::new();
    let wire = listener.connect();
    let mut engine = ProtocolEngine::new(listener.clone(), schema());
    let mut store = MemoryConfigStore::with_lines(&shipped_lines());
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let mut lcd = MockLcd::new();
    let mut sink = RecordingSink::new();
    c.start(&mut lcd, &mut sink);

    for event in engine.poll(&mut store) {
        if let ProtocolEvent::Connected { peer, count } = event {
            c.client_connected(&mut lcd, &mut sink, &peer, count);
        }
    }
    assert!(lcd.shows("10.0.0.7"));
    assert!(lcd.shows("Connection# 1"));

    flags.raise_score(Team::Two, 35);
    c.process_pending(&mut lcd, &mut engine, &mut sink);

    assert_eq!(wire.sent(), ["Team:2,35\r\n"]);
    assert!(lcd.shows("Team2 Scored/Pin 35"));
    assert_eq!(queue.pop().map(|cmd| cmd.kind()), Some(LedKind::Score));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ScoreDetected { team: Team::Two, pin: 35 })), 1);
    // Relay mode never touches the scoreboard.
    assert_eq!(c.scoreboard(), &Scoreboard::new());
}

#[test]
fn relay_timeout_sends_to_line() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let listener = MockListener::new();
    let wire = listener.connect();
    let mut engine = ProtocolEngine::new(listener.clone(), schema());
    let mut store = MemoryConfigStore::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());
    engine.poll(&mut store);

    flags.raise_timeout(Team::One, 32);
    c.process_pending(&mut lcd, &mut engine, &mut sink);

    assert_eq!(wire.sent(), ["TO:1,32\r\n"]);
    assert!(lcd.shows("Team1 TimeOut/Pin 32"));
    let cmd = queue.pop().unwrap();
    assert_eq!(cmd.kind(), LedKind::Timeout);
    assert_eq!(cmd.duration_ms(), 3000);
}

#[test]
fn both_teams_handled_in_one_pass() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    flags.raise_score(Team::One, 34);
    flags.raise_score(Team::Two, 35);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::ScoreDetected { .. })), 2);
    assert_eq!(queue.len(), 2);
}

// ── Stand-alone scoring ───────────────────────────────────────

#[test]
fn stand_alone_game_then_match() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::StandAlone);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());
    let settings = GameSettings::default();

    for _ in 0..settings.points_to_win {
        goal(&mut c, &flags, Team::One, &mut lcd, &mut sink);
        drain(&queue);
    }
    assert_eq!(c.scoreboard().games, [1, 0]);
    assert_eq!(c.scoreboard().score, [0, 0]);

    for _ in 0..settings.points_to_win {
        goal(&mut c, &flags, Team::One, &mut lcd, &mut sink);
        drain(&queue);
    }
    assert!(c.scoreboard().match_won[0]);
    assert!(c.scoreboard().new_match_ready);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::GoalRecorded { outcome: GoalOutcome::MatchWon, .. })),
        1
    );

    // The next goal starts a fresh match.
    goal(&mut c, &flags, Team::Two, &mut lcd, &mut sink);
    assert_eq!(c.scoreboard().games, [0, 0]);
    assert_eq!(c.scoreboard().score, [0, 1]);
}

#[test]
fn stand_alone_timeout_counts() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::StandAlone);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    flags.raise_timeout(Team::Two, 33);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);

    assert_eq!(c.scoreboard().timeouts, [0, 1]);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::TimeoutCalled { team: Team::Two, .. })), 1);
}

// ── Menu ──────────────────────────────────────────────────────

#[test]
fn timeout_buttons_navigate_open_menu() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let listener = MockListener::new();
    let wire = listener.connect();
    let mut engine = ProtocolEngine::new(listener.clone(), schema());
    engine.poll(&mut MemoryConfigStore::new());
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut engine, &mut sink);
    assert!(c.menu_open());
    assert!(flags.menu_open());
    assert!(lcd.row(0).starts_with("<Show Host"));

    flags.raise_timeout(Team::Two, 33);
    c.process_pending(&mut lcd, &mut engine, &mut sink);
    assert_eq!(c.menu().selected_index(), 1);
    assert!(wire.sent().is_empty(), "navigation must not reach the peer");
    assert!(queue.is_empty());

    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut engine, &mut sink);
    assert_eq!(c.mode(), Mode::StandAlone);
    assert_eq!(sink.count(|e| *e == AppEvent::ModeChanged(Mode::StandAlone)), 1);
}

#[test]
fn setting_edit_cycle() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::StandAlone);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    c.handle_action(MenuAction::Open(MenuLevel::Settings), &mut lcd, &mut sink);

    // Action on a setting enters value-edit mode.
    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    assert!(c.menu().editing());

    flags.raise_timeout(Team::Two, 33);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    assert_eq!(c.settings().points_to_win, 6);
    for _ in 0..2 {
        flags.raise_timeout(Team::One, 32);
        c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    }
    assert_eq!(c.settings().points_to_win, 4);
    assert!(lcd.shows("Points To Win  4"));

    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    assert!(!c.menu().editing());
    assert_eq!(c.settings().points_to_win, 4);
}

#[test]
fn exit_from_submenu_returns_to_root_then_closes() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    c.handle_action(MenuAction::Open(MenuLevel::TestLeds), &mut lcd, &mut sink);
    c.handle_action(MenuAction::Exit, &mut lcd, &mut sink);
    assert!(c.menu_open());
    assert_eq!(c.menu().level(), MenuLevel::Root);

    c.handle_action(MenuAction::Exit, &mut lcd, &mut sink);
    assert!(!c.menu_open());
    assert!(!flags.menu_open());
    assert!(lcd.shows("Exited Menu"));
}

#[test]
fn show_host_reports_address_and_peer() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());
    c.set_host(Some("192.168.4.2".to_string()));

    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    c.handle_action(MenuAction::ShowHost, &mut lcd, &mut sink);

    assert_eq!(lcd.row(0), "No Client Connected");
    assert_eq!(lcd.row(1), "192.168.4.2");
    assert_eq!(lcd.row(2), "Port: 5000");
}

#[test]
fn adjust_never_goes_below_zero() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::StandAlone);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    let down = MenuAction::Adjust { team: Team::One, tally: Tally::Score, up: false };
    let up = MenuAction::Adjust { team: Team::Two, tally: Tally::Games, up: true };
    c.handle_action(down, &mut lcd, &mut sink);
    c.handle_action(up, &mut lcd, &mut sink);

    assert_eq!(c.scoreboard().score, [0, 0]);
    assert_eq!(c.scoreboard().games, [0, 1]);
}

#[test]
fn new_match_and_reset_all() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    c.handle_action(MenuAction::NewMatch, &mut lcd, &mut sink);
    assert_eq!(c.mode(), Mode::StandAlone);
    goal(&mut c, &flags, Team::One, &mut lcd, &mut sink);
    assert_eq!(c.scoreboard().score, [1, 0]);

    // Raise games-to-win through the Settings menu.
    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    c.handle_action(MenuAction::Open(MenuLevel::Settings), &mut lcd, &mut sink);
    flags.raise_timeout(Team::Two, 33);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    flags.raise_action(27);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    flags.raise_timeout(Team::Two, 33);
    c.process_pending(&mut lcd, &mut NoPeer, &mut sink);
    assert_eq!(c.settings().games_to_win, 3);

    c.handle_action(MenuAction::ResetAll, &mut lcd, &mut sink);

    assert_eq!(c.mode(), Mode::Relay);
    assert_eq!(c.scoreboard(), &Scoreboard::new());
    assert_eq!(c.settings(), &GameSettings::default());
    assert!(c.relay_log().lines().iter().any(|l| l == "System Reset"));
    assert!(lcd.shows("FoosOBS+Mode Enabled"));
}

// ── Test-input mode ───────────────────────────────────────────

#[test]
fn test_inputs_relays_without_scoring_or_leds() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let listener = MockListener::new();
    let wire = listener.connect();
    let mut engine = ProtocolEngine::new(listener.clone(), schema());
    engine.poll(&mut MemoryConfigStore::new());
    let mut c = Controller::new(config(), &flags, &queue, Mode::StandAlone);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    c.handle_action(MenuAction::TestInputs, &mut lcd, &mut sink);
    assert!(flags.test_inputs());

    flags.raise_score(Team::One, 34);
    c.process_pending(&mut lcd, &mut engine, &mut sink);
    assert_eq!(wire.sent(), ["Team:1,34\r\n"]);
    assert_eq!(c.scoreboard(), &Scoreboard::new());
    assert!(queue.is_empty());

    let levels = [true, false, true, false, false];
    c.refresh_inputs(&mut lcd, &FixedLevels(levels));
    assert_eq!(lcd.row(3), screen::input_levels_row(levels).trim_end());
}

#[test]
fn refresh_inputs_ignored_outside_test_mode() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let mut lcd = MockLcd::new();
    c.refresh_inputs(&mut lcd, &FixedLevels([true; 5]));
    assert_eq!(lcd.rows(), ["", "", "", ""]);
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn no_network_forces_stand_alone() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    c.degrade_to_stand_alone();
    assert_eq!(c.mode(), Mode::StandAlone);
}

#[test]
fn end_program_emits_stopping() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());
    c.handle_action(MenuAction::EndProgram, &mut lcd, &mut sink);
    assert!(!c.keep_running());
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopping));
}
