//! Integration tests for the edge detector wired from configuration,
//! through the shared cell, into the controller.

use foosboard::adapters::file_store::MemoryConfigStore;
use foosboard::animation::AnimationQueue;
use foosboard::app::service::Controller;
use foosboard::drivers::hw_init::GpioOut;
use foosboard::drivers::hw_timer::SimTimer;
use foosboard::events::{EventFlags, Team};
use foosboard::fsm::context::Mode;
use foosboard::rpc::engine::ProtocolEngine;
use foosboard::sensors::{EdgeDetector, EdgeDetectorCell};

use crate::mock_hw::{MockLcd, MockListener, RecordingSink, config, schema};

// Sensors are low while the beam is broken; buttons are high while pressed.
const BROKEN: bool = false;
const CLEAR: bool = true;
const PRESSED: bool = true;
const RELEASED: bool = false;

type Detector<'f> = EdgeDetector<'f, GpioOut, SimTimer>;

fn detector(flags: &EventFlags, sensor_levels: [bool; 3]) -> Detector<'_> {
    let cfg = config();
    let [led1, led2] = cfg.team_led_pins;
    EdgeDetector::from_config(
        flags,
        &cfg,
        [GpioOut::new(led1), GpioOut::new(led2)],
        GpioOut::new(2),
        SimTimer::new(),
        [SimTimer::new(), SimTimer::new(), SimTimer::new()],
        sensor_levels,
    )
    .unwrap()
}

#[test]
fn from_config_maps_pins_to_teams() {
    let flags = EventFlags::new();
    let d = detector(&flags, [CLEAR; 3]);
    let wiring: Vec<(u8, Team)> = d.sensors().iter().map(|s| (s.pin(), s.team())).collect();
    assert_eq!(wiring, [(34, Team::One), (35, Team::Two), (36, Team::Two)]);
}

#[test]
fn goal_cycle_blocks_until_release_timer() {
    let flags = EventFlags::new();
    let mut d = detector(&flags, [CLEAR; 3]);

    d.sensor_pin_edge(35, BROKEN);
    assert!(flags.take_score(Team::Two));
    assert!(flags.sensor_blocked());
    assert!(d.team_led(Team::Two).is_set_high());

    // A second sensor inside the block window is ignored.
    d.sensor_pin_edge(34, BROKEN);
    assert!(!flags.take_score(Team::One));

    d.sensor_pin_edge(35, CLEAR);
    assert_eq!(d.sensor_timer().armed(), Some(2000));
    assert!(d.sensor_timer_mut().fire());
    d.sensor_release_elapsed();
    assert!(!flags.sensor_blocked());
    assert!(!d.team_led(Team::Two).is_set_high());

    d.sensor_pin_edge(36, BROKEN);
    assert!(flags.take_score(Team::Two));
    assert_eq!(flags.last_sensor_pin(), Some(36));
}

#[test]
fn beam_broken_at_startup_is_not_a_goal() {
    let flags = EventFlags::new();
    let mut d = detector(&flags, [BROKEN, CLEAR, CLEAR]);

    // The first transition is the beam clearing: a release, not a score.
    d.sensor_pin_edge(34, CLEAR);
    assert!(!flags.take_score(Team::One));
    assert_eq!(d.sensor_timer().armed(), Some(2000));
}

#[test]
fn buttons_follow_configured_roles() {
    let flags = EventFlags::new();
    let mut d = detector(&flags, [CLEAR; 3]);

    d.button_pin_edge(33, PRESSED);
    assert!(flags.take_timeout(Team::Two));
    assert!(d.timeout_led().is_set_high());
    assert!(flags.button_blocked(1));
    assert_eq!(d.button_timer_mut(1).and_then(|t| t.armed()), Some(3000));

    // Bounce while blocked is ignored.
    d.button_pin_edge(33, RELEASED);
    d.button_pin_edge(33, PRESSED);
    assert!(!flags.take_timeout(Team::Two));

    d.button_release_elapsed(1);
    assert!(!flags.button_blocked(1));
    assert!(!d.timeout_led().is_set_high());

    d.button_pin_edge(27, PRESSED);
    assert!(flags.take_action());
    assert_eq!(d.button_timer_mut(2).and_then(|t| t.armed()), Some(300));
}

#[test]
fn shutdown_through_cell_silences_everything() {
    let flags = EventFlags::new();
    let cell: EdgeDetectorCell<'_, GpioOut, SimTimer> = EdgeDetectorCell::new();

    // Handlers are no-ops until a detector is installed.
    cell.sensor_pin_edge(34, BROKEN);
    assert!(!flags.take_score(Team::One));

    cell.install(detector(&flags, [CLEAR; 3]));
    cell.sensor_pin_edge(34, BROKEN);
    cell.button_pin_edge(32, PRESSED);
    assert!(flags.take_score(Team::One));
    assert!(flags.take_timeout(Team::One));

    let mut d = cell.take().unwrap();
    d.shutdown();
    assert!(!d.team_led(Team::One).is_set_high());
    assert!(!d.timeout_led().is_set_high());
    assert_eq!(d.button_timer_mut(0).and_then(|t| t.armed()), None);

    cell.sensor_pin_edge(35, BROKEN);
    assert!(!flags.take_score(Team::Two));
}

#[test]
fn edge_to_peer_end_to_end() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let cell: EdgeDetectorCell<'_, GpioOut, SimTimer> = EdgeDetectorCell::new();
    cell.install(detector(&flags, [CLEAR; 3]));

    let listener = MockListener::new();
    let wire = listener.connect();
    let mut engine = ProtocolEngine::new(listener.clone(), schema());
    engine.poll(&mut MemoryConfigStore::new());

    let mut c = Controller::new(config(), &flags, &queue, Mode::Relay);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());
    c.start(&mut lcd, &mut sink);

    cell.sensor_pin_edge(34, BROKEN);
    cell.button_pin_edge(33, PRESSED);
    c.process_pending(&mut lcd, &mut engine, &mut sink);

    assert_eq!(wire.sent(), ["Team:1,34\r\n", "TO:2,33\r\n"]);
    assert!(lcd.shows("Team1 Scored/Pin 34"));
    assert!(lcd.shows("Team2 TimeOut/Pin 33"));
}

#[test]
fn menu_hint_shortens_timeout_release() {
    let flags = EventFlags::new();
    let queue = AnimationQueue::new();
    let mut d = detector(&flags, [CLEAR; 3]);
    let mut c = Controller::new(config(), &flags, &queue, Mode::StandAlone);
    let (mut lcd, mut sink) = (MockLcd::new(), RecordingSink::new());

    d.button_pin_edge(27, PRESSED);
    c.process_pending(&mut lcd, &mut foosboard::app::ports::NoPeer, &mut sink);
    assert!(c.menu_open());

    d.button_pin_edge(32, PRESSED);
    assert_eq!(d.button_timer_mut(0).and_then(|t| t.armed()), Some(300));
}
