//! Application service, the hexagonal core.
//!
//! [`Controller`] owns the mode state, menu, scoreboard and relay log.
//! Once per main-loop iteration it takes the pending interrupt flags and
//! turns them into display updates, protocol lines and LED commands.  All
//! I/O flows through port traits injected at call sites, making the whole
//! service testable with mock adapters.
//!
//! ```text
//!  EventFlags ──▶ ┌──────────────────────────┐ ──▶ DisplayPort
//!                 │        Controller        │ ──▶ RemoteLink
//!  InputLevels ─▶ │ Mode · Menu · Scoreboard │ ──▶ EventSink
//!                 └──────────────────────────┘ ──▶ AnimationQueue
//! ```

use log::{debug, info, warn};

use crate::animation::{AnimationQueue, LedCommand, LedKind};
use crate::config::{ControllerConfig, GameSettings};
use crate::drivers::led_patterns::{GREEN, OFF, RED, SOFT_GREEN, SOFT_RED, SOFT_YELLOW};
use crate::events::{EventFlags, Team};
use crate::fsm::actions::{LedTest, MenuAction};
use crate::fsm::context::{GoalOutcome, Mode, ModeState, Scoreboard};
use crate::fsm::{ExitOutcome, Menu, MenuLevel};
use crate::rpc::codec::{score_line, timeout_line};

use super::events::AppEvent;
use super::ports::{DisplayPort, EventSink, InputLevels, RemoteLink};
use super::screen::{self, RelayLog};

/// Duration of each green/red phase of the score animation.
const SCORE_PHASE_MS: u32 = 500;
/// Per-pixel step of the LED self-test chase.
const SELF_TEST_STEP_MS: u32 = 100;
const SELF_TEST_RAINBOW_MS: u32 = 1260;
const SOLID_TEST_MS: u32 = 3000;
const BLINK_TEST_MS: u32 = 3000;
const RAINBOW_TEST_MS: u32 = 8400;
const STARTUP_RAINBOW_MS: u32 = 4200;

/// Main-loop pause while the control server is polled.
pub const SERVER_LOOP_MS: u32 = 1;
/// Main-loop pause in stand-alone operation.
pub const IDLE_LOOP_MS: u32 = 10;

/// Pause after each main-loop pass.  Never zero, so lower-priority tasks
/// (and the task watchdog's idle hook) always get to run.
pub const fn loop_pause_ms(serving: bool) -> u32 {
    if serving { SERVER_LOOP_MS } else { IDLE_LOOP_MS }
}

/// Bring-up milestones, each with its own strip colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    Initializing,
    NetworkDown,
    NetworkUp,
    Ready,
    Running,
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<'q> {
    config: ControllerConfig,
    settings: GameSettings,
    modes: ModeState,
    menu: Menu,
    board: Scoreboard,
    relay_log: RelayLog,
    flags: &'q EventFlags,
    queue: &'q AnimationQueue,
    /// Local address, if the network came up.
    host: Option<String>,
    /// Peer state seen on the last pass, for Show Host.
    connected: bool,
    keep_running: bool,
}

impl<'q> Controller<'q> {
    pub fn new(
        config: ControllerConfig,
        flags: &'q EventFlags,
        queue: &'q AnimationQueue,
        mode: Mode,
    ) -> Self {
        Self {
            config,
            settings: GameSettings::default(),
            modes: ModeState::new(mode),
            menu: Menu::new(),
            board: Scoreboard::new(),
            relay_log: RelayLog::new(),
            flags,
            queue,
            host: None,
            connected: false,
            keep_running: true,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Draw the mode's home screen and publish mode hints to the handlers.
    pub fn start(&mut self, display: &mut impl DisplayPort, sink: &mut impl EventSink) {
        self.publish_hints();
        self.draw_home(display);
        sink.emit(&AppEvent::Started(self.modes.mode()));
        info!("controller: started in {:?} mode", self.modes.mode());
    }

    /// Without a network there is nothing to relay to.
    pub fn degrade_to_stand_alone(&mut self) {
        warn!("controller: no network, forcing stand-alone mode");
        self.modes.set_mode(Mode::StandAlone);
        self.publish_hints();
    }

    pub fn set_host(&mut self, host: Option<String>) {
        self.host = host;
    }

    /// Append a line to the relay log, redrawing it if visible.
    pub fn log_line(&mut self, display: &mut impl DisplayPort, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.relay_log.push(line);
        if self.modes.mode() == Mode::Relay && !self.modes.menu_open() {
            screen::draw(display, self.relay_log.lines());
        }
    }

    /// Strip colour for a bring-up milestone.
    pub fn show_boot_stage(&self, stage: BootStage) {
        let all = [self.config.all_pixels()];
        match stage {
            BootStage::Initializing => {
                self.enqueue(LedCommand::clear());
                self.enqueue(LedCommand::solid(&all, SOFT_RED));
            }
            BootStage::NetworkDown => self.enqueue(LedCommand::solid(&all, RED)),
            BootStage::NetworkUp => self.enqueue(LedCommand::solid(&all, SOFT_YELLOW)),
            BootStage::Ready => self.enqueue(LedCommand::solid(&all, SOFT_GREEN)),
            BootStage::Running => {
                self.enqueue(LedCommand::clear());
                self.enqueue(LedCommand::new(LedKind::RainbowChase, &all, STARTUP_RAINBOW_MS, OFF));
            }
        }
    }

    /// Show the connection banner for a newly accepted peer.
    pub fn client_connected(
        &mut self,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
        peer: &str,
        count: u32,
    ) {
        self.connected = true;
        sink.emit(&AppEvent::ClientConnected(count));
        if !self.modes.menu_open() && !self.modes.is_test_inputs() {
            screen::draw(display, &screen::banner_lines(self.config.port, peer, count));
        }
    }

    pub fn client_disconnected(&mut self, sink: &mut impl EventSink) {
        self.connected = false;
        sink.emit(&AppEvent::ClientDisconnected);
    }

    /// `false` once End Program has been selected.
    pub fn keep_running(&self) -> bool {
        self.keep_running
    }

    // ── Per-iteration processing ──────────────────────────────

    /// Consume pending score, timeout and action flags.
    pub fn process_pending(
        &mut self,
        display: &mut impl DisplayPort,
        link: &mut impl RemoteLink,
        sink: &mut impl EventSink,
    ) {
        self.connected = link.is_connected();
        for team in Team::BOTH {
            if self.flags.take_score(team) {
                self.on_score(team, display, link, sink);
            }
        }
        for team in Team::BOTH {
            if self.flags.take_timeout(team) {
                self.on_timeout(team, display, link, sink);
            }
        }
        if self.flags.take_action() {
            self.on_action(display, sink);
        }
        self.publish_hints();
    }

    /// Refresh the live level row of the test-input screen.
    pub fn refresh_inputs(&self, display: &mut impl DisplayPort, inputs: &impl InputLevels) {
        if self.modes.is_test_inputs() {
            display.move_to(0, 3);
            display.put_str(&screen::input_levels_row(inputs.levels()));
        }
    }

    fn on_score(
        &mut self,
        team: Team,
        display: &mut impl DisplayPort,
        link: &mut impl RemoteLink,
        sink: &mut impl EventSink,
    ) {
        let pin = self.flags.last_sensor_pin().unwrap_or_default();
        sink.emit(&AppEvent::ScoreDetected { team, pin });
        if link.is_connected() {
            link.send_line(&score_line(team, pin));
        }
        if self.modes.is_test_inputs() {
            return;
        }
        self.enqueue(LedCommand::new(
            LedKind::Score,
            self.config.team_ranges(team),
            SCORE_PHASE_MS,
            OFF,
        ));
        match self.modes.mode() {
            Mode::StandAlone => {
                let outcome = self.board.record_goal(team, &self.settings);
                if outcome != GoalOutcome::Point {
                    info!("controller: team {} {:?}", team.number(), outcome);
                }
                sink.emit(&AppEvent::GoalRecorded { team, outcome });
                self.draw_score(display);
            }
            Mode::Relay => {
                self.log_line(display, format!("Team{} Scored/Pin {}", team.number(), pin));
            }
            Mode::TestInputs => {}
        }
    }

    fn on_timeout(
        &mut self,
        team: Team,
        display: &mut impl DisplayPort,
        link: &mut impl RemoteLink,
        sink: &mut impl EventSink,
    ) {
        if self.modes.menu_open() {
            self.navigate(team, display);
            return;
        }
        let pin = self.flags.last_button_pin().unwrap_or_default();
        sink.emit(&AppEvent::TimeoutCalled { team, pin });
        if link.is_connected() {
            link.send_line(&timeout_line(team, pin));
        }
        if self.modes.is_test_inputs() {
            return;
        }
        self.enqueue(LedCommand::new(
            LedKind::Timeout,
            self.config.team_ranges(team),
            self.config.delays.timeout_button_ms,
            OFF,
        ));
        match self.modes.mode() {
            Mode::StandAlone => {
                self.board.record_timeout(team);
                self.draw_score(display);
            }
            Mode::Relay => {
                self.log_line(display, format!("Team{} TimeOut/Pin {}", team.number(), pin));
            }
            Mode::TestInputs => {}
        }
    }

    /// Team one's button moves up (or decrements), team two's down (or increments).
    fn navigate(&mut self, team: Team, display: &mut impl DisplayPort) {
        let forward = team == Team::Two;
        match self.menu.selected_action().setting() {
            Some(id) if self.menu.editing() => self.settings.step(id, forward),
            _ if forward => self.menu.down(),
            _ => self.menu.up(),
        }
        self.draw_menu(display);
    }

    fn on_action(&mut self, display: &mut impl DisplayPort, sink: &mut impl EventSink) {
        debug!("controller: action pressed");
        if self.modes.menu_open() {
            if self.menu.editing() {
                self.menu.toggle_editing();
                self.draw_menu(display);
            } else {
                let action = self.menu.selected_action();
                info!("controller: menu action {:?}", action);
                self.handle_action(action, display, sink);
            }
        } else {
            self.modes.open_menu();
            self.menu.enter(MenuLevel::Root);
            self.draw_menu(display);
        }
    }

    // ── Menu actions ──────────────────────────────────────────

    /// Carry out one menu selection.
    pub fn handle_action(
        &mut self,
        action: MenuAction,
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        match action {
            MenuAction::ShowHost => {
                let lines = screen::host_lines(
                    self.connected,
                    self.host.as_deref(),
                    self.config.port,
                );
                screen::draw(display, &lines);
            }
            MenuAction::StandAlone => {
                self.set_mode(Mode::StandAlone, sink);
                self.draw_score(display);
            }
            MenuAction::Relay => {
                self.set_mode(Mode::Relay, sink);
                self.relay_log.clear();
                self.log_line(display, "FoosOBS+Mode Enabled");
            }
            MenuAction::TestInputs => {
                self.set_mode(Mode::TestInputs, sink);
                display.clear();
                let pins = self.config.sensor_pins;
                let buttons = [self.config.button_pins[0], self.config.button_pins[1]];
                screen::draw(display, &screen::test_input_header(pins, buttons));
            }
            MenuAction::Open(level) => {
                self.menu.enter(level);
                self.draw_menu(display);
            }
            MenuAction::NewMatch => {
                info!("controller: new match");
                self.board.reset();
                self.set_mode(Mode::StandAlone, sink);
                self.draw_score(display);
            }
            MenuAction::ResetAll => {
                info!("controller: reset all");
                self.board.reset();
                self.settings = GameSettings::default();
                self.menu.enter(MenuLevel::Root);
                self.set_mode(Mode::Relay, sink);
                self.relay_log.clear();
                display.clear();
                self.relay_log.push("System Reset");
                self.log_line(display, "FoosOBS+Mode Enabled");
            }
            MenuAction::Exit => match self.menu.exit() {
                ExitOutcome::ToRoot => self.draw_menu(display),
                ExitOutcome::Closed => {
                    self.modes.close_menu();
                    display.clear();
                    if self.modes.mode() == Mode::Relay {
                        self.log_line(display, "Exited Menu");
                    } else {
                        self.draw_home(display);
                    }
                }
            },
            MenuAction::EndProgram => {
                info!("controller: program ending");
                self.keep_running = false;
                sink.emit(&AppEvent::Stopping);
            }
            MenuAction::Setting(_) | MenuAction::TourneyMode => {
                self.menu.toggle_editing();
                self.draw_menu(display);
            }
            MenuAction::Adjust { team, tally, up } => {
                self.board.adjust(team, tally, up);
                self.modes.close_menu();
                self.draw_home(display);
            }
            MenuAction::TestLed(test) => self.run_led_test(test),
        }
        self.publish_hints();
    }

    fn run_led_test(&self, test: LedTest) {
        let all = [self.config.all_pixels()];
        match test {
            LedTest::SelfTest => {
                self.enqueue(LedCommand::new(LedKind::Test, &all, SELF_TEST_STEP_MS, OFF));
                self.enqueue(LedCommand::new(LedKind::RainbowChase, &all, SELF_TEST_RAINBOW_MS, OFF));
            }
            LedTest::Solid => {
                self.enqueue(LedCommand::new(LedKind::Solid, &all, SOLID_TEST_MS, GREEN));
                self.enqueue(LedCommand::clear());
            }
            LedTest::Timeout(team) => self.enqueue(LedCommand::new(
                LedKind::Timeout,
                self.config.team_ranges(team),
                self.config.delays.timeout_button_ms,
                OFF,
            )),
            LedTest::Score(team) => self.enqueue(LedCommand::new(
                LedKind::Score,
                self.config.team_ranges(team),
                SCORE_PHASE_MS,
                OFF,
            )),
            LedTest::Fade => self.enqueue(LedCommand::new(LedKind::Fade, &all, 0, GREEN)),
            LedTest::RainbowChase => {
                self.enqueue(LedCommand::new(LedKind::RainbowChase, &all, RAINBOW_TEST_MS, OFF));
            }
            LedTest::Blink => {
                self.enqueue(LedCommand::new(LedKind::Blink, &all, BLINK_TEST_MS, GREEN));
            }
            LedTest::Clear => self.enqueue(LedCommand::clear()),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn menu_open(&self) -> bool {
        self.modes.menu_open()
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.board
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn relay_log(&self) -> &RelayLog {
        &self.relay_log
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn enqueue(&self, cmd: LedCommand) {
        self.queue.enqueue(cmd);
    }

    fn set_mode(&mut self, mode: Mode, sink: &mut impl EventSink) {
        if mode != self.modes.mode() {
            sink.emit(&AppEvent::ModeChanged(mode));
        }
        info!("controller: {:?} mode enabled", mode);
        self.modes.set_mode(mode);
    }

    fn publish_hints(&self) {
        self.flags.set_menu_open(self.modes.menu_open());
        self.flags.set_test_inputs(self.modes.is_test_inputs());
    }

    fn draw_home(&self, display: &mut impl DisplayPort) {
        match self.modes.mode() {
            Mode::Relay => screen::draw(display, self.relay_log.lines()),
            Mode::StandAlone => screen::draw(display, &screen::score_lines(&self.board)),
            Mode::TestInputs => {}
        }
    }

    fn draw_score(&self, display: &mut impl DisplayPort) {
        if !self.modes.menu_open() && !self.modes.is_test_inputs() {
            screen::draw(display, &screen::score_lines(&self.board));
        }
    }

    fn draw_menu(&self, display: &mut impl DisplayPort) {
        screen::draw(display, &screen::menu_lines(&self.menu, &self.settings));
    }
}
