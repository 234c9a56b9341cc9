//! Edge detection for goal sensors and push buttons.
//!
//! [`EdgeDetector`] owns every debounced channel, their release timers
//! and the indicator outputs.  It turns raw edges into flags on the shared
//! [`EventFlags`]; it never logs and never blocks, so it is safe to drive
//! from interrupt context.
//!
//! [`EdgeDetectorCell`] wraps the detector in a critical section.  All
//! sensor and button edges, and every release timer expiry, enter through
//! it, which makes the handlers mutually exclusive: while one runs, the
//! others are held off until it returns.
//!
//! ```text
//!  GPIO edge ─┐
//!  timer exp ─┼─▶ EdgeDetectorCell ─(critical section)─▶ EdgeDetector ─▶ EventFlags
//!             │                                              │
//!             └──────────────────────────────────────────────┴─▶ team / timeout LEDs
//! ```

pub mod goal;

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::OutputPin;

use crate::config::{ControllerConfig, DebounceDelays, EdgeLevels, SENSOR_TEAMS};
use crate::drivers::button::{ButtonChannel, ButtonEdge, ButtonRole};
use crate::drivers::hw_timer::OneShotTimer;
use crate::error::Error;
use crate::events::{BUTTON_COUNT, EventFlags, Team};
use goal::{SensorChannel, SensorEdge};

/// Maximum number of goal sensors.
pub const MAX_SENSORS: usize = 3;

/// Role of each configured button, by button slot.
pub const BUTTON_ROLES: [ButtonRole; BUTTON_COUNT] = [
    ButtonRole::Timeout(Team::One),
    ButtonRole::Timeout(Team::Two),
    ButtonRole::Action,
];

// ── Detector ──────────────────────────────────────────────────

/// Debounce state machine for every input channel.
pub struct EdgeDetector<'f, O, T> {
    flags: &'f EventFlags,
    sensors: heapless::Vec<SensorChannel, MAX_SENSORS>,
    buttons: heapless::Vec<ButtonChannel<T>, BUTTON_COUNT>,
    sensor_timer: T,
    team_leds: [O; 2],
    timeout_led: O,
    levels: EdgeLevels,
    delays: DebounceDelays,
}

impl<'f, O: OutputPin, T: OneShotTimer> EdgeDetector<'f, O, T> {
    pub fn new(
        flags: &'f EventFlags,
        team_leds: [O; 2],
        timeout_led: O,
        sensor_timer: T,
        levels: EdgeLevels,
        delays: DebounceDelays,
    ) -> Self {
        Self {
            flags,
            sensors: heapless::Vec::new(),
            buttons: heapless::Vec::new(),
            sensor_timer,
            team_leds,
            timeout_led,
            levels,
            delays,
        }
    }

    /// Wire every sensor and button named in `config`.
    ///
    /// `sensor_levels` are the pin levels read at startup, so a beam that is
    /// already broken does not count as a goal.
    pub fn from_config(
        flags: &'f EventFlags,
        config: &ControllerConfig,
        team_leds: [O; 2],
        timeout_led: O,
        sensor_timer: T,
        button_timers: [T; BUTTON_COUNT],
        sensor_levels: [bool; MAX_SENSORS],
    ) -> Result<Self, Error> {
        let mut detector = Self::new(
            flags,
            team_leds,
            timeout_led,
            sensor_timer,
            config.levels,
            config.delays,
        );
        for ((&pin, team), high) in config.sensor_pins.iter().zip(SENSOR_TEAMS).zip(sensor_levels) {
            let on = high == config.levels.sensor_on_high;
            detector.add_sensor(SensorChannel::new(pin, team).with_initial(on))?;
        }
        for ((&pin, role), timer) in config.button_pins.iter().zip(BUTTON_ROLES).zip(button_timers) {
            detector.add_button(ButtonChannel::new(pin, role, timer))?;
        }
        Ok(detector)
    }

    pub fn add_sensor(&mut self, channel: SensorChannel) -> Result<(), Error> {
        self.sensors
            .push(channel)
            .map_err(|_| Error::Init("too many goal sensors"))
    }

    pub fn add_button(&mut self, channel: ButtonChannel<T>) -> Result<(), Error> {
        self.buttons
            .push(channel)
            .map_err(|_| Error::Init("too many buttons"))
    }

    // ── Sensors ──────────────────────────────────────────────

    /// Handle an edge on sensor slot `idx`; `high` is the new pin level.
    pub fn sensor_edge(&mut self, idx: usize, high: bool) {
        let on = high == self.levels.sensor_on_high;
        let blocked = self.flags.sensor_blocked();
        let Some(channel) = self.sensors.get_mut(idx) else {
            return;
        };
        match channel.on_edge(on, blocked) {
            SensorEdge::Scored => {
                let (team, pin) = (channel.team(), channel.pin());
                self.flags.set_sensor_blocked(true);
                let _ = self.team_leds[team.index()].set_high();
                self.flags.raise_score(team, pin);
            }
            SensorEdge::Released => self.sensor_timer.arm(self.delays.sensor_ms),
            SensorEdge::Ignored => {}
        }
    }

    /// Handle an edge on the sensor wired to `pin`.
    pub fn sensor_pin_edge(&mut self, pin: u8, high: bool) {
        if let Some(idx) = self.sensors.iter().position(|s| s.pin() == pin) {
            self.sensor_edge(idx, high);
        }
    }

    /// The shared sensor release timer fired.
    pub fn sensor_release_elapsed(&mut self) {
        self.flags.set_sensor_blocked(false);
        for led in &mut self.team_leds {
            let _ = led.set_low();
        }
    }

    // ── Buttons ──────────────────────────────────────────────

    /// Handle an edge on button slot `idx`; `high` is the new pin level.
    pub fn button_edge(&mut self, idx: usize, high: bool) {
        let on = high == self.levels.button_on_high;
        let blocked = self.flags.button_blocked(idx);
        let test_inputs = self.flags.test_inputs();
        let menu_open = self.flags.menu_open();
        let delays = self.delays;
        let Some(channel) = self.buttons.get_mut(idx) else {
            return;
        };
        let delay = channel.release_delay_ms(
            menu_open,
            delays.timeout_button_ms,
            delays.action_button_ms,
        );
        match channel.on_edge(on, blocked, test_inputs) {
            ButtonEdge::Pressed => {
                self.flags.set_button_blocked(idx, true);
                let _ = self.timeout_led.set_high();
                match channel.role() {
                    ButtonRole::Timeout(team) => self.flags.raise_timeout(team, channel.pin()),
                    ButtonRole::Action => self.flags.raise_action(channel.pin()),
                }
                channel.timer_mut().arm(delay);
            }
            ButtonEdge::Rearm => channel.timer_mut().arm(delay),
            ButtonEdge::Ignored => {}
        }
    }

    /// Handle an edge on the button wired to `pin`.
    pub fn button_pin_edge(&mut self, pin: u8, high: bool) {
        if let Some(idx) = self.buttons.iter().position(|b| b.pin() == pin) {
            self.button_edge(idx, high);
        }
    }

    /// Button `idx`'s release timer fired.
    pub fn button_release_elapsed(&mut self, idx: usize) {
        self.flags.set_button_blocked(idx, false);
        let _ = self.timeout_led.set_low();
    }

    // ── Lifecycle ────────────────────────────────────────────

    /// Cancel every pending release and switch all indicators off.
    pub fn shutdown(&mut self) {
        self.sensor_timer.disarm();
        for b in &mut self.buttons {
            b.timer_mut().disarm();
        }
        for led in &mut self.team_leds {
            let _ = led.set_low();
        }
        let _ = self.timeout_led.set_low();
    }

    // ── Inspection ───────────────────────────────────────────

    pub fn sensors(&self) -> &[SensorChannel] {
        &self.sensors
    }

    pub fn sensor_timer(&self) -> &T {
        &self.sensor_timer
    }

    pub fn sensor_timer_mut(&mut self) -> &mut T {
        &mut self.sensor_timer
    }

    pub fn button_timer_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.buttons.get_mut(idx).map(ButtonChannel::timer_mut)
    }

    pub fn team_led(&self, team: Team) -> &O {
        &self.team_leds[team.index()]
    }

    pub fn timeout_led(&self) -> &O {
        &self.timeout_led
    }
}

// ── Interrupt-shared cell ─────────────────────────────────────

/// Detector slot shared between interrupt handlers, timer callbacks and
/// the main loop.  Every access runs inside `critical_section::with`.
pub struct EdgeDetectorCell<'f, O, T> {
    inner: Mutex<RefCell<Option<EdgeDetector<'f, O, T>>>>,
}

impl<'f, O: OutputPin, T: OneShotTimer> EdgeDetectorCell<'f, O, T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install the detector; handlers are no-ops until this is called.
    pub fn install(&self, detector: EdgeDetector<'f, O, T>) {
        critical_section::with(|cs| {
            self.inner.borrow_ref_mut(cs).replace(detector);
        });
    }

    /// Remove the detector, returning it to the caller.
    pub fn take(&self) -> Option<EdgeDetector<'f, O, T>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Run `f` on the installed detector inside a critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut EdgeDetector<'f, O, T>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    pub fn sensor_pin_edge(&self, pin: u8, high: bool) {
        self.with(|d| d.sensor_pin_edge(pin, high));
    }

    pub fn button_pin_edge(&self, pin: u8, high: bool) {
        self.with(|d| d.button_pin_edge(pin, high));
    }

    pub fn sensor_release_elapsed(&self) {
        self.with(EdgeDetector::sensor_release_elapsed);
    }

    pub fn button_release_elapsed(&self, idx: usize) {
        self.with(|d| d.button_release_elapsed(idx));
    }
}

impl<O: OutputPin, T: OneShotTimer> Default for EdgeDetectorCell<'_, O, T> {
    fn default() -> Self {
        Self::new()
    }
}
