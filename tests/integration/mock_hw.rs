//! Mock adapters for integration tests.
//!
//! A character-grid LCD, a recording event sink, and an in-memory
//! listener whose clients are scripted from the test body.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use foosboard::app::events::AppEvent;
use foosboard::app::ports::{DisplayPort, EventSink, InputLevels};
use foosboard::config::ControllerConfig;
use foosboard::rpc::transport::{Listener, Transport};
use foosboard::validation::ConfigSchema;

pub const SHIPPED_SCHEMA: &str = include_str!("../../config/schema.txt");
pub const SHIPPED_CONFIG: &str = include_str!("../../config/scoreboard.cfg");

pub fn schema() -> ConfigSchema {
    ConfigSchema::parse(SHIPPED_SCHEMA).unwrap()
}

pub fn shipped_lines() -> Vec<String> {
    SHIPPED_CONFIG.lines().map(str::to_string).collect()
}

pub fn config() -> ControllerConfig {
    ControllerConfig::from_lines(&shipped_lines()).unwrap()
}

// ── MockLcd ───────────────────────────────────────────────────

/// 20x4 character grid with a write cursor.
pub struct MockLcd {
    grid: [[char; 20]; 4],
    col: usize,
    row: usize,
    pub powered: bool,
}

#[allow(dead_code)]
impl MockLcd {
    pub fn new() -> Self {
        Self {
            grid: [[' '; 20]; 4],
            col: 0,
            row: 0,
            powered: true,
        }
    }

    pub fn row(&self, row: usize) -> String {
        self.grid[row].iter().collect::<String>().trim_end().to_string()
    }

    pub fn rows(&self) -> Vec<String> {
        (0..4).map(|r| self.row(r)).collect()
    }

    pub fn shows(&self, text: &str) -> bool {
        self.rows().iter().any(|r| r.contains(text))
    }
}

impl Default for MockLcd {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for MockLcd {
    fn clear(&mut self) {
        self.grid = [[' '; 20]; 4];
        self.col = 0;
        self.row = 0;
    }

    fn move_to(&mut self, col: u8, row: u8) {
        self.col = usize::from(col);
        self.row = usize::from(row);
    }

    fn put_str(&mut self, text: &str) {
        for c in text.chars() {
            if self.row < 4 && self.col < 20 {
                self.grid[self.row][self.col] = c;
            }
            self.col += 1;
        }
    }

    fn power_off(&mut self) {
        self.clear();
        self.powered = false;
    }
}

// ── Event recording ───────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

/// Fixed input levels for the test-input screen.
pub struct FixedLevels(pub [bool; 5]);

impl InputLevels for FixedLevels {
    fn levels(&self) -> [bool; 5] {
        self.0
    }
}

/// Delay that returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── Scripted network ──────────────────────────────────────────

/// Both directions of one scripted client connection.
///
/// `None` in the inbound queue simulates the peer hanging up.
#[derive(Clone, Default)]
pub struct Wire {
    inbound: Rc<RefCell<VecDeque<Option<Vec<u8>>>>>,
    outbound: Rc<RefCell<Vec<String>>>,
}

#[allow(dead_code)]
impl Wire {
    /// Queue one message, delivered by a single read.
    pub fn push(&self, msg: &str) {
        self.push_bytes(msg.as_bytes());
    }

    /// Queue raw bytes, delivered by a single read.
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.inbound.borrow_mut().push_back(Some(bytes.to_vec()));
    }

    pub fn hang_up(&self) {
        self.inbound.borrow_mut().push_back(None);
    }

    /// Every line the device wrote, in order.
    pub fn sent(&self) -> Vec<String> {
        self.outbound.borrow().clone()
    }
}

pub struct MockConn(Wire);

impl Transport for MockConn {
    type Error = &'static str;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.0.inbound.borrow_mut().pop_front() {
            Some(Some(msg)) => {
                let n = msg.len().min(buf.len());
                buf[..n].copy_from_slice(&msg[..n]);
                Ok(n)
            }
            Some(None) => Err("closed"),
            None => Ok(0),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0
            .outbound
            .borrow_mut()
            .push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }
}

/// Listener whose pending clients are queued by [`MockListener::connect`].
#[derive(Clone, Default)]
pub struct MockListener {
    pending: Rc<RefCell<VecDeque<Wire>>>,
}

impl MockListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a client for the next accept and return its wire.
    pub fn connect(&self) -> Wire {
        let wire = Wire::default();
        self.pending.borrow_mut().push_back(wire.clone());
        wire
    }
}

impl Listener for MockListener {
    type Conn = MockConn;

    fn poll_accept(&mut self) -> Option<(MockConn, String)> {
        let wire = self.pending.borrow_mut().pop_front()?;
        Some((MockConn(wire), "10.0.0.7".to_string()))
    }

    fn port(&self) -> u16 {
        5000
    }
}
