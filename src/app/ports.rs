//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller / ProtocolEngine (domain)
//! ```
//!
//! Driven adapters (character display, remote link, config file, event
//! log) implement these traits.  The [`Controller`](super::service::Controller)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::error::StorageError;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → character LCD)
// ───────────────────────────────────────────────────────────────

/// A character display addressed by column and row.
pub trait DisplayPort {
    /// Number of visible columns.
    fn columns(&self) -> usize {
        20
    }

    fn clear(&mut self);

    /// Place the write cursor.
    fn move_to(&mut self, col: u8, row: u8);

    /// Write `text` at the cursor, advancing it.
    fn put_str(&mut self, text: &str);

    /// Blank the panel and switch the backlight off.
    fn power_off(&mut self);

    /// Overwrite `row` from column 0, padding to the full width.
    fn write_row(&mut self, row: u8, text: &str) {
        let width = self.columns();
        let padded: String = text.chars().chain(core::iter::repeat(' ')).take(width).collect();
        self.move_to(0, row);
        self.put_str(&padded);
    }
}

// ───────────────────────────────────────────────────────────────
// Remote link port (driven adapter: domain → connected peer)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the control connection.
pub trait RemoteLink {
    fn is_connected(&self) -> bool;

    /// Send one protocol line.  A failed send tears the connection down;
    /// the return value only reports whether the line went out.
    fn send_line(&mut self, line: &str) -> bool;
}

/// Link used when no control server is running.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPeer;

impl RemoteLink for NoPeer {
    fn is_connected(&self) -> bool {
        false
    }

    fn send_line(&mut self, _line: &str) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Config store port (driven adapter: domain ↔ config file)
// ───────────────────────────────────────────────────────────────

/// The persisted `KEY=VALUE` configuration document.
///
/// Callers validate before calling [`write_lines`](Self::write_lines);
/// the store itself never inspects content.
pub trait ConfigStore {
    /// Every line of the stored document, without terminators.
    fn read_lines(&self) -> Result<Vec<String>, StorageError>;

    /// Copy the stored document to `<name><suffix>`.
    fn backup(&mut self, suffix: &str) -> Result<(), StorageError>;

    /// Replace the stored document.
    fn write_lines(&mut self, lines: &[String]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Raw input port (driven adapter: GPIO → test-input screen)
// ───────────────────────────────────────────────────────────────

/// Instantaneous levels of the inputs shown on the test-input screen:
/// three goal sensors, then the two timeout buttons.
pub trait InputLevels {
    fn levels(&self) -> [bool; 5];
}
