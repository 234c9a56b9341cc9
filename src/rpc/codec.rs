//! Line protocol codec.
//!
//! Wire format (UTF-8 text, `\r\n` terminated lines):
//! ```text
//!  device → peer                      peer → device
//!  ──────────────────────────────     ──────────────────────────────
//!  Team:<team>,<sensor pin>           reset
//!  TO:<team>,<button pin>             read
//!  Read:                              save\n<KEY=VALUE lines>\nEnd
//!  Line:<config line>
//! ```
//!
//! The first token of an inbound message (text before the first `:` or
//! newline, trimmed) selects the command.  For `save`, everything after
//! that delimiter is payload.

use crate::events::Team;

/// Receive buffer size for one read from the peer.
pub const RECV_BUFFER: usize = 500;

/// Offset and end of the timestamp fragment inside a `date` line.
const STAMP_START: usize = 7;
const STAMP_END: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound<'a> {
    Reset,
    Read,
    /// Payload following the command token.
    Save(&'a str),
    /// Unrecognised token; ignored.
    Unknown(&'a str),
}

/// Split an inbound message into its command and payload.
pub fn parse_command(raw: &str) -> Inbound<'_> {
    let (token, rest) = match raw.find([':', '\n']) {
        Some(at) => (&raw[..at], &raw[at + 1..]),
        None => (raw, ""),
    };
    match token.trim() {
        "reset" => Inbound::Reset,
        "read" => Inbound::Read,
        "save" => Inbound::Save(rest),
        other => Inbound::Unknown(other),
    }
}

pub fn score_line(team: Team, pin: u8) -> String {
    format!("Team:{},{}\r\n", team.number(), pin)
}

pub fn timeout_line(team: Team, pin: u8) -> String {
    format!("TO:{},{}\r\n", team.number(), pin)
}

pub const READ_HEADER: &str = "Read:\r\n";

/// `Line:` reply for one stored line, or `None` for a blank line.
pub fn config_line(line: &str) -> Option<String> {
    let line = line.trim_end();
    (!line.is_empty()).then(|| format!("Line:{line}\r\n"))
}

// ── Save payload lines ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveLine<'a> {
    /// Timestamp fragment; empty if the line was too short.
    Date(&'a str),
    End,
    /// A trimmed document line.
    Content(&'a str),
    Blank,
}

/// Classify one line of a `save` payload.
pub fn classify_save_line(line: &str) -> SaveLine<'_> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.starts_with("End") {
        SaveLine::End
    } else if line.starts_with("date") {
        SaveLine::Date(stamp_fragment(line))
    } else if line.trim().is_empty() {
        SaveLine::Blank
    } else {
        SaveLine::Content(line.trim())
    }
}

/// Characters 7..21 of a `date` line, truncated at the line end.
fn stamp_fragment(line: &str) -> &str {
    let byte_at = |n: usize| line.char_indices().nth(n).map_or(line.len(), |(i, _)| i);
    &line[byte_at(STAMP_START)..byte_at(STAMP_END)]
}

/// Length of an incomplete UTF-8 sequence at the end of `bytes`, or 0.
pub fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if b & 0xC0 != 0x80 {
            let need = match b {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                _ => 1,
            };
            return if need > back { back } else { 0 };
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tokens() {
        assert_eq!(parse_command("reset"), Inbound::Reset);
        assert_eq!(parse_command(" read \n"), Inbound::Read);
        assert_eq!(parse_command("read:"), Inbound::Read);
        assert_eq!(parse_command("save\nPORT=1\nEnd"), Inbound::Save("PORT=1\nEnd"));
        assert_eq!(parse_command("save:PORT=1"), Inbound::Save("PORT=1"));
        assert_eq!(parse_command("bogus:x"), Inbound::Unknown("bogus"));
        assert_eq!(parse_command(""), Inbound::Unknown(""));
    }

    #[test]
    fn outbound_lines() {
        assert_eq!(score_line(Team::One, 16), "Team:1,16\r\n");
        assert_eq!(timeout_line(Team::Two, 9), "TO:2,9\r\n");
        assert_eq!(config_line("PORT=5000\r").as_deref(), Some("Line:PORT=5000\r\n"));
        assert_eq!(config_line("   "), None);
    }

    #[test]
    fn utf8_tail() {
        let text = "Fuß".as_bytes();
        assert_eq!(incomplete_utf8_tail(text), 0);
        assert_eq!(incomplete_utf8_tail(&text[..3]), 1);
        assert_eq!(incomplete_utf8_tail(&"€".as_bytes()[..2]), 2);
        assert_eq!(incomplete_utf8_tail(b"plain"), 0);
        assert_eq!(incomplete_utf8_tail(b""), 0);
    }

    #[test]
    fn save_lines() {
        assert_eq!(
            classify_save_line("date=2025-01-01000000"),
            SaveLine::Date("25-01-01000000")
        );
        assert_eq!(classify_save_line("date"), SaveLine::Date(""));
        assert_eq!(classify_save_line("End\r"), SaveLine::End);
        assert_eq!(classify_save_line("  PORT=5000 \r"), SaveLine::Content("PORT=5000"));
        assert_eq!(classify_save_line(" \r"), SaveLine::Blank);
    }
}
