//! Control protocol engine: one remote peer, polled from the main loop.
//!
//! **Listener-generic**: the engine owns a [`Listener`] and at most one
//! client connection.  Each [`poll`](ProtocolEngine::poll) performs one
//! short read on the connected client (dispatching whatever command it
//! carried), then one non-blocking accept.  Any read or send failure drops
//! the client; accepting resumes on the next poll.
//!
//! `save` payloads may span several reads: lines are staged in a
//! [`SaveSession`] until the `End` line arrives.  The session is
//! discarded if the peer disconnects first.

use log::{debug, error, info, warn};

use crate::app::ports::{ConfigStore, RemoteLink};
use crate::error::StorageError;
use crate::validation::schema::ConfigSchema;
use crate::validation::{ValidationReport, validate};

use super::codec::{
    Inbound, READ_HEADER, RECV_BUFFER, SaveLine, classify_save_line, config_line,
    incomplete_utf8_tail, parse_command,
};
use super::transport::{Listener, Transport};

// ── Save staging ──────────────────────────────────────────────

/// A `save` document being received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSession {
    lines: Vec<String>,
    stamp: Option<String>,
    /// Text after the last newline seen; completed by the next feed.
    partial: String,
}

/// A staged document whose `End` line has arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDocument {
    pub lines: Vec<String>,
    /// Timestamp fragment from the last `date` line, if non-empty.
    pub stamp: Option<String>,
}

impl SaveSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `payload`.  Returns the finished document when an `End` line
    /// is seen; anything after it in the same payload is ignored.
    ///
    /// Reads may end mid-line: an unterminated tail is held back and
    /// prefixed to the next payload, unless it already reads as `End`.
    pub fn feed(&mut self, payload: &str) -> Option<StagedDocument> {
        let mut text = core::mem::take(&mut self.partial);
        text.push_str(payload);
        let (complete, tail) = text.rsplit_once('\n').unwrap_or(("", text.as_str()));

        for line in complete.split('\n') {
            if self.stage(line) {
                return Some(self.finish());
            }
        }
        if classify_save_line(tail) == SaveLine::End {
            return Some(self.finish());
        }
        self.partial = tail.to_string();
        None
    }

    /// Stage one complete line; `true` on `End`.
    fn stage(&mut self, line: &str) -> bool {
        debug!("proto: received {:?}", line);
        match classify_save_line(line) {
            SaveLine::End => return true,
            SaveLine::Date(stamp) => {
                self.stamp = (!stamp.is_empty()).then(|| stamp.to_string());
            }
            SaveLine::Content(text) => self.lines.push(text.to_string()),
            SaveLine::Blank => {}
        }
        false
    }

    fn finish(&mut self) -> StagedDocument {
        let done = core::mem::take(self);
        StagedDocument {
            lines: done.lines,
            stamp: done.stamp,
        }
    }

    pub fn staged_lines(&self) -> &[String] {
        &self.lines
    }
}

// ── Outcomes ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Old document backed up under `<name><stamp>`, new one written.
    Written { stamp: String },
    /// Stored document already matches; nothing written.
    Unchanged,
    NoTimestamp,
    Invalid(ValidationReport),
    Storage(StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    Connected { peer: String, count: u32 },
    Disconnected,
    /// The peer asked for a device restart.
    ResetRequested,
    /// `read` answered with this many `Line:` replies.
    ConfigSent(usize),
    Saved(SaveOutcome),
}

// ── Engine ────────────────────────────────────────────────────

pub struct ProtocolEngine<L: Listener> {
    listener: L,
    client: Option<L::Conn>,
    connections: u32,
    session: Option<SaveSession>,
    /// Bytes of a UTF-8 sequence cut off by the last read.
    rx_carry: Vec<u8>,
    schema: ConfigSchema,
}

impl<L: Listener> ProtocolEngine<L> {
    pub fn new(listener: L, schema: ConfigSchema) -> Self {
        Self {
            listener,
            client: None,
            connections: 0,
            session: None,
            rx_carry: Vec::new(),
            schema,
        }
    }

    pub fn port(&self) -> u16 {
        self.listener.port()
    }

    /// Clients accepted since startup.
    pub fn connection_count(&self) -> u32 {
        self.connections
    }

    /// Whether a multi-read `save` is waiting for its `End` line.
    pub fn save_pending(&self) -> bool {
        self.session.is_some()
    }

    /// One protocol step: read and dispatch, then poll for a new client.
    pub fn poll(&mut self, store: &mut impl ConfigStore) -> Vec<ProtocolEvent> {
        let mut events = Vec::new();
        if self.client.is_some() {
            self.service_client(store, &mut events);
        }
        if self.client.is_none() {
            if let Some((conn, peer)) = self.listener.poll_accept() {
                self.connections += 1;
                self.session = None;
                self.rx_carry.clear();
                self.client = Some(conn);
                info!("proto: connected to {} (connection #{})", peer, self.connections);
                events.push(ProtocolEvent::Connected {
                    peer,
                    count: self.connections,
                });
            }
        }
        events
    }

    /// Drop the client, if any.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            info!("proto: client closed");
        }
        self.session = None;
        self.rx_carry.clear();
    }

    fn service_client(&mut self, store: &mut impl ConfigStore, events: &mut Vec<ProtocolEvent>) {
        let mut buf = [0u8; RECV_BUFFER];
        let n = match self.client.as_mut().map(|c| c.read(&mut buf)) {
            Some(Ok(n)) => n,
            Some(Err(e)) => {
                debug!("proto: read failed: {:?}", e);
                self.close();
                events.push(ProtocolEvent::Disconnected);
                return;
            }
            None => return,
        };
        if n == 0 {
            return;
        }
        let raw = self.decode(&buf[..n]);
        if raw.is_empty() {
            return;
        }
        info!("proto: read from socket: {:?}", raw);

        if let Some(mut session) = self.session.take() {
            // Continuation of a staged save.
            if let Some(doc) = session.feed(&raw) {
                events.push(ProtocolEvent::Saved(self.finish_save(doc, store)));
            } else {
                self.session = Some(session);
            }
            return;
        }

        match parse_command(&raw) {
            Inbound::Reset => {
                info!("proto: resetting");
                events.push(ProtocolEvent::ResetRequested);
            }
            Inbound::Read => {
                info!("proto: reading config");
                if let Some(sent) = self.send_config(store) {
                    events.push(ProtocolEvent::ConfigSent(sent));
                } else if self.client.is_none() {
                    events.push(ProtocolEvent::Disconnected);
                }
            }
            Inbound::Save(payload) => {
                info!("proto: saving config");
                let mut session = SaveSession::new();
                match session.feed(payload) {
                    Some(doc) => events.push(ProtocolEvent::Saved(self.finish_save(doc, store))),
                    None => self.session = Some(session),
                }
            }
            Inbound::Unknown(token) => debug!("proto: ignoring command {:?}", token),
        }
    }

    /// Decode `bytes` after any carried-over prefix.  An incomplete
    /// trailing UTF-8 sequence is kept for the next read.
    fn decode(&mut self, bytes: &[u8]) -> String {
        let mut data = core::mem::take(&mut self.rx_carry);
        data.extend_from_slice(bytes);
        let keep = data.len() - incomplete_utf8_tail(&data);
        self.rx_carry = data.split_off(keep);
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Reply to `read`.  `None` if the store failed or a send dropped the client.
    fn send_config(&mut self, store: &impl ConfigStore) -> Option<usize> {
        let lines = match store.read_lines() {
            Ok(lines) => lines,
            Err(e) => {
                error!("proto: cannot read config: {}", e);
                return None;
            }
        };
        if !self.send_line(READ_HEADER) {
            return None;
        }
        let mut sent = 0;
        for reply in lines.iter().filter_map(|l| config_line(l)) {
            if !self.send_line(&reply) {
                return None;
            }
            sent += 1;
        }
        Some(sent)
    }

    /// Validate, compare, back up and write a finished `save`.
    pub fn finish_save(&self, doc: StagedDocument, store: &mut impl ConfigStore) -> SaveOutcome {
        let report = validate(&self.schema, &doc.lines);
        if !report.is_valid() {
            report.log();
            error!("proto: invalid config - write aborted");
            return SaveOutcome::Invalid(report);
        }
        let Some(stamp) = doc.stamp else {
            warn!("proto: no date stamp found - write aborted");
            return SaveOutcome::NoTimestamp;
        };
        let current = match store.read_lines() {
            Ok(lines) => lines,
            Err(StorageError::NotFound) => Vec::new(),
            Err(e) => return SaveOutcome::Storage(e),
        };
        if normalise(&current) == doc.lines {
            warn!("proto: new config same as old config - write aborted");
            return SaveOutcome::Unchanged;
        }
        if !current.is_empty() {
            if let Err(e) = store.backup(&stamp) {
                error!("proto: backup failed: {}", e);
                return SaveOutcome::Storage(e);
            }
            info!("proto: old config backed up with suffix {}", stamp);
        }
        if let Err(e) = store.write_lines(&doc.lines) {
            error!("proto: write failed: {}", e);
            return SaveOutcome::Storage(e);
        }
        info!("proto: config written");
        SaveOutcome::Written { stamp }
    }
}

impl<L: Listener> RemoteLink for ProtocolEngine<L> {
    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn send_line(&mut self, line: &str) -> bool {
        let Some(client) = self.client.as_mut() else {
            return false;
        };
        match client.write_all(line.as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                warn!("proto: send failed, closing: {:?}", e);
                self.close();
                false
            }
        }
    }
}

/// Trimmed, non-empty lines.
fn normalise(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
