//! Integration tests for the control protocol: scripted peer → engine →
//! config store.

use foosboard::adapters::file_store::MemoryConfigStore;
use foosboard::app::ports::{ConfigStore, RemoteLink};
use foosboard::rpc::engine::{ProtocolEngine, ProtocolEvent, SaveOutcome};
use foosboard::validation::ConfigIssue;

use crate::mock_hw::{MockListener, Wire, schema, shipped_lines};

const DATE_LINE: &str = "date=2025-03-01123045";
const STAMP: &str = "25-03-01123045";

fn save_message(date: Option<&str>, lines: &[String]) -> String {
    let mut msg = String::from("save\n");
    if let Some(d) = date {
        msg.push_str(d);
        msg.push('\n');
    }
    for l in lines {
        msg.push_str(l);
        msg.push('\n');
    }
    msg.push_str("End\n");
    msg
}

fn edited(from: &str, to: &str) -> Vec<String> {
    shipped_lines()
        .into_iter()
        .map(|l| if l == from { to.to_string() } else { l })
        .collect()
}

/// Engine with one accepted client and a store holding the shipped document.
fn connected() -> (ProtocolEngine<MockListener>, Wire, Harness) {
    let listener = MockListener::new();
    let wire = listener.connect();
    let mut engine = ProtocolEngine::new(listener.clone(), schema());
    let mut store = MemoryConfigStore::with_lines(&shipped_lines());
    let events = engine.poll(&mut store);
    assert_eq!(
        events,
        [ProtocolEvent::Connected {
            peer: "10.0.0.7".into(),
            count: 1
        }]
    );
    (engine, wire, Harness { store, listener })
}

struct Harness {
    store: MemoryConfigStore,
    listener: MockListener,
}

// ── read ──────────────────────────────────────────────────────

#[test]
fn read_replies_with_header_and_every_line() {
    let (mut engine, wire, mut h) = connected();
    wire.push("read");

    let events = engine.poll(&mut h.store);

    let expected = shipped_lines().len();
    assert_eq!(events, [ProtocolEvent::ConfigSent(expected)]);
    let sent = wire.sent();
    assert_eq!(sent[0], "Read:\r\n");
    assert_eq!(sent[1], "Line:PORT=5000\r\n");
    assert_eq!(sent.len(), expected + 1);
    assert!(sent[1..].iter().all(|l| l.starts_with("Line:") && l.ends_with("\r\n")));
}

// ── save ──────────────────────────────────────────────────────

#[test]
fn save_backs_up_then_writes() {
    let (mut engine, wire, mut h) = connected();
    let new_doc = edited("PORT=5000", "PORT=5001");
    wire.push(&save_message(Some(DATE_LINE), &new_doc));

    let events = engine.poll(&mut h.store);

    assert_eq!(
        events,
        [ProtocolEvent::Saved(SaveOutcome::Written {
            stamp: STAMP.into()
        })]
    );
    assert_eq!(h.store.backups().get(STAMP), Some(&shipped_lines()));
    assert_eq!(h.store.read_lines().unwrap(), new_doc);
    assert_eq!(h.store.writes(), 1);
}

#[test]
fn save_spanning_reads_is_staged_until_end() {
    let (mut engine, wire, mut h) = connected();
    let new_doc = edited("DEBUGMODE=0", "DEBUGMODE=1");
    let (head, tail) = new_doc.split_at(10);

    let mut first = format!("save\n{DATE_LINE}\n");
    for l in head {
        first.push_str(l);
        first.push('\n');
    }
    wire.push(&first);
    assert!(engine.poll(&mut h.store).is_empty());
    assert!(engine.save_pending());

    let mut rest = String::new();
    for l in tail {
        rest.push_str(l);
        rest.push_str("\r\n");
    }
    rest.push_str("End\r\n");
    wire.push(&rest);

    let events = engine.poll(&mut h.store);
    assert!(matches!(events[..], [ProtocolEvent::Saved(SaveOutcome::Written { .. })]));
    assert!(!engine.save_pending());
    assert_eq!(h.store.read_lines().unwrap(), new_doc);
}

#[test]
fn save_cut_mid_line_and_mid_end_is_reassembled() {
    let (mut engine, wire, mut h) = connected();
    let mut new_doc = edited("PORT=5000", "PORT=5001");
    new_doc.insert(0, "# Tischfußball".to_string());
    let bytes = save_message(Some(DATE_LINE), &new_doc).into_bytes();

    // Cut inside "PORT=5001", inside the two-byte "ß", and inside "End".
    let port_at = find(&bytes, b"PORT=50") + 7;
    let eszett_at = find(&bytes, "ß".as_bytes()) + 1;
    let end_at = bytes.len() - 3;
    let mut cuts = vec![eszett_at, port_at, end_at];
    cuts.sort_unstable();

    let mut from = 0;
    for to in cuts {
        wire.push_bytes(&bytes[from..to]);
        assert!(engine.poll(&mut h.store).is_empty());
        assert!(engine.save_pending());
        from = to;
    }
    wire.push_bytes(&bytes[from..]);

    let events = engine.poll(&mut h.store);
    assert_eq!(
        events,
        [ProtocolEvent::Saved(SaveOutcome::Written {
            stamp: STAMP.into()
        })]
    );
    assert_eq!(h.store.read_lines().unwrap(), new_doc);
}

fn find(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap()
}

#[test]
fn identical_save_is_not_written() {
    let (mut engine, wire, mut h) = connected();
    wire.push(&save_message(Some(DATE_LINE), &shipped_lines()));

    let events = engine.poll(&mut h.store);

    assert_eq!(events, [ProtocolEvent::Saved(SaveOutcome::Unchanged)]);
    assert_eq!(h.store.writes(), 0);
    assert!(h.store.backups().is_empty());
}

#[test]
fn invalid_save_is_rejected_with_report() {
    let (mut engine, wire, mut h) = connected();
    let bad = edited("PORT=5000", "PORT=abc");
    wire.push(&save_message(Some(DATE_LINE), &bad));

    let events = engine.poll(&mut h.store);

    let [ProtocolEvent::Saved(SaveOutcome::Invalid(report))] = &events[..] else {
        panic!("expected an invalid save, got {events:?}");
    };
    assert!(report.issues().contains(&ConfigIssue::InvalidValue {
        attribute: "PORT".into(),
        value: "abc".into(),
    }));
    assert_eq!(h.store.writes(), 0);
    assert_eq!(h.store.read_lines().unwrap(), shipped_lines());
}

#[test]
fn duplicate_pins_are_rejected() {
    let (mut engine, wire, mut h) = connected();
    let bad = edited("LED2=26", "LED2=25");
    wire.push(&save_message(Some(DATE_LINE), &bad));

    let events = engine.poll(&mut h.store);

    let [ProtocolEvent::Saved(SaveOutcome::Invalid(report))] = &events[..] else {
        panic!("expected an invalid save, got {events:?}");
    };
    assert!(report.issues().iter().any(|i| matches!(
        i,
        ConfigIssue::Duplicate { value, attributes } if value == "25" && attributes == &["LED1", "LED2"]
    )));
}

#[test]
fn save_without_date_is_rejected() {
    let (mut engine, wire, mut h) = connected();
    wire.push(&save_message(None, &edited("PORT=5000", "PORT=5001")));

    let events = engine.poll(&mut h.store);

    assert_eq!(events, [ProtocolEvent::Saved(SaveOutcome::NoTimestamp)]);
    assert_eq!(h.store.writes(), 0);
}

#[test]
fn save_into_empty_store_skips_backup() {
    let listener = MockListener::new();
    let wire = listener.connect();
    let mut engine = ProtocolEngine::new(listener, schema());
    let mut store = MemoryConfigStore::new();
    engine.poll(&mut store);

    wire.push(&save_message(Some(DATE_LINE), &shipped_lines()));
    let events = engine.poll(&mut store);

    assert!(matches!(events[..], [ProtocolEvent::Saved(SaveOutcome::Written { .. })]));
    assert!(store.backups().is_empty());
    assert_eq!(store.read_lines().unwrap(), shipped_lines());
}

// ── session lifecycle ─────────────────────────────────────────

#[test]
fn reset_is_reported() {
    let (mut engine, wire, mut h) = connected();
    wire.push("reset\r\n");
    assert_eq!(engine.poll(&mut h.store), [ProtocolEvent::ResetRequested]);
}

#[test]
fn unknown_commands_are_ignored() {
    let (mut engine, wire, mut h) = connected();
    wire.push("hello:world");
    assert!(engine.poll(&mut h.store).is_empty());
    assert!(wire.sent().is_empty());
    assert!(engine.is_connected());
}

#[test]
fn hang_up_then_next_client_is_counted() {
    let (mut engine, wire, mut h) = connected();
    wire.hang_up();

    assert_eq!(engine.poll(&mut h.store), [ProtocolEvent::Disconnected]);
    assert!(!engine.is_connected());
    assert!(!engine.send_line("Team:1,34\r\n"));

    let second = h.listener.connect();
    let events = engine.poll(&mut h.store);
    assert_eq!(
        events,
        [ProtocolEvent::Connected {
            peer: "10.0.0.7".into(),
            count: 2
        }]
    );
    assert_eq!(engine.connection_count(), 2);
    assert!(engine.send_line("TO:2,33\r\n"));
    assert_eq!(second.sent(), ["TO:2,33\r\n"]);
    assert!(wire.sent().is_empty());
}

#[test]
fn close_drops_pending_save() {
    let (mut engine, wire, mut h) = connected();
    wire.push(&format!("save\n{DATE_LINE}\nPORT=5001\n"));
    engine.poll(&mut h.store);
    assert!(engine.save_pending());

    engine.close();
    assert!(!engine.save_pending());
    assert!(!engine.is_connected());
}
