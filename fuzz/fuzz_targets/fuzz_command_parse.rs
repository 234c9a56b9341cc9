//! Fuzz target: inbound protocol messages.
//!
//! Splits the input the way a peer would send it and runs every piece
//! through the command parser and the multi-read save session.

#![no_main]

use foosboard::rpc::codec::{Inbound, parse_command};
use foosboard::rpc::engine::SaveSession;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let mut session: Option<SaveSession> = None;

    for chunk in raw.split('\u{0}') {
        if let Some(s) = session.as_mut() {
            if s.feed(chunk).is_some() {
                session = None;
            }
            continue;
        }
        if let Inbound::Save(payload) = parse_command(chunk) {
            let mut s = SaveSession::new();
            if s.feed(payload).is_none() {
                session = Some(s);
            }
        }
    }
});
