//! Fuzz target: config documents and schemas.
//!
//! Feeds arbitrary text both as a document against the shipped schema and
//! as a schema of its own, then converts any document that validates.
//! Must never panic, and validation must be repeatable.

#![no_main]

use foosboard::config::ControllerConfig;
use foosboard::validation::{ConfigSchema, validate};
use libfuzzer_sys::fuzz_target;

const SHIPPED_SCHEMA: &str = include_str!("../../config/schema.txt");

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let lines: Vec<&str> = text.lines().collect();

    if let Ok(schema) = ConfigSchema::parse(SHIPPED_SCHEMA) {
        let report = validate(&schema, &lines);
        assert_eq!(report, validate(&schema, &lines));
        if report.is_valid() {
            let _ = ControllerConfig::from_lines(&lines);
        }
    }

    if let Ok(schema) = ConfigSchema::parse(text) {
        let _ = validate(&schema, &lines);
    }
});
