//! Declarative config-document validation.
//!
//! A document is an ordered list of `KEY=VALUE` lines.  Validation runs in
//! four passes and accumulates every problem it finds rather than stopping
//! at the first:
//!
//! ```text
//!  lines ──▶ parse ──▶ per-attribute test ──▶ missing check ──▶ duplicate check
//!                       (unknown / invalid)    (required names)  ((kind, value) groups)
//! ```
//!
//! Lines that do not contain exactly one `=` are skipped silently.  The
//! validator never mutates its inputs and is deterministic: the same
//! schema and document always produce the same report.

pub mod schema;

use core::fmt;

use crate::animation::command::MAX_RANGES;

pub use schema::{ConfigSchema, TestKind};

/// Highest pixel index a `LEDS` range may reference.
pub const MAX_PIXEL_INDEX: u32 = 500;

// ---------------------------------------------------------------------------
// Issues and report
// ---------------------------------------------------------------------------

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    /// The attribute name is not in the schema.
    UnknownAttribute(String),
    /// The value failed the attribute's test.
    InvalidValue { attribute: String, value: String },
    /// A required attribute never appeared.
    Missing(String),
    /// Several attributes of the same kind share one value.
    Duplicate { value: String, attributes: Vec<String> },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAttribute(name) => write!(f, "Error: Unknown attribute {name}"),
            Self::InvalidValue { attribute, value } => {
                write!(f, "Error: {value} invalid for {attribute}")
            }
            Self::Missing(name) => write!(f, "Error: {name} is missing"),
            Self::Duplicate { value, attributes } => write!(
                f,
                "Error: Duplicated value '{value}' found in attributes: {}",
                attributes.join(", ")
            ),
        }
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    issues: Vec<ConfigIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    /// Human-readable error lines, one per issue.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    /// Emit every issue at `warn` level.
    pub fn log(&self) {
        for issue in &self.issues {
            log::warn!("config: {issue}");
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Split a document line into `(attribute, value)`.
///
/// Returns `None` unless the line holds exactly one `=`.  Both halves are
/// trimmed.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    let (attribute, value) = line.split_once('=')?;
    if value.contains('=') {
        return None;
    }
    Some((attribute.trim(), value.trim()))
}

/// Validate `lines` against `schema`.
pub fn validate<S: AsRef<str>>(schema: &ConfigSchema, lines: &[S]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen: Vec<(&str, &str)> = Vec::new();

    for (attribute, value) in lines.iter().filter_map(|l| parse_line(l.as_ref())) {
        seen.push((attribute, value));
        match schema.kind_of(attribute) {
            None => issues.push(ConfigIssue::UnknownAttribute(attribute.to_owned())),
            Some(kind) if !value_passes(schema, kind, value) => {
                issues.push(ConfigIssue::InvalidValue {
                    attribute: attribute.to_owned(),
                    value: value.to_owned(),
                });
            }
            Some(_) => {}
        }
    }

    for (name, _) in schema.required() {
        if !seen.iter().any(|(a, _)| *a == name) {
            issues.push(ConfigIssue::Missing(name.to_owned()));
        }
    }

    // (kind, value) -> attributes, in first-seen order.
    let mut groups: Vec<(TestKind, &str, Vec<String>)> = Vec::new();
    for (attribute, value) in &seen {
        let Some(kind) = schema.kind_of(attribute) else {
            continue;
        };
        if !kind.rejects_duplicates() {
            continue;
        }
        match groups.iter_mut().find(|(k, v, _)| *k == kind && v == value) {
            Some((_, _, attrs)) => attrs.push((*attribute).to_owned()),
            None => groups.push((kind, value, vec![(*attribute).to_owned()])),
        }
    }
    for (_, value, attributes) in groups {
        if attributes.len() > 1 {
            issues.push(ConfigIssue::Duplicate {
                value: value.to_owned(),
                attributes,
            });
        }
    }

    ValidationReport { issues }
}

/// Run the test for `kind` against `value`.
pub fn value_passes(schema: &ConfigSchema, kind: TestKind, value: &str) -> bool {
    let number = parse_digits(value);
    match kind {
        TestKind::Leds => parse_led_ranges(value).is_some(),
        TestKind::Port => number.is_some_and(|n| n <= u64::from(u16::MAX)),
        TestKind::Time => number.is_some_and(|n| (1..=60_000).contains(&n)),
        TestKind::Int => number.is_some(),
        TestKind::Toggle => number.is_some_and(|n| n <= 1),
        TestKind::Pin => number.is_some_and(|n| in_set(schema.valid_pins(), n)),
        TestKind::Sda => number.is_some_and(|n| u32::try_from(n).is_ok_and(|v| schema.is_sda(v))),
        TestKind::Scl => number.is_some_and(|n| u32::try_from(n).is_ok_and(|v| schema.is_scl(v))),
        TestKind::I2c => number.is_some_and(|n| in_set(schema.i2c_ids(), n)),
        TestKind::Sm => number.is_some_and(|n| in_set(schema.sm_ids(), n)),
    }
}

/// Parse a `LEDS` value into inclusive pixel ranges.
///
/// Double quotes are stripped first.  Returns `None` if any pair is
/// malformed or out of order, exceeds [`MAX_PIXEL_INDEX`], or there are
/// more than [`MAX_RANGES`] pairs.
pub fn parse_led_ranges(value: &str) -> Option<Vec<(u16, u16)>> {
    let cleaned: String = value.chars().filter(|c| *c != '"').collect();
    if cleaned.split(';').count() > MAX_RANGES {
        return None;
    }
    cleaned
        .split(';')
        .map(|pair| {
            let (start, end) = pair.split_once('-')?;
            let start = parse_digits(start)?;
            let end = parse_digits(end)?;
            (start <= end && end <= u64::from(MAX_PIXEL_INDEX)).then_some((start as u16, end as u16))
        })
        .collect()
}

/// Unsigned decimal with no sign, whitespace or other characters.
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn in_set(set: &[u32], n: u64) -> bool {
    u32::try_from(n).is_ok_and(|v| set.contains(&v))
}
