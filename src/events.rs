#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Typed reading of the executor's raw event records.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    judge::EventRecord,
    util::{as_index, display_value, is_truthy},
};

/// The `type` tag of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An LED switched on or off (`on`, `idx`).
    Led,
    /// A maze step to a cell (`x`, `y`).
    MazeStep,
    /// A maze turn (`dir`).
    MazeTurn,
    /// A played note (`track`, `pitch`, `dur`, optional `start`).
    Note,
    /// A pixel write (`x`, `y`, `value`).
    Pixel,
    /// A tempo announcement (`bpm`).
    Tempo,
    /// Anything else.
    Other,
}

impl EventKind {
    /// Classifies a record by its `type` field.
    pub fn of(record: &EventRecord) -> Self {
        match record.get("type").and_then(Value::as_str) {
            Some("led") => Self::Led,
            Some("maze_step") => Self::MazeStep,
            Some("maze_turn") => Self::MazeTurn,
            Some("note") => Self::Note,
            Some("pixel") => Self::Pixel,
            Some("tempo") => Self::Tempo,
            _ => Self::Other,
        }
    }
}

/// Text of a single field, empty when the field is missing.
fn field(record: &EventRecord, key: &str) -> String {
    record.get(key).map(display_value).unwrap_or_default()
}

/// Canonical token for an event, used when comparing event sequences.
///
/// | kind | token |
/// |---|---|
/// | led | `on3` / `off3` |
/// | maze_step | `step x y` |
/// | maze_turn | `turn dir` |
/// | note | `note track pitch dur` |
/// | pixel | `pixel x y value` |
/// | tempo | `tempo bpm` |
///
/// Unknown records fall back to their compact JSON.
pub fn token(record: &EventRecord) -> String {
    match EventKind::of(record) {
        EventKind::Led => {
            let state = if record.get("on").is_some_and(is_truthy) {
                LedState::On
            } else {
                LedState::Off
            };
            format!("{state}{}", field(record, "idx"))
        }
        EventKind::MazeStep => format!("step {} {}", field(record, "x"), field(record, "y")),
        EventKind::MazeTurn => format!("turn {}", field(record, "dir")),
        EventKind::Note => format!(
            "note {} {} {}",
            field(record, "track"),
            field(record, "pitch"),
            field(record, "dur")
        ),
        EventKind::Pixel => format!(
            "pixel {} {} {}",
            field(record, "x"),
            field(record, "y"),
            field(record, "value")
        ),
        EventKind::Tempo => format!("tempo {}", field(record, "bpm")),
        EventKind::Other => {
            serde_json::to_string(record).unwrap_or_else(|_| String::from("{}"))
        }
    }
}

/// Whether an LED was switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedState {
    /// Switched on.
    On,
    /// Switched off.
    Off,
}

impl Display for LedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedState::On => write!(f, "on"),
            LedState::Off => write!(f, "off"),
        }
    }
}

/// One LED switch, stamped with its position in the extracted sequence.
///
/// `timestamp` is a sequence number, not wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedEvent {
    /// On or off.
    #[serde(rename = "type")]
    pub state:     LedState,
    /// Which LED of the strip.
    pub index:     usize,
    /// Position in extraction order.
    pub timestamp: usize,
}

impl LedEvent {
    /// Reads an `led` record; records of other kinds or without a usable
    /// `idx` yield `None`.
    pub fn from_record(record: &EventRecord, timestamp: usize) -> Option<Self> {
        if EventKind::of(record) != EventKind::Led {
            return None;
        }
        let index = as_index(record.get("idx"))?;
        let state = if record.get("on").is_some_and(is_truthy) {
            LedState::On
        } else {
            LedState::Off
        };
        Some(Self {
            state,
            index,
            timestamp,
        })
    }

    /// The `on3` / `off3` form used by level expectations.
    pub fn token(&self) -> String {
        format!("{}{}", self.state, self.index)
    }
}
