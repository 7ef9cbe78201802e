#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Judges an LED strip either by the exact order of on/off switches or by
//! the strip's final on/off state.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Value, json};

use super::{ExecutionOutput, JudgeInput, JudgeResult, JudgeStrategy, extract::trimmed_lines};
use crate::{
    config::LedArgs,
    constants,
    error::JudgeError,
    events::{LedEvent, LedState},
    util::{as_number, display_value, is_truthy},
};

lazy_static! {
    /// `on 3`, `ON3`, ...
    static ref ON_LINE: Regex = Regex::new(r"(?i)^on\s*(\d+)$").expect("valid regex");
    /// `off 3`, `OFF3`, ...
    static ref OFF_LINE: Regex = Regex::new(r"(?i)^off\s*(\d+)$").expect("valid regex");
}

/// Reads the LED switches of a run, stamping them with ascending sequence
/// numbers. `led` events take precedence over stdout lines.
pub fn extract_led_events(output: &ExecutionOutput) -> Vec<LedEvent> {
    let from_events: Vec<LedEvent> = output
        .events()
        .iter()
        .filter_map(|record| LedEvent::from_record(record, 0))
        .enumerate()
        .map(|(timestamp, event)| LedEvent { timestamp, ..event })
        .collect();
    if !from_events.is_empty() {
        return from_events;
    }

    trimmed_lines(output.stdout())
        .filter_map(|line| {
            let (state, caps) = if let Some(caps) = ON_LINE.captures(line) {
                (LedState::On, caps)
            } else {
                (LedState::Off, OFF_LINE.captures(line)?)
            };
            let index = caps[1].parse::<usize>().ok()?;
            Some((state, index))
        })
        .enumerate()
        .map(|(timestamp, (state, index))| LedEvent {
            state,
            index,
            timestamp,
        })
        .collect()
}

/// Final on/off state of a `width`-LED strip as a `'0'`/`'1'` string.
/// Switches beyond the strip are ignored.
pub fn final_state(events: &[LedEvent], width: usize) -> Result<String, JudgeError> {
    if width > constants::MAX_GRID_WIDTH {
        return Err(JudgeError::MalformedExpected(format!(
            "gridWidth {width} exceeds the limit of {}",
            constants::MAX_GRID_WIDTH
        )));
    }
    let mut state = vec!['0'; width];
    for event in events {
        if let Some(slot) = state.get_mut(event.index) {
            *slot = match event.state {
                LedState::On => '1',
                LedState::Off => '0',
            };
        }
    }
    Ok(state.into_iter().collect())
}

/// Expected tokens for event mode: a plain array, an `events` array, or the
/// first check's `expect` list.
fn expected_tokens(expected: &Value) -> Vec<String> {
    let list = match expected {
        Value::Array(items) => Some(items),
        Value::Object(obj) => match (obj.get("events"), obj.get("checks")) {
            (Some(Value::Array(items)), _) => Some(items),
            (_, Some(Value::Array(checks))) => checks
                .first()
                .and_then(|check| check.get("expect"))
                .and_then(Value::as_array),
            _ => None,
        },
        _ => None,
    };
    list.map(|items| items.iter().map(display_value).collect())
        .unwrap_or_default()
}

/// Expected final state: `io.cases[0].out` (trimmed) or `finalState`.
fn expected_state(expected: &Value) -> String {
    if let Value::String(state) = expected {
        return state.clone();
    }
    let io_out = expected
        .pointer("/io/cases/0/out")
        .filter(|v| is_truthy(v))
        .and_then(Value::as_str);
    if let Some(out) = io_out {
        return out.trim().to_string();
    }
    expected
        .get("finalState")
        .filter(|v| is_truthy(v))
        .map(display_value)
        .unwrap_or_default()
}

/// LED strip judging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedStrategy;

impl LedStrategy {
    /// Exact ordered equality of `on3`/`off3` tokens; timestamps are ignored.
    fn judge_event_sequence(&self, expected: &Value, events: &[LedEvent]) -> JudgeResult {
        let expected = expected_tokens(expected);
        let actual: Vec<String> = events.iter().map(LedEvent::token).collect();
        let passed = actual == expected;
        let matched = actual
            .iter()
            .zip(&expected)
            .filter(|(a, e)| a == e)
            .count();

        JudgeResult::verdict(
            passed,
            "LED event sequence matches expected",
            "LED event sequence does not match expected",
        )
        .with_maybe_details((!passed).then(|| {
            format!(
                "Expected: [{}]\nActual: [{}]",
                expected.iter().join(", "),
                actual.iter().join(", ")
            )
        }))
        .with_visualization(json!({
            "expected": expected,
            "actual": actual,
            "events": events,
        }))
        .with_metrics([
            ("expectedCount", expected.len() as f64),
            ("actualCount", actual.len() as f64),
            ("matched", matched as f64),
        ])
    }

    /// Compares the strip's final state after replaying every switch.
    fn judge_final_state(
        &self,
        expected: &Value,
        events: &[LedEvent],
        args: &LedArgs,
    ) -> Result<JudgeResult, JudgeError> {
        let width = args
            .grid_width
            .filter(|w| *w != 0.0)
            .or_else(|| as_number(expected.get("gridWidth")).filter(|w| *w != 0.0))
            .unwrap_or(constants::DEFAULT_GRID_WIDTH as f64);
        if width < 0.0 || width.fract() != 0.0 {
            return Err(JudgeError::MalformedExpected(format!(
                "gridWidth must be a positive whole number, got {width}"
            )));
        }
        let width = width as usize;

        let expected_state = expected_state(expected);
        let actual_state = final_state(events, width)?;
        let passed = actual_state == expected_state;

        Ok(JudgeResult::verdict(
            passed,
            "LED final state matches expected",
            "LED final state does not match expected",
        )
        .with_maybe_details(
            (!passed).then(|| format!("Expected: {expected_state}\nActual: {actual_state}")),
        )
        .with_visualization(json!({
            "expected": expected_state,
            "actual": actual_state,
            "events": events,
            "gridWidth": width,
        }))
        .with_metrics([
            ("gridWidth", width as f64),
            ("eventCount", events.len() as f64),
        ]))
    }
}

impl JudgeStrategy for LedStrategy {
    fn name(&self) -> &'static str {
        constants::LED
    }

    fn description(&self) -> &'static str {
        "LED sequence comparison strategy - compares LED events with expected sequence"
    }

    fn failure_message(&self) -> &'static str {
        "LED comparison failed"
    }

    fn evaluate(&self, input: &JudgeInput) -> Result<JudgeResult, JudgeError> {
        let args: LedArgs = input.parse_args(constants::LED)?;
        let events = extract_led_events(&input.output);

        if events.is_empty() {
            return Ok(JudgeResult::failed("No LED events found in execution output")
                .with_details("Expected LED events (on/off commands) in output"));
        }

        match input.expected.get("mode").and_then(Value::as_str) {
            Some("io") => self.judge_final_state(&input.expected, &events, &args),
            _ => Ok(self.judge_event_sequence(&input.expected, &events)),
        }
    }
}
