#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Ordered comparison of discrete event tokens (LED switches, maze moves,
//! notes, pixel writes, ...).

use serde_json::{Value, json};

use super::{ExecutionOutput, JudgeInput, JudgeResult, JudgeStrategy, extract::trimmed_lines};
use crate::{constants, error::JudgeError, events, util::display_value};

/// Outcome of a lockstep token comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceComparison {
    /// Whether both sequences are identical.
    pub passed:     bool,
    /// Why they differ, if they do.
    pub details:    Option<String>,
    /// First index at which they diverge.
    pub diff_index: Option<usize>,
    /// Tokens that matched before the divergence.
    pub matched:    usize,
}

/// Compares two token sequences.
///
/// Different lengths fail immediately with `diff_index` at the shorter
/// length; otherwise the first mismatching index is reported.
pub fn compare_sequences(expected: &[String], actual: &[String]) -> SequenceComparison {
    if expected.len() != actual.len() {
        return SequenceComparison {
            passed:     false,
            details:    Some(format!(
                "Event count mismatch: expected {}, got {}",
                expected.len(),
                actual.len()
            )),
            diff_index: Some(expected.len().min(actual.len())),
            matched:    0,
        };
    }

    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        Some(i) => SequenceComparison {
            passed:     false,
            details:    Some(format!(
                "Event mismatch at index {i}: expected \"{}\", got \"{}\"",
                expected[i], actual[i]
            )),
            diff_index: Some(i),
            matched:    i,
        },
        None => SequenceComparison {
            passed:     true,
            details:    None,
            diff_index: None,
            matched:    expected.len(),
        },
    }
}

/// Tokens of the actual run: one per event, or one per non-empty stdout line
/// when no events were recorded.
fn actual_tokens(output: &ExecutionOutput) -> Vec<String> {
    let events = output.events();
    if !events.is_empty() {
        return events.iter().map(events::token).collect();
    }
    trimmed_lines(output.stdout()).map(String::from).collect()
}

/// Reads the expected tokens from an array, an object with an
/// `events`/`expect`/`sequence` array, or a newline-delimited string.
fn expected_tokens(expected: &Value) -> Vec<String> {
    let list = match expected {
        Value::Array(items) => Some(items),
        Value::Object(obj) => ["events", "expect", "sequence"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array)),
        Value::String(text) => {
            return text
                .lines()
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
        }
        _ => None,
    };
    list.map(|items| items.iter().map(display_value).collect())
        .unwrap_or_default()
}

/// Generic ordered event-sequence comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventSeqStrategy;

impl JudgeStrategy for EventSeqStrategy {
    fn name(&self) -> &'static str {
        constants::EVENT_SEQ
    }

    fn description(&self) -> &'static str {
        "Event sequence comparison strategy - compares event sequences"
    }

    fn failure_message(&self) -> &'static str {
        "Event sequence comparison failed"
    }

    fn evaluate(&self, input: &JudgeInput) -> Result<JudgeResult, JudgeError> {
        let actual = actual_tokens(&input.output);
        let expected = expected_tokens(&input.expected);

        if expected.is_empty() {
            return Ok(JudgeResult::failed("No expected events provided")
                .with_details("Expected events array is empty or invalid"));
        }

        let comparison = compare_sequences(&expected, &actual);
        let diff_index = comparison.diff_index.map_or(-1.0, |i| i as f64);

        Ok(JudgeResult::verdict(
            comparison.passed,
            "Event sequence matches expected",
            "Event sequence does not match expected",
        )
        .with_maybe_details(comparison.details)
        .with_visualization(json!({
            "expected": expected,
            "actual": actual,
            "diffIndex": comparison.diff_index,
        }))
        .with_metrics([
            ("expectedCount", expected.len() as f64),
            ("actualCount", actual.len() as f64),
            ("matched", comparison.matched as f64),
            ("diffIndex", diff_index),
        ]))
    }
}
