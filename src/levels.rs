#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Built-in LED levels that predate level-authored expectations.

use serde_json::{Value, json};

use crate::{
    constants,
    error::JudgeError,
    judge::{ExecutionOutput, JudgeInput, JudgeResult, JudgeStrategy, LedStrategy},
};

/// Identifiers of the built-in LED levels.
pub const LED_LEVELS: [&str; 3] = ["py-led-001", "py-led-011", "py-led-021"];

/// Expected specification of a built-in LED level.
fn preset(level_id: &str) -> Option<Value> {
    match level_id {
        "py-led-001" => Some(json!(["on0"])),
        "py-led-011" => Some(json!(["on0", "on1", "on2", "on3", "on4"])),
        "py-led-021" => Some(json!({
            "mode": "io",
            "finalState": "10101010",
            "gridWidth": constants::DEFAULT_GRID_WIDTH,
        })),
        _ => None,
    }
}

/// Judges `output` against the built-in LED level `level_id`.
///
/// Unlike strategy judging, an unknown level is an error rather than a
/// failed verdict.
pub fn judge_led_level(
    level_id: &str,
    output: &ExecutionOutput,
) -> Result<JudgeResult, JudgeError> {
    let expected =
        preset(level_id).ok_or_else(|| JudgeError::UnsupportedLevel(level_id.to_string()))?;

    let mut input = JudgeInput::builder()
        .strategy(constants::LED)
        .expected(expected)
        .output(output.clone())
        .build();
    input
        .metadata
        .insert("levelId".to_string(), Value::String(level_id.to_string()));

    Ok(LedStrategy.judge(&input))
}
