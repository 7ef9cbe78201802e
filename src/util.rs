#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Lenient conversions shared by the strategies.
//!
//! Level authors and executors hand us loosely-typed JSON and text. These
//! helpers pin down exactly how such values turn into numbers and tokens so
//! every strategy reads them the same way the reference grader did.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// A complete decimal literal, as accepted by `Number(...)`.
    static ref DECIMAL_LITERAL: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid regex");
    /// The longest decimal prefix, as consumed by `parseFloat(...)`.
    static ref DECIMAL_PREFIX: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid regex");
    /// The longest integer prefix, as consumed by `parseInt(...)`.
    static ref INTEGER_PREFIX: Regex = Regex::new(r"^[+-]?\d+").expect("valid regex");
}

/// Whether a JSON value counts as "set" (non-zero, non-empty, non-null).
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Formats a number the way a level author would write it: integral values
/// without a fractional part.
pub fn fmt_num(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e21 {
        // `as i64` also folds -0 into 0
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Renders any JSON value as plain text, e.g. for comparing against a list of
/// expected tokens.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(fmt_num).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Converts a whole string to a number, yielding NaN when it is not one.
/// Blank input is zero.
pub fn strict_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(f64::NAN);
        }
    }
    if DECIMAL_LITERAL.is_match(text) {
        text.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// Reads the leading integer of `text`, ignoring anything after it.
pub fn int_prefix(text: &str) -> Option<i64> {
    INTEGER_PREFIX
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Reads the leading decimal number of `text`, ignoring anything after it.
pub fn float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    if let Some(rest) = text.strip_prefix('-')
        && rest.starts_with("Infinity")
    {
        return Some(f64::NEG_INFINITY);
    }
    if text.trim_start_matches('+').starts_with("Infinity") {
        return Some(f64::INFINITY);
    }
    DECIMAL_PREFIX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Rounds half-way values up, towards positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Reads a JSON value as a number, treating anything else as absent.
pub fn as_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

/// Reads a JSON value as a non-negative index.
pub fn as_index(value: Option<&Value>) -> Option<usize> {
    let v = as_number(value)?;
    (v >= 0.0 && v.fract() == 0.0).then_some(v as usize)
}
