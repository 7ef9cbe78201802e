#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Shared pieces of the structured → events → stdout fallback.
//!
//! A malformed artifact or marker payload is logged and then treated exactly
//! like a missing one, so the next tier gets its chance.

use serde::de::DeserializeOwned;
use serde_json::Deserializer;

use super::ExecutionOutput;

/// Deserializes the structured artifact stored under `key`, if any.
pub fn artifact<T: DeserializeOwned>(output: &ExecutionOutput, key: &str) -> Option<T> {
    let value = output.artifact(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring malformed `{key}` artifact: {e}");
            None
        }
    }
}

/// Parses the JSON value that follows the first `marker` in `stdout`, e.g.
/// `PIXEL_MATRIX: {"width": 1, ...}`. The value may span several lines;
/// anything after it is ignored.
pub fn marker_json<T: DeserializeOwned>(stdout: &str, marker: &str) -> Option<T> {
    let (_, rest) = stdout.split_once(marker)?;
    let mut values = Deserializer::from_str(rest.trim_start()).into_iter::<T>();
    match values.next()? {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Failed to parse {marker} JSON: {e}");
            None
        }
    }
}

/// Non-empty lines of `stdout`, trimmed.
pub fn trimmed_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Whitespace-separated tokens of every line starting with `keyword `.
pub fn keyword_lines<'a>(stdout: &'a str, keyword: &'a str) -> impl Iterator<Item = Vec<&'a str>> {
    trimmed_lines(stdout)
        .filter(move |line| {
            line.strip_prefix(keyword)
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        })
        .map(|line| line.split_whitespace().collect())
}
