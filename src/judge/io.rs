#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Compares a program's stdout with the level's expected text.
//!
//! A plain expectation (string, array of lines, or `{stdout}`/`{expect}`
//! object) is compared after trimming both sides. An object with a `cases`
//! list selects one of the case modes through its `match` field.

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use similar::TextDiff;

use super::{JudgeInput, JudgeResult, JudgeStrategy};
use crate::{
    constants,
    error::JudgeError,
    util::{display_value, fmt_num, strict_number},
};

/// One stdin/stdout pair of a case list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoCase {
    /// Stdin the level intended to feed the program.
    #[serde(rename = "in", default)]
    pub input: Value,
    /// Expected stdout.
    pub out:   String,
}

/// How a case list is compared against the captured output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchMode {
    /// Output must equal every case's `out` exactly.
    #[default]
    Exact,
    /// Output and the last case's `out` are numbers within `tolerance`.
    Tolerance,
    /// Output matches `pattern`, with `.` also matching newlines.
    Regex,
    /// Anything else; always fails.
    Unsupported(String),
}

impl From<String> for MatchMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "exact" => Self::Exact,
            "tolerance" => Self::Tolerance,
            "regex" => Self::Regex,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<MatchMode> for String {
    fn from(value: MatchMode) -> Self {
        match value {
            MatchMode::Exact => "exact".into(),
            MatchMode::Tolerance => "tolerance".into(),
            MatchMode::Regex => "regex".into(),
            MatchMode::Unsupported(other) => other,
        }
    }
}

/// An expectation made of stdin/stdout cases.
///
/// Only one program run is available, so every case is checked against the
/// same captured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoCaseSpec {
    /// The cases, in level order.
    pub cases:     Vec<IoCase>,
    /// Comparison mode.
    #[serde(rename = "match", default)]
    pub mode:      MatchMode,
    /// Absolute tolerance for `tolerance` mode.
    #[serde(default)]
    pub tolerance: f64,
    /// Pattern for `regex` mode; defaults to `.*`.
    #[serde(default)]
    pub pattern:   Option<String>,
}

/// One row of the aligned line diff shown to students.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineDiff {
    /// Both sides carry this line.
    Equal {
        /// The shared line.
        line: String,
    },
    /// The expected side's line at a mismatching position.
    Removed {
        /// The expected line.
        line: String,
    },
    /// The actual side's line at a mismatching position.
    Added {
        /// The actual line.
        line: String,
    },
}

/// Index-aligned line diff; the shorter side is padded with empty lines.
pub fn line_diff(expected: &str, actual: &str) -> Vec<LineDiff> {
    expected
        .split('\n')
        .zip_longest(actual.split('\n'))
        .flat_map(|pair| {
            let (e, a) = pair.or("", "");
            if e == a {
                vec![LineDiff::Equal { line: e.to_string() }]
            } else {
                vec![
                    LineDiff::Removed { line: e.to_string() },
                    LineDiff::Added { line: a.to_string() },
                ]
            }
        })
        .collect()
}

/// Flattens a plain expectation into the text it describes.
fn expected_text(expected: &Value) -> String {
    match expected {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines.iter().map(display_value).join("\n"),
        Value::Object(obj) => match (obj.get("stdout"), obj.get("expect")) {
            (Some(Value::String(s)), _) => s.clone(),
            (Some(Value::Array(lines)), _) => lines.iter().map(display_value).join("\n"),
            (_, Some(Value::String(s))) => s.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

/// Text/numeric output comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoStrategy;

impl IoStrategy {
    /// Trimmed equality against a plain expectation.
    fn judge_text(&self, expected: &Value, actual: &str) -> JudgeResult {
        let expected = expected_text(expected);
        let passed = actual.trim() == expected.trim();

        let mut result = JudgeResult::verdict(
            passed,
            "Output matches expected text",
            "Output does not match expected text",
        )
        .with_visualization(json!({
            "expected": expected,
            "actual": actual,
            "diff": line_diff(&expected, actual),
        }))
        .with_metrics([
            ("similarity", if passed { 1.0 } else { 0.0 }),
            ("length", actual.chars().count() as f64),
        ]);

        if !passed {
            let unified = TextDiff::from_lines(expected.as_str(), actual)
                .unified_diff()
                .header("expected", "actual")
                .to_string();
            result = result
                .with_details(format!("Expected: \"{expected}\"\nActual: \"{actual}\""))
                .with_diff(Value::String(unified));
        }
        result
    }

    /// Dispatches a case list on its `match` mode.
    fn judge_cases(&self, spec: &IoCaseSpec, actual: &str) -> Result<JudgeResult, JudgeError> {
        match &spec.mode {
            MatchMode::Exact => Ok(self.judge_exact_cases(spec, actual)),
            MatchMode::Tolerance => self.judge_tolerance(spec, actual),
            MatchMode::Regex => self.judge_regex(spec, actual),
            MatchMode::Unsupported(mode) => Ok(JudgeResult::failed("Unknown IO match mode")
                .with_details(format!("Unsupported match mode: {mode}"))),
        }
    }

    /// Every case's `out` must equal the captured output verbatim.
    fn judge_exact_cases(&self, spec: &IoCaseSpec, actual: &str) -> JudgeResult {
        let total = spec.cases.len();
        let passed_count = spec.cases.iter().filter(|c| c.out == actual).count();
        let passed = passed_count == total;

        let cases: Vec<Value> = spec
            .cases
            .iter()
            .map(|c| {
                json!({
                    "input": c.input,
                    "expected": c.out,
                    "actual": actual,
                    "passed": c.out == actual,
                })
            })
            .collect();
        let similarity = if total == 0 {
            1.0
        } else {
            passed_count as f64 / total as f64
        };

        JudgeResult::verdict(passed, "All test cases passed", "Some test cases failed")
            .with_maybe_details((!passed).then(|| {
                format!("Failed {} out of {total} test cases", total - passed_count)
            }))
            .with_visualization(json!({ "cases": cases }))
            .with_metrics([
                ("passed", passed_count as f64),
                ("total", total as f64),
                ("similarity", similarity),
            ])
    }

    /// Numeric comparison against the last case.
    fn judge_tolerance(&self, spec: &IoCaseSpec, actual: &str) -> Result<JudgeResult, JudgeError> {
        let last = spec.cases.last().ok_or_else(|| {
            JudgeError::MalformedExpected("tolerance mode needs at least one case".into())
        })?;
        let target = last.out.trim();
        let got = actual.trim();
        let (num_target, num_got) = (strict_number(target), strict_number(got));
        let difference = (num_target - num_got).abs();
        let numeric = !num_target.is_nan() && !num_got.is_nan();
        let passed = numeric && difference <= spec.tolerance;

        let mut warnings = Vec::new();
        if !numeric {
            warnings.push("Non-numeric values compared with tolerance mode".to_string());
        }

        Ok(JudgeResult::verdict(
            passed,
            "Numeric output within tolerance",
            "Numeric output exceeds tolerance",
        )
        .with_maybe_details((!passed).then(|| {
            format!("Expected: {target} (±{}), Got: {got}", fmt_num(spec.tolerance))
        }))
        .with_visualization(json!({
            "expected": target,
            "actual": got,
            "tolerance": spec.tolerance,
            "difference": difference,
        }))
        .with_metrics([
            ("expected", num_target),
            ("actual", num_got),
            ("difference", difference),
            ("tolerance", spec.tolerance),
        ])
        .with_warnings(warnings))
    }

    /// Pattern search over the whole output.
    fn judge_regex(&self, spec: &IoCaseSpec, actual: &str) -> Result<JudgeResult, JudgeError> {
        let pattern = spec.pattern.as_deref().unwrap_or(".*");
        let re = Regex::new(&format!("(?s){pattern}")).map_err(|source| JudgeError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let passed = re.is_match(actual);

        Ok(JudgeResult::verdict(
            passed,
            "Output matches regex pattern",
            "Output does not match regex pattern",
        )
        .with_maybe_details(
            (!passed).then(|| format!("Pattern: {pattern}\nOutput: \"{actual}\"")),
        )
        .with_visualization(json!({
            "pattern": spec.pattern,
            "actual": actual,
            "match": passed,
        }))
        .with_metrics([
            (
                "patternLength",
                spec.pattern.as_deref().map_or(0, |p| p.chars().count()) as f64,
            ),
            ("outputLength", actual.chars().count() as f64),
        ]))
    }
}

impl JudgeStrategy for IoStrategy {
    fn name(&self) -> &'static str {
        constants::IO
    }

    fn description(&self) -> &'static str {
        "Input/Output comparison strategy - compares stdout with expected output"
    }

    fn failure_message(&self) -> &'static str {
        "IO comparison failed"
    }

    fn evaluate(&self, input: &JudgeInput) -> Result<JudgeResult, JudgeError> {
        let actual = input.output.stdout();

        if input.expected.get("cases").is_some_and(Value::is_array) {
            let spec: IoCaseSpec = serde_json::from_value(input.expected.clone())?;
            return self.judge_cases(&spec, actual);
        }

        Ok(self.judge_text(&input.expected, actual))
    }
}
