#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, fmt::Display};

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named numeric measurements attached to a verdict.
pub type Metrics = BTreeMap<String, f64>;

/// The verdict a strategy returns for one [`super::JudgeInput`].
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct JudgeResult {
    /// Whether the output satisfied the level.
    pub passed:        bool,
    /// One-line summary for the student.
    pub message:       String,
    /// Longer explanation, or the error text of an internal failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details:       Option<String>,
    /// Strategy-specific payload for UI rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Value>,
    /// Internal measurements (similarity, score, counts, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics:       Option<Metrics>,
    /// Difference data for highlighting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff:          Option<Value>,
    /// Non-fatal notices such as a tempo drift or a rescaled raster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings:      Option<Vec<String>>,
}

impl JudgeResult {
    /// A failed verdict carrying only a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::builder().passed(false).message(message).build()
    }

    /// A verdict whose message depends on the outcome.
    pub fn verdict(passed: bool, on_pass: &str, on_fail: &str) -> Self {
        Self::builder()
            .passed(passed)
            .message(if passed { on_pass } else { on_fail })
            .build()
    }

    /// Attaches `details`.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attaches `details` only when present.
    pub fn with_maybe_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    /// Attaches a visualization payload.
    pub fn with_visualization(mut self, visualization: Value) -> Self {
        self.visualization = Some(visualization);
        self
    }

    /// Attaches metrics from `(name, value)` pairs.
    pub fn with_metrics<I, K>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        self.metrics = Some(metrics.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    /// Attaches difference data.
    pub fn with_diff(mut self, diff: Value) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Attaches warnings; an empty list leaves the field unset.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = (!warnings.is_empty()).then_some(warnings);
        self
    }

    /// Looks up a single metric.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.as_ref().and_then(|m| m.get(name).copied())
    }
}

impl Display for JudgeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "{status}: {}", self.message)
    }
}
