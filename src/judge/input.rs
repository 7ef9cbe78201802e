#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use bon::Builder;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::JudgeError;

/// A raw event record as reported by the executor, e.g.
/// `{"type": "led", "on": true, "idx": 3}`.
pub type EventRecord = Map<String, Value>;

/// What the sandbox recorded while running the student's program.
///
/// Any subset of the three channels may be present; strategies try the
/// structured artifacts first, then the event list, then plain stdout.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct ExecutionOutput {
    /// Raw standard output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout:    Option<String>,
    /// Typed events, in the order the program emitted them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events:    Option<Vec<EventRecord>>,
    /// Pre-parsed artifacts keyed by kind (`pixelMatrix`, `musicSeq`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Map<String, Value>>,
}

impl ExecutionOutput {
    /// Output consisting only of stdout text.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        let stdout: String = stdout.into();
        Self::builder().stdout(stdout).build()
    }

    /// Output consisting only of an event list.
    pub fn from_events(events: Vec<EventRecord>) -> Self {
        Self::builder().events(events).build()
    }

    /// Output consisting of a single structured artifact.
    pub fn from_artifact(key: impl Into<String>, artifact: Value) -> Self {
        let mut artifacts = Map::new();
        artifacts.insert(key.into(), artifact);
        Self::builder().artifacts(artifacts).build()
    }

    /// Looks up a structured artifact; `null` counts as absent.
    pub fn artifact(&self, key: &str) -> Option<&Value> {
        self.artifacts
            .as_ref()
            .and_then(|a| a.get(key))
            .filter(|v| !v.is_null())
    }

    /// The event list, if the executor produced one.
    pub fn events(&self) -> &[EventRecord] {
        self.events.as_deref().unwrap_or_default()
    }

    /// The captured stdout, or an empty string.
    pub fn stdout(&self) -> &str {
        self.stdout.as_deref().unwrap_or_default()
    }
}

/// Everything a strategy needs to reach a verdict.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct JudgeInput {
    /// Registry key of the strategy to run.
    pub strategy: String,
    /// Strategy-specific description of the expected behaviour.
    #[serde(default)]
    #[builder(default)]
    pub expected: Value,
    /// Artifact produced by the execution sandbox.
    #[serde(default)]
    #[builder(default)]
    pub output:   ExecutionOutput,
    /// Strategy-specific tunables (tolerances, thresholds, modes).
    #[serde(default)]
    #[builder(default)]
    pub args:     Value,
    /// Free-form tracing information (level id, language, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    #[builder(default)]
    pub metadata: Map<String, Value>,
}

impl JudgeInput {
    /// Parses `args` into a strategy's argument struct. Missing or `null`
    /// args yield the defaults.
    pub fn parse_args<T>(&self, strategy: &'static str) -> Result<T, JudgeError>
    where
        T: DeserializeOwned + Default,
    {
        if self.args.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.args.clone())
            .map_err(|source| JudgeError::InvalidArgs { strategy, source })
    }
}
