#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Tunable parameters for each strategy, read from `JudgeInput::args`.
//!
//! Every field has a default, so levels only spell out what they change.

use serde::{Deserialize, Serialize};

/// Arguments of the LED strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LedArgs {
    /// Width of the LED strip for final-state judging; `0` means unset.
    pub grid_width: Option<f64>,
}

/// Arguments of the pixel strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PixelArgs {
    /// Largest accepted absolute difference of a grayscale cell.
    pub tolerance:             f64,
    /// Fraction of matching cells required to pass.
    pub similarity_threshold:  f64,
    /// Largest accepted absolute difference of one RGB channel.
    pub per_channel_tolerance: f64,
    /// Resample the actual raster to the expected size instead of failing.
    pub allow_scale:           bool,
}

impl Default for PixelArgs {
    fn default() -> Self {
        Self {
            tolerance:             0.0,
            similarity_threshold:  0.95,
            per_channel_tolerance: 5.0,
            allow_scale:           false,
        }
    }
}

/// How two pitch names are considered the same note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum PitchEquivalence {
    /// Identical note names only.
    #[default]
    Strict,
    /// Same pitch class in any octave.
    IgnoreOctave,
    /// At most one semitone apart.
    Nearest,
}

impl From<String> for PitchEquivalence {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ignoreOctave" => Self::IgnoreOctave,
            "nearest" => Self::Nearest,
            _ => Self::Strict,
        }
    }
}

/// Arguments of the music strategy. Times are in beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MusicArgs {
    /// Tempo drift, in BPM, tolerated before a warning is raised.
    pub tempo_tolerance:   f64,
    /// Onset difference that still earns full timing credit.
    pub onset_window:      f64,
    /// Duration difference that still earns full duration credit.
    pub dur_tolerance:     f64,
    /// Fraction of expected notes that must be matched to pass.
    pub score_threshold:   f64,
    /// Pitch comparison rule.
    pub pitch_equivalence: PitchEquivalence,
}

impl Default for MusicArgs {
    fn default() -> Self {
        Self {
            tempo_tolerance:   2.0,
            onset_window:      0.05,
            dur_tolerance:     0.05,
            score_threshold:   0.85,
            pitch_equivalence: PitchEquivalence::Strict,
        }
    }
}
