#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Compares timed note sequences.
//!
//! Each expected note, in order, greedily claims the best-scoring unclaimed
//! actual note. A candidate earns 0.4 for an equivalent pitch, up to 0.3 for
//! onset closeness and up to 0.3 for duration closeness, and is accepted only
//! above 0.5. The score is the fraction of expected notes that found a match.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    EventRecord, ExecutionOutput, JudgeInput, JudgeResult, JudgeStrategy,
    extract::{artifact, keyword_lines, marker_json},
};
use crate::{
    config::{MusicArgs, PitchEquivalence},
    constants,
    error::JudgeError,
    events::EventKind,
    util::{as_number, float_prefix, fmt_num, int_prefix, is_truthy},
};

lazy_static! {
    /// A note name with an optional accidental and an octave, e.g. `C#4`.
    static ref NOTE_NAME: Regex = Regex::new(r"^([A-G][#b]?)(\d+)$").expect("valid regex");
    /// The octave digits of a note name.
    static ref OCTAVE: Regex = Regex::new(r"\d+").expect("valid regex");
}

/// Default tempo of a sequence.
fn default_tempo() -> f64 {
    constants::DEFAULT_TEMPO
}

/// Default pitch of a note.
fn default_pitch() -> String {
    constants::DEFAULT_PITCH.to_string()
}

/// Default duration of a note.
fn default_dur() -> f64 {
    constants::DEFAULT_NOTE_DUR
}

/// A single timed note. Times are in beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Note name, e.g. `C4` or `F#3`.
    #[serde(default = "default_pitch")]
    pub pitch: String,
    /// Duration.
    #[serde(default = "default_dur")]
    pub dur:   f64,
    /// Onset.
    #[serde(default)]
    pub start: f64,
}

impl Note {
    /// A note at `start` lasting `dur` beats.
    pub fn new(pitch: impl Into<String>, dur: f64, start: f64) -> Self {
        Self {
            pitch: pitch.into(),
            dur,
            start,
        }
    }
}

/// A tempo plus an ordered list of notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSequence {
    /// Beats per minute.
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Notes in the order they were written.
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Lays notes out on a running cursor; a note without an explicit start
/// begins where the previous one ended.
#[derive(Debug, Default)]
struct NoteCursor {
    /// End of the last placed note.
    time:  f64,
    /// Notes placed so far.
    notes: Vec<Note>,
}

impl NoteCursor {
    /// Places a note and advances the cursor past it.
    fn place(&mut self, pitch: String, dur: f64, start: Option<f64>) {
        let start = start.unwrap_or(self.time);
        self.time = start + dur;
        self.notes.push(Note { pitch, dur, start });
    }
}

/// Pitch with the first run of octave digits removed, e.g. `C#4` → `C#`.
pub fn pitch_class(pitch: &str) -> String {
    OCTAVE.replace(pitch, "").into_owned()
}

/// Semitone offset of a note name from `C4`. Unparseable names, and octaves
/// too large to count in semitones, sit at 0; octave `0` reads as the
/// baseline octave.
pub fn semitones(pitch: &str) -> i64 {
    let Some(caps) = NOTE_NAME.captures(pitch) else {
        return 0;
    };
    let note = match &caps[1] {
        "C" => 0,
        "C#" | "Db" => 1,
        "D" => 2,
        "D#" | "Eb" => 3,
        "E" => 4,
        "F" => 5,
        "F#" | "Gb" => 6,
        "G" => 7,
        "G#" | "Ab" => 8,
        "A" => 9,
        "A#" | "Bb" => 10,
        "B" => 11,
        _ => 0,
    };
    let octave = caps[2]
        .parse::<i64>()
        .ok()
        .filter(|o| *o != 0)
        .unwrap_or(constants::BASELINE_OCTAVE);
    octave
        .checked_sub(constants::BASELINE_OCTAVE)
        .and_then(|o| o.checked_mul(12))
        .and_then(|o| o.checked_add(note))
        .unwrap_or(0)
}

/// Whether two pitches count as the same note under `rule`.
pub fn pitch_matches(expected: &str, actual: &str, rule: PitchEquivalence) -> bool {
    match rule {
        PitchEquivalence::Strict => expected == actual,
        PitchEquivalence::IgnoreOctave => pitch_class(expected) == pitch_class(actual),
        PitchEquivalence::Nearest => semitones(expected).abs_diff(semitones(actual)) <= 1,
    }
}

/// Credit for a deviation: full `weight` within `window`, then decaying
/// linearly and floored at 0.
fn closeness(error: f64, window: f64, weight: f64) -> f64 {
    if error <= window {
        weight
    } else {
        (weight - error / (window * 2.0)).max(0.0)
    }
}

/// Weighted similarity of a candidate note to an expected one, in `[0, 1]`.
pub fn note_match_score(expected: &Note, actual: &Note, args: &MusicArgs) -> f64 {
    let pitch = if pitch_matches(&expected.pitch, &actual.pitch, args.pitch_equivalence) {
        constants::PITCH_WEIGHT
    } else {
        0.0
    };
    let onset = closeness(
        (expected.start - actual.start).abs(),
        args.onset_window,
        constants::ONSET_WEIGHT,
    );
    let duration = closeness(
        (expected.dur - actual.dur).abs(),
        args.dur_tolerance,
        constants::DURATION_WEIGHT,
    );
    pitch + onset + duration
}

/// What went wrong with a matched pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteErrorKind {
    /// The pitches are not equivalent.
    Pitch,
    /// The onsets differ by more than the onset window.
    Timing,
    /// The durations differ by more than the duration tolerance.
    Duration,
}

/// A matched pair that was accepted but is not exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteError {
    /// The actual note.
    pub note:      Note,
    /// The expected note it was matched to.
    pub expected:  Note,
    /// The kind of error.
    pub error:     NoteErrorKind,
    /// Size of a timing or duration error, in beats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation: Option<f64>,
}

/// Outcome of matching two sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicComparison {
    /// Matched fraction of the expected notes.
    pub score:         f64,
    /// Actual notes that were matched, in expected order.
    pub matched_notes: Vec<Note>,
    /// Expected notes without a match.
    pub missing_notes: Vec<Note>,
    /// Actual notes never matched.
    pub extra_notes:   Vec<Note>,
    /// Timing and duration errors of pitch-equivalent pairs.
    pub rhythm_errors: Vec<NoteError>,
    /// Pairs whose pitches differ.
    pub pitch_errors:  Vec<NoteError>,
    /// Mean deviation of the timing errors, 0 when there are none.
    pub onset_avg_err: f64,
}

/// Greedily matches `actual` against `expected`.
pub fn compare_sequences(
    expected: &MusicSequence,
    actual: &MusicSequence,
    args: &MusicArgs,
) -> MusicComparison {
    let mut pool = actual.notes.clone();
    let mut matched_notes = Vec::new();
    let mut missing_notes = Vec::new();
    let mut rhythm_errors = Vec::new();
    let mut pitch_errors = Vec::new();
    let mut onset_errors = Vec::new();

    for wanted in &expected.notes {
        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in pool.iter().enumerate() {
            let score = note_match_score(wanted, candidate, args);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
        }

        let Some((index, _)) = best.filter(|(_, score)| *score > constants::MATCH_ACCEPT_SCORE)
        else {
            missing_notes.push(wanted.clone());
            continue;
        };
        let found = pool.remove(index);

        if pitch_matches(&wanted.pitch, &found.pitch, args.pitch_equivalence) {
            let timing = (wanted.start - found.start).abs();
            if timing > args.onset_window {
                onset_errors.push(timing);
                rhythm_errors.push(NoteError {
                    note:      found.clone(),
                    expected:  wanted.clone(),
                    error:     NoteErrorKind::Timing,
                    deviation: Some(timing),
                });
            }
            let duration = (wanted.dur - found.dur).abs();
            if duration > args.dur_tolerance {
                rhythm_errors.push(NoteError {
                    note:      found.clone(),
                    expected:  wanted.clone(),
                    error:     NoteErrorKind::Duration,
                    deviation: Some(duration),
                });
            }
        } else {
            pitch_errors.push(NoteError {
                note:      found.clone(),
                expected:  wanted.clone(),
                error:     NoteErrorKind::Pitch,
                deviation: None,
            });
        }
        matched_notes.push(found);
    }

    let score = if expected.notes.is_empty() {
        0.0
    } else {
        matched_notes.len() as f64 / expected.notes.len() as f64
    };
    let onset_avg_err = if onset_errors.is_empty() {
        0.0
    } else {
        onset_errors.iter().sum::<f64>() / onset_errors.len() as f64
    };

    MusicComparison {
        score,
        matched_notes,
        missing_notes,
        extra_notes: pool,
        rhythm_errors,
        pitch_errors,
        onset_avg_err,
    }
}

/// Rebuilds a sequence from `note` and `tempo` records.
fn sequence_from_events(events: &[EventRecord]) -> Option<MusicSequence> {
    let notes: Vec<&EventRecord> = events
        .iter()
        .filter(|record| EventKind::of(record) == EventKind::Note)
        .collect();
    if notes.is_empty() {
        return None;
    }

    let tempo = events
        .iter()
        .find(|record| EventKind::of(record) == EventKind::Tempo)
        .and_then(|record| as_number(record.get("bpm")))
        .filter(|bpm| *bpm != 0.0 && !bpm.is_nan())
        .unwrap_or(constants::DEFAULT_TEMPO);

    let mut cursor = NoteCursor::default();
    for record in notes {
        let pitch = record
            .get("pitch")
            .filter(|v| is_truthy(v))
            .and_then(Value::as_str)
            .map_or_else(default_pitch, String::from);
        let dur = as_number(record.get("dur"))
            .filter(|d| *d != 0.0)
            .unwrap_or(constants::DEFAULT_NOTE_DUR);
        cursor.place(pitch, dur, as_number(record.get("start")));
    }

    Some(MusicSequence {
        tempo,
        notes: cursor.notes,
    })
}

/// Rebuilds a sequence from `tempo <bpm>` and
/// `note <track> <pitch> <dur> [start]` lines.
fn sequence_from_lines(stdout: &str) -> Option<MusicSequence> {
    let tempo = keyword_lines(stdout, "tempo")
        .next()
        .and_then(|parts| parts.get(1).and_then(|p| int_prefix(p)))
        .filter(|bpm| *bpm != 0)
        .map_or(constants::DEFAULT_TEMPO, |bpm| bpm as f64);

    let mut cursor = NoteCursor::default();
    for parts in keyword_lines(stdout, "note").filter(|parts| parts.len() >= 4) {
        let dur = float_prefix(parts[3])
            .filter(|d| *d != 0.0 && !d.is_nan())
            .unwrap_or(constants::DEFAULT_NOTE_DUR);
        let start = parts.get(4).and_then(|p| float_prefix(p));
        cursor.place(parts[2].to_string(), dur, start);
    }

    (!cursor.notes.is_empty()).then(|| MusicSequence {
        tempo,
        notes: cursor.notes,
    })
}

/// Locates the actual sequence: `musicSeq` artifact, then `note`/`tempo`
/// events, then a `MUSIC_SEQ:` marker or note lines on stdout.
pub fn extract_music_sequence(output: &ExecutionOutput) -> Option<MusicSequence> {
    artifact::<MusicSequence>(output, constants::MUSIC_SEQ_ARTIFACT)
        .or_else(|| sequence_from_events(output.events()))
        .or_else(|| marker_json::<MusicSequence>(output.stdout(), constants::MUSIC_SEQ_MARKER))
        .or_else(|| sequence_from_lines(output.stdout()))
}

/// Note-sequence comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct MusicStrategy;

impl JudgeStrategy for MusicStrategy {
    fn name(&self) -> &'static str {
        constants::MUSIC
    }

    fn description(&self) -> &'static str {
        "Music sequence comparison strategy - compares musical notes and timing"
    }

    fn failure_message(&self) -> &'static str {
        "Music comparison failed"
    }

    fn evaluate(&self, input: &JudgeInput) -> Result<JudgeResult, JudgeError> {
        let args: MusicArgs = input.parse_args(constants::MUSIC)?;

        let Some(actual) = extract_music_sequence(&input.output) else {
            return Ok(JudgeResult::failed("No music sequence found in execution output")
                .with_details("Expected musicSeq in output.artifacts"));
        };
        let expected: MusicSequence = serde_json::from_value(input.expected.clone())?;

        let mut warnings = Vec::new();
        let tempo_diff = (expected.tempo - actual.tempo).abs();
        if tempo_diff > args.tempo_tolerance {
            warnings.push(format!(
                "Tempo difference {}BPM > tolerance {}BPM",
                fmt_num(tempo_diff),
                fmt_num(args.tempo_tolerance)
            ));
        }

        let comparison = compare_sequences(&expected, &actual, &args);
        let passed = comparison.score >= args.score_threshold;
        let message = if passed {
            "Music sequence matches expected output".to_string()
        } else {
            format!(
                "Music score {:.1}% below threshold {:.1}%",
                comparison.score * 100.0,
                args.score_threshold * 100.0
            )
        };
        let details = format!(
            "Score: {:.1}%, Matched: {}/{}, Rhythm errors: {}, Pitch errors: {}",
            comparison.score * 100.0,
            comparison.matched_notes.len(),
            expected.notes.len(),
            comparison.rhythm_errors.len(),
            comparison.pitch_errors.len()
        );
        let metrics = [
            ("score", comparison.score),
            ("matched", comparison.matched_notes.len() as f64),
            ("total", expected.notes.len() as f64),
            ("rhythmErrorCount", comparison.rhythm_errors.len() as f64),
            ("pitchErrorCount", comparison.pitch_errors.len() as f64),
            ("onsetAvgErr", comparison.onset_avg_err),
        ];

        Ok(JudgeResult::builder()
            .passed(passed)
            .message(message)
            .build()
            .with_details(details)
            .with_visualization(json!({
                "expected": expected,
                "actual": actual,
                "matchedNotes": comparison.matched_notes,
                "missingNotes": comparison.missing_notes,
                "extraNotes": comparison.extra_notes,
                "rhythmErrors": comparison.rhythm_errors,
                "pitchErrors": comparison.pitch_errors,
            }))
            .with_metrics(metrics)
            .with_warnings(warnings))
    }
}
