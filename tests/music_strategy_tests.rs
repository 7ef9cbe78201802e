use judge_engine::{
    ExecutionOutput, JudgeInput, JudgeStrategy,
    config::MusicArgs,
    judge::{
        MusicSequence, MusicStrategy, Note,
        music::{NoteErrorKind, compare_sequences, extract_music_sequence},
    },
};
use serde_json::{Value, json};

fn two_notes() -> Value {
    json!({
        "tempo": 120,
        "notes": [
            { "pitch": "C4", "dur": 0.5, "start": 0 },
            { "pitch": "E4", "dur": 0.5, "start": 0.5 },
        ],
    })
}

fn music_input(expected: Value, actual: Value, args: Value) -> JudgeInput {
    serde_json::from_value(json!({
        "strategy": "music",
        "expected": expected,
        "output": { "artifacts": { "musicSeq": actual } },
        "args": args,
    }))
    .expect("valid judge input")
}

fn sequence(notes: &[(&str, f64, f64)]) -> MusicSequence {
    MusicSequence {
        tempo: 120.0,
        notes: notes
            .iter()
            .map(|(pitch, dur, start)| Note::new(*pitch, *dur, *start))
            .collect(),
    }
}

#[test]
fn missing_second_note_halves_score() {
    let actual = json!({ "tempo": 120, "notes": [{ "pitch": "C4", "dur": 0.5, "start": 0 }] });
    let result = MusicStrategy.judge(&music_input(two_notes(), actual, Value::Null));
    let vis = result.visualization.as_ref().expect("visualization");

    assert!(!result.passed);
    assert_eq!(result.metric("score"), Some(0.5));
    assert_eq!(vis["missingNotes"].as_array().map(Vec::len), Some(1));
    assert_eq!(vis["missingNotes"][0]["pitch"], json!("E4"));
    assert_eq!(result.message, "Music score 50.0% below threshold 85.0%");
    assert_eq!(
        result.details.as_deref(),
        Some("Score: 50.0%, Matched: 1/2, Rhythm errors: 0, Pitch errors: 0")
    );
}

#[test]
fn identical_sequences_match_perfectly() {
    for seq in [
        two_notes(),
        json!({ "tempo": 90, "notes": [{ "pitch": "G#3", "dur": 1, "start": 2 }] }),
        json!({
            "tempo": 140,
            "notes": [
                { "pitch": "A4", "dur": 0.25, "start": 0 },
                { "pitch": "A4", "dur": 0.25, "start": 0 },
                { "pitch": "Bb2", "dur": 2, "start": 0.25 },
            ],
        }),
    ] {
        let result = MusicStrategy.judge(&music_input(seq.clone(), seq, Value::Null));
        let vis = result.visualization.as_ref().expect("visualization");

        assert!(result.passed);
        assert_eq!(result.message, "Music sequence matches expected output");
        assert_eq!(result.metric("score"), Some(1.0));
        for key in ["missingNotes", "extraNotes", "rhythmErrors", "pitchErrors"] {
            assert_eq!(vis[key], json!([]), "{key}");
        }
    }
}

#[test]
fn short_note_is_a_duration_error() {
    let actual = json!({
        "tempo": 120,
        "notes": [
            { "pitch": "C4", "dur": 0.25, "start": 0 },
            { "pitch": "E4", "dur": 0.5, "start": 0.5 },
        ],
    });
    let result = MusicStrategy.judge(&music_input(two_notes(), actual, Value::Null));
    let vis = result.visualization.as_ref().expect("visualization");

    // both notes still match, so only the rhythm report changes
    assert!(result.passed);
    assert_eq!(vis["rhythmErrors"].as_array().map(Vec::len), Some(1));
    assert_eq!(vis["rhythmErrors"][0]["error"], json!("duration"));
    assert_eq!(vis["rhythmErrors"][0]["deviation"], json!(0.25));
    assert_eq!(result.metric("rhythmErrorCount"), Some(1.0));
}

#[test]
fn late_note_is_a_timing_error() {
    let expected: MusicSequence = serde_json::from_value(two_notes()).expect("sequence");
    let actual = sequence(&[("C4", 0.5, 0.1), ("E4", 0.5, 0.5)]);
    let comparison = compare_sequences(&expected, &actual, &MusicArgs::default());

    assert_eq!(comparison.score, 1.0);
    assert_eq!(comparison.rhythm_errors.len(), 1);
    assert_eq!(comparison.rhythm_errors[0].error, NoteErrorKind::Timing);
    assert!((comparison.onset_avg_err - 0.1).abs() < 1e-9);
}

#[test]
fn wrong_pitch_is_a_pitch_error() {
    let expected: MusicSequence = serde_json::from_value(two_notes()).expect("sequence");
    let actual = sequence(&[("D4", 0.5, 0.0), ("E4", 0.5, 0.5)]);
    let comparison = compare_sequences(&expected, &actual, &MusicArgs::default());

    assert_eq!(comparison.pitch_errors.len(), 1);
    assert_eq!(comparison.pitch_errors[0].note.pitch, "D4");
    assert_eq!(comparison.pitch_errors[0].expected.pitch, "C4");
    assert!(comparison.rhythm_errors.is_empty());
}

#[test]
fn pitch_equivalence_modes() {
    let expected = json!({ "tempo": 120, "notes": [{ "pitch": "C4", "dur": 0.5, "start": 0 }] });
    let octave_up = json!({ "tempo": 120, "notes": [{ "pitch": "C5", "dur": 0.5, "start": 0 }] });

    let strict = MusicStrategy.judge(&music_input(expected.clone(), octave_up.clone(), Value::Null));
    assert_eq!(strict.metric("pitchErrorCount"), Some(1.0));

    let loose = MusicStrategy.judge(&music_input(
        expected.clone(),
        octave_up,
        json!({ "pitchEquivalence": "ignoreOctave" }),
    ));
    assert_eq!(loose.metric("pitchErrorCount"), Some(0.0));

    let sharp = json!({ "tempo": 120, "notes": [{ "pitch": "Db4", "dur": 0.5, "start": 0 }] });
    let nearest = MusicStrategy.judge(&music_input(
        expected.clone(),
        sharp.clone(),
        json!({ "pitchEquivalence": "nearest" }),
    ));
    assert_eq!(nearest.metric("pitchErrorCount"), Some(0.0));

    let unknown_rule = MusicStrategy.judge(&music_input(
        expected,
        sharp,
        json!({ "pitchEquivalence": "approximately" }),
    ));
    assert_eq!(unknown_rule.metric("pitchErrorCount"), Some(1.0));
}

#[test]
fn tempo_drift_only_warns() {
    let expected = json!({ "tempo": 120, "notes": [{ "pitch": "C4", "dur": 0.5, "start": 0 }] });
    let within = json!({ "tempo": 122, "notes": [{ "pitch": "C4", "dur": 0.5, "start": 0 }] });
    let beyond = json!({ "tempo": 130, "notes": [{ "pitch": "C4", "dur": 0.5, "start": 0 }] });

    let result = MusicStrategy.judge(&music_input(expected.clone(), within, Value::Null));
    assert!(result.passed);
    assert!(result.warnings.is_none());

    let result = MusicStrategy.judge(&music_input(expected, beyond, Value::Null));
    assert!(result.passed);
    assert_eq!(
        result.warnings,
        Some(vec!["Tempo difference 10BPM > tolerance 2BPM".to_string()])
    );
}

#[test]
fn extra_notes_are_not_penalised() {
    let expected: MusicSequence = serde_json::from_value(two_notes()).expect("sequence");
    let actual = sequence(&[("C4", 0.5, 0.0), ("G4", 0.5, 3.0), ("E4", 0.5, 0.5)]);
    let comparison = compare_sequences(&expected, &actual, &MusicArgs::default());

    assert_eq!(comparison.score, 1.0);
    assert_eq!(comparison.extra_notes, vec![Note::new("G4", 0.5, 3.0)]);
}

#[test]
fn matching_is_greedy_in_expected_order() {
    // the first expected note claims the only candidate even though the
    // second expected note fits it exactly
    let expected = sequence(&[("C4", 0.5, 0.04), ("C4", 0.5, 0.0)]);
    let actual = sequence(&[("C4", 0.5, 0.0)]);
    let comparison = compare_sequences(&expected, &actual, &MusicArgs::default());

    assert_eq!(comparison.matched_notes.len(), 1);
    assert_eq!(comparison.missing_notes, vec![Note::new("C4", 0.5, 0.0)]);
}

#[test]
fn events_place_notes_on_a_cursor() {
    let output: ExecutionOutput = serde_json::from_value(json!({
        "events": [
            { "type": "tempo", "bpm": 90 },
            { "type": "note", "track": 0, "pitch": "C4", "dur": 1 },
            { "type": "note", "track": 0, "pitch": "D4" },
            { "type": "note", "track": 0, "pitch": "E4", "dur": 0.5, "start": 4 },
            { "type": "note", "track": 0, "dur": 0.5 },
        ]
    }))
    .expect("valid output");
    let seq = extract_music_sequence(&output).expect("note events");

    assert_eq!(seq.tempo, 90.0);
    assert_eq!(
        seq.notes,
        vec![
            Note::new("C4", 1.0, 0.0),
            Note::new("D4", 0.5, 1.0),
            Note::new("E4", 0.5, 4.0),
            Note::new("C4", 0.5, 4.5),
        ]
    );
}

#[test]
fn stdout_marker_and_note_lines() {
    let marker = ExecutionOutput::from_stdout(
        "MUSIC_SEQ: {\"tempo\": 100, \"notes\": [{\"pitch\": \"A4\", \"dur\": 1, \"start\": 0}]}\n",
    );
    let seq = extract_music_sequence(&marker).expect("marker");
    assert_eq!(seq.tempo, 100.0);
    assert_eq!(seq.notes, vec![Note::new("A4", 1.0, 0.0)]);

    let lines = ExecutionOutput::from_stdout("note 1 G4 0.25\nnote 1 A4 oops\nnote short\n");
    let seq = extract_music_sequence(&lines).expect("note lines");
    assert_eq!(seq.tempo, 120.0);
    assert_eq!(
        seq.notes,
        vec![Note::new("G4", 0.25, 0.0), Note::new("A4", 0.5, 0.25)]
    );
}

#[test]
fn missing_sequence_fails() {
    let input: JudgeInput = serde_json::from_value(json!({
        "strategy": "music",
        "expected": two_notes(),
        "output": { "stdout": "la la la" },
    }))
    .expect("valid judge input");
    let result = MusicStrategy.judge(&input);

    assert!(!result.passed);
    assert_eq!(result.message, "No music sequence found in execution output");
    assert_eq!(result.details.as_deref(), Some("Expected musicSeq in output.artifacts"));
}

#[test]
fn serialized_sequence_gives_same_verdict() {
    let expected = sequence(&[("C4", 0.5, 0.0), ("F#4", 1.0, 0.5)]);
    let round_tripped: MusicSequence =
        serde_json::from_str(&serde_json::to_string(&expected).expect("serialize"))
            .expect("deserialize");
    let actual = json!({ "tempo": 120, "notes": [{ "pitch": "C4", "dur": 0.5, "start": 0 }] });

    let direct = MusicStrategy.judge(&music_input(
        serde_json::to_value(&expected).expect("to value"),
        actual.clone(),
        Value::Null,
    ));
    let via_json = MusicStrategy.judge(&music_input(
        serde_json::to_value(&round_tripped).expect("to value"),
        actual,
        Value::Null,
    ));

    assert_eq!(direct, via_json);
}

#[test]
fn absurd_octaves_are_judged_not_fatal() {
    let actual = json!({
        "tempo": 120,
        "notes": [
            { "pitch": "C999999999999999999", "dur": 0.5, "start": 0 },
            { "pitch": "B768614336404564650", "dur": 0.5, "start": 0.5 },
        ],
    });
    let result = MusicStrategy.judge(&music_input(
        two_notes(),
        actual,
        json!({ "pitchEquivalence": "nearest" }),
    ));

    assert_ne!(result.message, "Music comparison failed");
    assert_eq!(result.metric("total"), Some(2.0));
    // the overflowing octave sits at C4; the huge one is claimed on timing alone
    assert_eq!(result.metric("matched"), Some(2.0));
    assert_eq!(result.metric("pitchErrorCount"), Some(1.0));
}
