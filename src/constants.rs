#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Registry key of the text/numeric output strategy.
pub const IO: &str = "io";
/// Registry key of the LED strategy.
pub const LED: &str = "led";
/// Registry key of the generic event-sequence strategy.
pub const EVENT_SEQ: &str = "event-seq";
/// Registry key of the pixel raster strategy.
pub const PIXEL: &str = "pixel";
/// Registry key of the music strategy.
pub const MUSIC: &str = "music";

/// Description reported for names the registry does not know.
pub const UNKNOWN_STRATEGY: &str = "Unknown strategy";

/// Artifact key holding a pre-parsed pixel grid.
pub const PIXEL_MATRIX_ARTIFACT: &str = "pixelMatrix";
/// Artifact key holding a pre-parsed note sequence.
pub const MUSIC_SEQ_ARTIFACT: &str = "musicSeq";

/// Stdout marker preceding a JSON pixel grid.
pub const PIXEL_MATRIX_MARKER: &str = "PIXEL_MATRIX:";
/// Stdout marker preceding a JSON note sequence.
pub const MUSIC_SEQ_MARKER: &str = "MUSIC_SEQ:";

/// LED strip width used when neither args nor the level specify one.
pub const DEFAULT_GRID_WIDTH: usize = 8;
/// Longest LED strip a level may declare.
pub const MAX_GRID_WIDTH: usize = 4096;
/// Largest raster, in cells, that is ever materialized. Dimensions are
/// counted as at least 1, so a single side may not exceed it either.
pub const MAX_RASTER_CELLS: usize = 1 << 20;
/// Tempo assumed when the program never announces one.
pub const DEFAULT_TEMPO: f64 = 120.0;
/// Pitch assumed for a note event that names none.
pub const DEFAULT_PITCH: &str = "C4";
/// Duration, in beats, assumed for a note that names none.
pub const DEFAULT_NOTE_DUR: f64 = 0.5;

/// Octave that pitch arithmetic treats as semitone zero.
pub const BASELINE_OCTAVE: i64 = 4;

/// Weight of pitch equivalence in a note match score.
pub const PITCH_WEIGHT: f64 = 0.4;
/// Weight of onset closeness in a note match score.
pub const ONSET_WEIGHT: f64 = 0.3;
/// Weight of duration closeness in a note match score.
pub const DURATION_WEIGHT: f64 = 0.3;
/// A candidate note is only accepted above this match score.
pub const MATCH_ACCEPT_SCORE: f64 = 0.5;
