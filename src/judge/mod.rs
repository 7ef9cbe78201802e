#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The judging contract and the built-in strategies.

/// Generic ordered event-token comparison.
pub mod event_seq;
/// Helpers for locating artifacts in execution output.
pub mod extract;
/// Execution output and judge input types.
pub mod input;
/// Text and numeric stdout comparison.
pub mod io;
/// LED strip sequence and final-state comparison.
pub mod led;
/// Timed note-sequence comparison.
pub mod music;
/// Raster comparison with tolerance and rescaling.
pub mod pixel;
/// The verdict type.
pub mod results;

pub use event_seq::EventSeqStrategy;
pub use input::{EventRecord, ExecutionOutput, JudgeInput};
pub use io::IoStrategy;
pub use led::LedStrategy;
pub use music::{MusicSequence, MusicStrategy, Note};
pub use pixel::{PixelCell, PixelMatrix, PixelStrategy};
pub use results::{JudgeResult, Metrics};

use crate::error::JudgeError;

/// A named algorithm that judges one output modality.
///
/// Implementors only write [`JudgeStrategy::evaluate`]; callers use
/// [`JudgeStrategy::judge`], which never fails and never panics on input
/// data. Strategies hold no state between calls.
pub trait JudgeStrategy: Send + Sync {
    /// Registry key, e.g. `"pixel"`.
    fn name(&self) -> &'static str;

    /// Human-readable summary shown when listing strategies.
    fn description(&self) -> &'static str;

    /// Message used when [`JudgeStrategy::evaluate`] reports an error.
    fn failure_message(&self) -> &'static str;

    /// Reaches a verdict, or reports why the input could not be judged.
    fn evaluate(&self, input: &JudgeInput) -> Result<JudgeResult, JudgeError>;

    /// Reaches a verdict. Internal errors become a failed result whose
    /// `details` carry the error message.
    fn judge(&self, input: &JudgeInput) -> JudgeResult {
        let result = self.evaluate(input).unwrap_or_else(|err| {
            tracing::warn!(strategy = self.name(), "{err}");
            JudgeResult::failed(self.failure_message()).with_details(err.to_string())
        });
        tracing::debug!(strategy = self.name(), passed = result.passed, "{}", result.message);
        result
    }
}
