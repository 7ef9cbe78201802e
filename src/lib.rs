//! # judge-engine
//!
//! A stateless auto-grader for the output of students' programs. Given what a
//! program printed, the events it emitted, or a structured artifact it
//! produced, a [`judge::JudgeStrategy`] decides whether the level's expected
//! behaviour was met and explains why.
//!
//! Five strategies ship with the crate, one per output modality: plain text
//! (`io`), LED strips (`led`), generic event sequences (`event-seq`), pixel
//! rasters (`pixel`) and timed note sequences (`music`). A
//! [`registry::StrategyRegistry`] dispatches a [`judge::JudgeInput`] to the
//! strategy it names.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Typed, defaulted arguments for each strategy
pub mod config;
/// Constant values used throughout the crate
pub mod constants;
/// Internal failures raised while judging
pub mod error;
/// Typed views over raw executor events
pub mod events;
/// The judging contract and the built-in strategies
pub mod judge;
/// Built-in legacy LED levels
pub mod levels;
/// Strategy lookup by name
pub mod registry;
/// Source-structure checks for submissions
pub mod structure;
/// Lenient value conversions shared by the strategies
pub mod util;

pub use error::JudgeError;
pub use judge::{ExecutionOutput, JudgeInput, JudgeResult, JudgeStrategy};
pub use registry::StrategyRegistry;
