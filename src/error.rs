#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Internal failures raised while judging.
///
/// None of these escape a strategy: [`crate::judge::JudgeStrategy::judge`]
/// turns them into a failed [`crate::judge::JudgeResult`] whose `details`
/// carries the message below.
#[derive(thiserror::Error, Debug)]
pub enum JudgeError {
    /// The `expected` specification could not be understood.
    #[error("Malformed expected specification: {0}")]
    MalformedExpected(String),
    /// The tunable `args` did not match the strategy's argument shape.
    #[error("Invalid arguments for `{strategy}` strategy: {source}")]
    InvalidArgs {
        /// Strategy whose arguments were rejected.
        strategy: &'static str,
        /// Underlying deserialization error.
        #[source]
        source:   serde_json::Error,
    },
    /// A regex pattern supplied by the level could not be compiled.
    #[error("Invalid pattern `{pattern}`: {source}")]
    Pattern {
        /// The offending pattern text.
        pattern: String,
        /// Compilation error reported by the regex engine.
        #[source]
        source:  regex::Error,
    },
    /// A value could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A raster is too large to materialize.
    #[error(
        "Raster {width}x{height} exceeds the limit of {} cells",
        crate::constants::MAX_RASTER_CELLS
    )]
    RasterTooLarge {
        /// Requested number of columns.
        width:  usize,
        /// Requested number of rows.
        height: usize,
    },
    /// A legacy level identifier has no preset.
    #[error("Unsupported LED level: {0}")]
    UnsupportedLevel(String),
}
