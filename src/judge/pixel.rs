#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Compares 2-D rasters cell by cell, with per-cell tolerance, an overall
//! similarity threshold, and optional nearest-neighbour rescaling.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    EventRecord, ExecutionOutput, JudgeInput, JudgeResult, JudgeStrategy,
    extract::{artifact, keyword_lines, marker_json},
};
use crate::{
    config::PixelArgs,
    constants,
    error::JudgeError,
    events::EventKind,
    util::{as_index, int_prefix, is_truthy, round_half_up},
};

/// One raster cell: a grayscale intensity or a colour triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PixelCell {
    /// Grayscale intensity.
    Scalar(f64),
    /// Per-channel values, usually RGB.
    Channels(Vec<f64>),
}

impl Default for PixelCell {
    fn default() -> Self {
        Self::Scalar(0.0)
    }
}

impl PixelCell {
    /// Reads a cell from loose JSON; anything unusable is an unset (0) cell.
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => Self::Scalar(n.as_f64().unwrap_or_default()),
            Some(Value::Array(channels)) => {
                Self::Channels(channels.iter().map(|c| c.as_f64().unwrap_or_default()).collect())
            }
            _ => Self::default(),
        }
    }

    /// Whether two cells count as different under the given tolerances.
    /// Cells of different kinds always differ.
    pub fn differs(&self, other: &PixelCell, args: &PixelArgs) -> bool {
        match (self, other) {
            (Self::Scalar(e), Self::Scalar(a)) => (e - a).abs() > args.tolerance,
            (Self::Channels(e), Self::Channels(a)) => {
                e.len() != a.len()
                    || e.iter()
                        .zip(a)
                        .any(|(e, a)| (e - a).abs() > args.per_channel_tolerance)
            }
            _ => true,
        }
    }
}

/// A height-major raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelMatrix {
    /// Number of columns.
    pub width:  usize,
    /// Number of rows.
    pub height: usize,
    /// `pixels[y][x]`.
    pub pixels: Vec<Vec<PixelCell>>,
}

impl PixelMatrix {
    /// Rejects sizes over [`constants::MAX_RASTER_CELLS`] before anything
    /// is allocated.
    fn check_size(width: usize, height: usize) -> Result<(), JudgeError> {
        let cells = width.max(1).checked_mul(height.max(1));
        match cells {
            Some(cells) if cells <= constants::MAX_RASTER_CELLS => Ok(()),
            _ => Err(JudgeError::RasterTooLarge { width, height }),
        }
    }

    /// An all-zero raster.
    pub fn blank(width: usize, height: usize) -> Result<Self, JudgeError> {
        Self::check_size(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![vec![PixelCell::default(); width]; height],
        })
    }

    /// Pads or truncates `pixels` so it has exactly `height` rows of `width`
    /// cells; missing cells are 0.
    pub fn normalized(mut self) -> Result<Self, JudgeError> {
        Self::check_size(self.width, self.height)?;
        self.pixels.resize_with(self.height, Vec::new);
        for row in &mut self.pixels {
            row.resize_with(self.width, PixelCell::default);
        }
        Ok(self)
    }

    /// The cell at column `x`, row `y`.
    pub fn cell(&self, x: usize, y: usize) -> Option<&PixelCell> {
        self.pixels.get(y).and_then(|row| row.get(x))
    }

    /// Builds a raster sized to the bounding box of the written coordinates;
    /// later writes to a cell win. No writes yield `None`.
    pub fn from_writes(writes: &[(usize, usize, PixelCell)]) -> Result<Option<Self>, JudgeError> {
        let Some(max_x) = writes.iter().map(|(x, _, _)| *x).max() else {
            return Ok(None);
        };
        let max_y = writes.iter().map(|(_, y, _)| *y).max().unwrap_or_default();
        let mut matrix = Self::blank(max_x.saturating_add(1), max_y.saturating_add(1))?;
        for (x, y, cell) in writes {
            matrix.pixels[*y][*x] = cell.clone();
        }
        Ok(Some(matrix))
    }

    /// Nearest-neighbour resample to `width` × `height`.
    ///
    /// Target `(x, y)` reads source `(round(x·w/width), round(y·h/height))`;
    /// reads that fall outside the source leave the cell at 0.
    pub fn scaled(&self, width: usize, height: usize) -> Result<Self, JudgeError> {
        let mut scaled = Self::blank(width, height)?;
        for (y, row) in scaled.pixels.iter_mut().enumerate() {
            let source_y = round_half_up((y * self.height) as f64 / height as f64) as usize;
            for (x, cell) in row.iter_mut().enumerate() {
                let source_x = round_half_up((x * self.width) as f64 / width as f64) as usize;
                if source_x < self.width
                    && source_y < self.height
                    && let Some(source) = self.cell(source_x, source_y)
                {
                    *cell = source.clone();
                }
            }
        }
        Ok(scaled)
    }
}

/// Outcome of a cell-by-cell comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelComparison {
    /// Fraction of matching cells.
    pub similarity:   f64,
    /// Number of differing cells.
    pub diff_count:   usize,
    /// Number of compared cells.
    pub total_pixels: usize,
    /// Same shape as the expected raster: 1 where cells differ.
    pub diff_matrix:  Vec<Vec<u8>>,
    /// Notices such as a rescale.
    pub warnings:     Vec<String>,
}

/// Compares `actual` against `expected`, rescaling `actual` first when the
/// sizes differ and `allow_scale` is set.
pub fn compare_matrices(
    expected: &PixelMatrix,
    actual: &PixelMatrix,
    args: &PixelArgs,
) -> Result<PixelComparison, JudgeError> {
    PixelMatrix::check_size(expected.width, expected.height)?;
    let mut warnings = Vec::new();
    let same_size = expected.width == actual.width && expected.height == actual.height;
    let scaled;
    let actual = if args.allow_scale && !same_size {
        scaled = actual.scaled(expected.width, expected.height)?;
        warnings.push(format!(
            "Scaled actual matrix from {}x{} to {}x{}",
            actual.width, actual.height, expected.width, expected.height
        ));
        &scaled
    } else {
        actual
    };

    let blank = PixelCell::default();
    let mut diff_count = 0;
    let diff_matrix: Vec<Vec<u8>> = (0..expected.height)
        .map(|y| {
            (0..expected.width)
                .map(|x| {
                    let e = expected.cell(x, y).unwrap_or(&blank);
                    let a = actual.cell(x, y).unwrap_or(&blank);
                    if e.differs(a, args) {
                        diff_count += 1;
                        1
                    } else {
                        0
                    }
                })
                .collect()
        })
        .collect();

    let total_pixels = expected.width * expected.height;
    let similarity = if total_pixels == 0 {
        0.0
    } else {
        1.0 - diff_count as f64 / total_pixels as f64
    };

    Ok(PixelComparison {
        similarity,
        diff_count,
        total_pixels,
        diff_matrix,
        warnings,
    })
}

/// Reads a `pixel` record as a `(x, y, cell)` write.
fn pixel_write(record: &EventRecord) -> (usize, usize, PixelCell) {
    let x = as_index(record.get("x")).unwrap_or(0);
    let y = as_index(record.get("y")).unwrap_or(0);
    let value = record.get("value").filter(|v| is_truthy(v));
    (x, y, PixelCell::from_value(value))
}

/// Keeps a raster that could be built; an oversized one is logged and
/// treated as absent.
fn usable<T>(source: &str, raster: Result<T, JudgeError>) -> Option<T> {
    raster
        .inspect_err(|e| tracing::warn!("Ignoring {source} raster: {e}"))
        .ok()
}

/// Locates the actual raster: `pixelMatrix` artifact, then `pixel` events,
/// then a `PIXEL_MATRIX:` marker or `pixel x y v` lines on stdout.
pub fn extract_pixel_matrix(output: &ExecutionOutput) -> Option<PixelMatrix> {
    let from_artifact = artifact::<PixelMatrix>(output, constants::PIXEL_MATRIX_ARTIFACT)
        .and_then(|matrix| usable("artifact", matrix.normalized()));
    if from_artifact.is_some() {
        return from_artifact;
    }

    let writes: Vec<_> = output
        .events()
        .iter()
        .filter(|record| EventKind::of(record) == EventKind::Pixel)
        .map(pixel_write)
        .collect();
    if let Some(matrix) = usable("event", PixelMatrix::from_writes(&writes)).flatten() {
        return Some(matrix);
    }

    let stdout = output.stdout();
    let from_marker = marker_json::<PixelMatrix>(stdout, constants::PIXEL_MATRIX_MARKER)
        .and_then(|matrix| usable("marker", matrix.normalized()));
    if from_marker.is_some() {
        return from_marker;
    }

    let writes: Vec<_> = keyword_lines(stdout, "pixel")
        .map(|parts| {
            let number = |i: usize| parts.get(i).and_then(|p| int_prefix(p)).unwrap_or(0);
            (
                usize::try_from(number(1)).unwrap_or(0),
                usize::try_from(number(2)).unwrap_or(0),
                PixelCell::Scalar(number(3) as f64),
            )
        })
        .collect();
    usable("stdout", PixelMatrix::from_writes(&writes)).flatten()
}

/// An expected raster given as a flat byte buffer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageBuffer {
    /// Flat buffer; either a JSON array or an index-keyed object.
    image_data: Value,
    /// Number of columns.
    width:      usize,
    /// Number of rows.
    height:     usize,
    /// `rgba` (4 bytes per cell) or `gray` (1 byte per cell).
    #[serde(default)]
    mode:       Option<String>,
}

impl ImageBuffer {
    /// Byte at `index`; missing bytes read as 0.
    fn byte(&self, index: usize) -> f64 {
        let value = match &self.image_data {
            Value::Array(bytes) => bytes.get(index),
            Value::Object(bytes) => bytes.get(&index.to_string()),
            _ => None,
        };
        value.and_then(Value::as_f64).unwrap_or_default()
    }

    /// Converts to a grayscale raster, using `0.299R + 0.587G + 0.114B` for
    /// RGBA buffers.
    fn into_matrix(self) -> Result<PixelMatrix, JudgeError> {
        let rgba = self.mode.as_deref() == Some("rgba");
        let stride = if rgba { 4 } else { 1 };
        let mut matrix = PixelMatrix::blank(self.width, self.height)?;
        for (y, row) in matrix.pixels.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                let index = (y * self.width + x) * stride;
                let gray = if rgba {
                    round_half_up(
                        0.299 * self.byte(index)
                            + 0.587 * self.byte(index + 1)
                            + 0.114 * self.byte(index + 2),
                    )
                } else {
                    self.byte(index)
                };
                *cell = PixelCell::Scalar(gray);
            }
        }
        Ok(matrix)
    }
}

/// Reads the expected raster: a matrix, or an `{imageData, width, height,
/// mode}` buffer.
pub fn normalize_expected(expected: &Value) -> Result<PixelMatrix, JudgeError> {
    if expected.get("imageData").is_some() {
        let buffer: ImageBuffer = serde_json::from_value(expected.clone())?;
        return buffer.into_matrix();
    }
    let matrix: PixelMatrix = serde_json::from_value(expected.clone())?;
    matrix.normalized()
}

/// Raster comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelStrategy;

impl JudgeStrategy for PixelStrategy {
    fn name(&self) -> &'static str {
        constants::PIXEL
    }

    fn description(&self) -> &'static str {
        "Pixel matrix comparison strategy - compares pixel matrices with tolerance"
    }

    fn failure_message(&self) -> &'static str {
        "Pixel comparison failed"
    }

    fn evaluate(&self, input: &JudgeInput) -> Result<JudgeResult, JudgeError> {
        let args: PixelArgs = input.parse_args(constants::PIXEL)?;

        let Some(actual) = extract_pixel_matrix(&input.output) else {
            return Ok(JudgeResult::failed("No pixel matrix found in execution output")
                .with_details("Expected pixelMatrix in output.artifacts"));
        };
        let expected = normalize_expected(&input.expected)?;

        let same_size = expected.width == actual.width && expected.height == actual.height;
        if !same_size && !args.allow_scale {
            return Ok(JudgeResult::failed("Dimension mismatch").with_details(format!(
                "Expected {}x{}, got {}x{}",
                expected.width, expected.height, actual.width, actual.height
            )));
        }

        let comparison = compare_matrices(&expected, &actual, &args)?;
        let passed = comparison.similarity >= args.similarity_threshold;
        let message = if passed {
            "Pixel matrix matches expected output".to_string()
        } else {
            format!(
                "Pixel similarity {:.1}% below threshold {:.1}%",
                comparison.similarity * 100.0,
                args.similarity_threshold * 100.0
            )
        };

        Ok(JudgeResult::builder()
            .passed(passed)
            .message(message)
            .build()
            .with_details(format!(
                "Similarity: {:.1}%, Different pixels: {}/{}",
                comparison.similarity * 100.0,
                comparison.diff_count,
                comparison.total_pixels
            ))
            .with_visualization(json!({
                "expected": expected,
                "actual": actual,
                "diffMatrix": comparison.diff_matrix,
            }))
            .with_metrics([
                ("similarity", comparison.similarity),
                ("diffCount", comparison.diff_count as f64),
                ("totalPixels", comparison.total_pixels as f64),
            ])
            .with_warnings(comparison.warnings))
    }
}
