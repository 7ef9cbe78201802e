use judge_engine::{
    ExecutionOutput, JudgeInput, JudgeStrategy,
    config::PixelArgs,
    judge::{
        PixelCell, PixelMatrix, PixelStrategy,
        pixel::{compare_matrices, extract_pixel_matrix, normalize_expected},
    },
};
use serde_json::{Value, json};

fn grid(rows: Value) -> Value {
    let rows_vec = rows.as_array().expect("rows").clone();
    let height = rows_vec.len();
    let width = rows_vec.first().and_then(Value::as_array).map_or(0, Vec::len);
    json!({ "width": width, "height": height, "pixels": rows })
}

fn pixel_input(expected: Value, output: Value, args: Value) -> JudgeInput {
    serde_json::from_value(json!({
        "strategy": "pixel",
        "expected": expected,
        "output": output,
        "args": args,
    }))
    .expect("valid judge input")
}

#[test]
fn every_cell_outside_tolerance() {
    let expected = grid(json!([[100, 200], [150, 250]]));
    let actual = grid(json!([[110, 190], [140, 260]]));
    let result = PixelStrategy.judge(&pixel_input(
        expected,
        json!({ "artifacts": { "pixelMatrix": actual } }),
        json!({ "tolerance": 5 }),
    ));

    assert!(!result.passed);
    assert_eq!(result.metric("diffCount"), Some(4.0));
    assert_eq!(result.metric("similarity"), Some(0.0));
    assert_eq!(result.message, "Pixel similarity 0.0% below threshold 95.0%");
    assert_eq!(
        result.details.as_deref(),
        Some("Similarity: 0.0%, Different pixels: 4/4")
    );
    assert_eq!(
        result.visualization.as_ref().expect("visualization")["diffMatrix"],
        json!([[1, 1], [1, 1]])
    );
}

#[test]
fn differences_within_tolerance_pass() {
    let expected = grid(json!([[100, 200], [150, 250]]));
    let actual = grid(json!([[105, 195], [150, 255]]));
    let result = PixelStrategy.judge(&pixel_input(
        expected,
        json!({ "artifacts": { "pixelMatrix": actual } }),
        json!({ "tolerance": 5 }),
    ));

    assert!(result.passed);
    assert_eq!(result.metric("similarity"), Some(1.0));
    assert_eq!(result.message, "Pixel matrix matches expected output");
}

#[test]
fn rgb_cells_use_per_channel_tolerance() {
    let args = PixelArgs::default();
    let base = PixelCell::Channels(vec![10.0, 20.0, 30.0]);

    assert!(!base.differs(&PixelCell::Channels(vec![15.0, 15.0, 35.0]), &args));
    assert!(base.differs(&PixelCell::Channels(vec![16.0, 20.0, 30.0]), &args));
    assert!(base.differs(&PixelCell::Channels(vec![10.0, 20.0]), &args));
    assert!(base.differs(&PixelCell::Scalar(20.0), &args));
}

#[test]
fn dimension_mismatch_without_scaling() {
    let expected = grid(json!([[1, 1], [1, 1]]));
    let actual = grid(json!([[1]]));
    let result = PixelStrategy.judge(&pixel_input(
        expected,
        json!({ "artifacts": { "pixelMatrix": actual } }),
        Value::Null,
    ));

    assert!(!result.passed);
    assert_eq!(result.message, "Dimension mismatch");
    assert_eq!(result.details.as_deref(), Some("Expected 2x2, got 1x1"));
}

#[test]
fn scaling_resamples_and_warns() {
    let expected = grid(json!([[7, 7, 9, 9], [7, 7, 9, 9]]));
    let actual = grid(json!([[7, 9]]));
    let result = PixelStrategy.judge(&pixel_input(
        expected,
        json!({ "artifacts": { "pixelMatrix": actual } }),
        json!({ "allowScale": true, "similarityThreshold": 0.25 }),
    ));

    assert_eq!(
        result.warnings,
        Some(vec!["Scaled actual matrix from 2x1 to 4x2".to_string()])
    );
    // the second row samples past the source and stays blank
    assert_eq!(result.metric("diffCount"), Some(6.0));
    assert_eq!(result.metric("similarity"), Some(0.25));
    assert!(result.passed, "{:?}", result.details);
}

#[test]
fn nearest_neighbour_rounds_half_up() {
    let source = PixelMatrix {
        width:  2,
        height: 1,
        pixels: vec![vec![PixelCell::Scalar(7.0), PixelCell::Scalar(9.0)]],
    };
    let scaled = source.scaled(4, 1).expect("small raster");

    let row: Vec<PixelCell> = scaled.pixels[0].clone();
    assert_eq!(
        row,
        vec![
            PixelCell::Scalar(7.0),
            PixelCell::Scalar(9.0),
            PixelCell::Scalar(9.0),
            PixelCell::Scalar(0.0),
        ]
    );
}

#[test]
fn rgba_buffer_converts_to_grayscale() {
    let expected = json!({
        "imageData": [255, 0, 0, 255, 0, 255, 0, 255],
        "width": 2,
        "height": 1,
        "mode": "rgba",
    });
    let matrix = normalize_expected(&expected).expect("valid buffer");

    assert_eq!(
        matrix.pixels,
        vec![vec![PixelCell::Scalar(76.0), PixelCell::Scalar(150.0)]]
    );
}

#[test]
fn buffer_may_be_an_index_keyed_object() {
    let expected = json!({
        "imageData": { "0": 12, "1": 34 },
        "width": 2,
        "height": 1,
        "mode": "gray",
    });
    let matrix = normalize_expected(&expected).expect("valid buffer");

    assert_eq!(
        matrix.pixels,
        vec![vec![PixelCell::Scalar(12.0), PixelCell::Scalar(34.0)]]
    );
}

#[test]
fn events_build_bounding_box() {
    let output: ExecutionOutput = serde_json::from_value(json!({
        "events": [
            { "type": "pixel", "x": 2, "y": 1, "value": 5 },
            { "type": "led", "on": true, "idx": 0 },
            { "type": "pixel", "x": 0, "y": 0, "value": 3 },
        ]
    }))
    .expect("valid output");
    let matrix = extract_pixel_matrix(&output).expect("pixel events");

    assert_eq!((matrix.width, matrix.height), (3, 2));
    assert_eq!(matrix.cell(0, 0), Some(&PixelCell::Scalar(3.0)));
    assert_eq!(matrix.cell(1, 0), Some(&PixelCell::Scalar(0.0)));
    assert_eq!(matrix.cell(2, 1), Some(&PixelCell::Scalar(5.0)));
}

#[test]
fn stdout_marker_and_lines() {
    let marker = ExecutionOutput::from_stdout(
        "drawing...\nPIXEL_MATRIX: {\"width\": 1, \"height\": 1, \"pixels\": [[{\"x\": 1}]]}\n",
    );
    // a malformed marker payload falls through to the line format
    assert!(extract_pixel_matrix(&marker).is_none());

    let marker = ExecutionOutput::from_stdout(
        "PIXEL_MATRIX: {\"width\": 2, \"height\": 1, \"pixels\": [[1, {\"nested\": [0]}]]}",
    );
    assert!(extract_pixel_matrix(&marker).is_none());

    let marker = ExecutionOutput::from_stdout(
        "PIXEL_MATRIX: {\"width\": 2, \"height\": 1, \"pixels\": [[1, [1, 2, 3]]]} trailing",
    );
    let matrix = extract_pixel_matrix(&marker).expect("marker matrix");
    assert_eq!(matrix.cell(1, 0), Some(&PixelCell::Channels(vec![1.0, 2.0, 3.0])));

    let lines = ExecutionOutput::from_stdout("pixel 1 0 9\npixel 0 1 4\nnot a pixel\n");
    let matrix = extract_pixel_matrix(&lines).expect("pixel lines");
    assert_eq!((matrix.width, matrix.height), (2, 2));
    assert_eq!(matrix.cell(1, 0), Some(&PixelCell::Scalar(9.0)));
    assert_eq!(matrix.cell(0, 1), Some(&PixelCell::Scalar(4.0)));
}

#[test]
fn missing_raster_fails() {
    let result = PixelStrategy.judge(&pixel_input(
        grid(json!([[0]])),
        json!({ "stdout": "nothing drawn" }),
        Value::Null,
    ));

    assert!(!result.passed);
    assert_eq!(result.message, "No pixel matrix found in execution output");
}

#[test]
fn malformed_expected_is_an_internal_failure() {
    let result = PixelStrategy.judge(&pixel_input(
        json!("not a matrix"),
        json!({ "artifacts": { "pixelMatrix": grid(json!([[0]])) } }),
        Value::Null,
    ));

    assert!(!result.passed);
    assert_eq!(result.message, "Pixel comparison failed");
}

#[test]
fn serialized_matrix_gives_same_verdict() {
    let expected = PixelMatrix {
        width:  2,
        height: 1,
        pixels: vec![vec![PixelCell::Scalar(1.0), PixelCell::Channels(vec![1.0, 2.0, 3.0])]],
    };
    let round_tripped: PixelMatrix =
        serde_json::from_str(&serde_json::to_string(&expected).expect("serialize"))
            .expect("deserialize");
    let actual = json!({ "artifacts": { "pixelMatrix": { "width": 2, "height": 1, "pixels": [[1, [1, 2, 9]]] } } });

    let direct = PixelStrategy.judge(&pixel_input(
        serde_json::to_value(&expected).expect("to value"),
        actual.clone(),
        Value::Null,
    ));
    let via_json = PixelStrategy.judge(&pixel_input(
        serde_json::to_value(&round_tripped).expect("to value"),
        actual,
        Value::Null,
    ));

    assert_eq!(direct, via_json);
    assert_eq!(direct.metric("diffCount"), Some(1.0));
}

#[test]
fn empty_grid_never_passes() {
    let empty = PixelMatrix::blank(0, 0).expect("empty raster");
    let comparison =
        compare_matrices(&empty, &empty, &PixelArgs::default()).expect("empty raster");
    assert_eq!(comparison.total_pixels, 0);
    assert_eq!(comparison.similarity, 0.0);
}

#[test]
fn oversized_rasters_are_rejected_before_allocation() {
    assert!(PixelMatrix::blank(1 << 62, 4).is_err());
    assert!(PixelMatrix::blank(1 << 21, 0).is_err());
    assert!(PixelMatrix::blank(1024, 1024).is_ok());

    let writes = [(usize::MAX, 0, PixelCell::Scalar(1.0))];
    assert!(PixelMatrix::from_writes(&writes).is_err());
    assert_eq!(PixelMatrix::from_writes(&[]).expect("no writes"), None);
}

#[test]
fn huge_actual_rasters_fail_without_panicking() {
    let outputs = [
        json!({ "events": [{ "type": "pixel", "x": 1e19, "y": 0, "value": 1 }] }),
        json!({ "events": [{ "type": "pixel", "x": 1e300, "y": 1e300, "value": 1 }] }),
        json!({
            "artifacts": {
                "pixelMatrix": { "width": 4_611_686_018_427_387_904u64, "height": 4, "pixels": [] }
            }
        }),
        json!({ "stdout": "PIXEL_MATRIX: {\"width\": 9999, \"height\": 9999, \"pixels\": []}" }),
        json!({ "stdout": "pixel 100000 100000 1\n" }),
    ];

    for output in outputs {
        let result = PixelStrategy.judge(&pixel_input(grid(json!([[1]])), output, Value::Null));
        assert!(!result.passed);
        assert_eq!(result.message, "No pixel matrix found in execution output");
    }
}

#[test]
fn huge_expected_raster_is_an_internal_failure() {
    let expected = json!({ "imageData": [], "width": 100000, "height": 100000, "mode": "gray" });
    let result = PixelStrategy.judge(&pixel_input(
        expected,
        json!({ "artifacts": { "pixelMatrix": grid(json!([[0]])) } }),
        json!({ "allowScale": true }),
    ));

    assert!(!result.passed);
    assert_eq!(result.message, "Pixel comparison failed");
    assert!(
        result
            .details
            .as_deref()
            .is_some_and(|d| d.contains("exceeds the limit"))
    );
}
