//! Schema validation for detection results produced by any backend.

use std::fmt;

use crate::result::DetectionResult;

/// A single schema violation in a detection result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValidationError {
    /// A grid field has the wrong number of rows.
    RowCount {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A grid row has the wrong number of columns.
    RowLength {
        field: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// A per-peak sequence is not parallel to `coordinates`.
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A peak index lies outside the grid.
    PeakOutOfBounds { index: usize, row: usize, col: usize },
    /// A numeric field holds NaN or infinity.
    NonFinite { field: &'static str },
}

impl fmt::Display for ResultValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowCount {
                field,
                expected,
                actual,
            } => write!(f, "{} has {} rows, expected {}", field, actual, expected),
            Self::RowLength {
                field,
                row,
                expected,
                actual,
            } => write!(
                f,
                "{} row {} has {} columns, expected {}",
                field, row, actual, expected
            ),
            Self::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "{} has {} entries, expected {} (one per coordinate)",
                field, actual, expected
            ),
            Self::PeakOutOfBounds { index, row, col } => {
                write!(f, "coordinate {} at ({}, {}) is outside the grid", index, row, col)
            }
            Self::NonFinite { field } => write!(f, "{} contains a non-finite value", field),
        }
    }
}

impl std::error::Error for ResultValidationError {}

/// Validates a result against the shape of the frame it was computed from.
///
/// Every violation is collected so a rejected backend output can be
/// reported in full.
pub fn validate_result(
    result: &DetectionResult,
    rows: usize,
    cols: usize,
) -> Result<(), Vec<ResultValidationError>> {
    let mut errors = Vec::new();

    check_grid(&mut errors, "processed_image", &result.smoothed, rows, cols);
    check_grid(&mut errors, "mask", &result.mask, rows, cols);

    if result
        .smoothed
        .iter()
        .any(|row| row.iter().any(|v| !v.is_finite()))
    {
        errors.push(ResultValidationError::NonFinite {
            field: "processed_image",
        });
    }

    let n = result.peaks.len();
    for (field, len) in [
        ("x_positions", result.x_positions.len()),
        ("y_positions", result.y_positions.len()),
        ("intensities", result.intensities.len()),
    ] {
        if len != n {
            errors.push(ResultValidationError::LengthMismatch {
                field,
                expected: n,
                actual: len,
            });
        }
    }

    for (index, peak) in result.peaks.iter().enumerate() {
        if peak.row >= rows || peak.col >= cols {
            errors.push(ResultValidationError::PeakOutOfBounds {
                index,
                row: peak.row,
                col: peak.col,
            });
        }
    }

    for (field, values) in [
        ("x_positions", &result.x_positions),
        ("y_positions", &result.y_positions),
        ("intensities", &result.intensities),
    ] {
        if values.iter().any(|v| !v.is_finite()) {
            errors.push(ResultValidationError::NonFinite { field });
        }
    }

    if !result.threshold.is_finite() {
        errors.push(ResultValidationError::NonFinite { field: "threshold" });
    }
    if !result.stats.is_finite() {
        errors.push(ResultValidationError::NonFinite { field: "stats" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_grid<T>(
    errors: &mut Vec<ResultValidationError>,
    field: &'static str,
    grid: &[Vec<T>],
    rows: usize,
    cols: usize,
) {
    if grid.len() != rows {
        errors.push(ResultValidationError::RowCount {
            field,
            expected: rows,
            actual: grid.len(),
        });
        return;
    }
    for (row, values) in grid.iter().enumerate() {
        if values.len() != cols {
            errors.push(ResultValidationError::RowLength {
                field,
                row,
                expected: cols,
                actual: values.len(),
            });
        }
    }
}

/// Joins validation errors into one message.
pub fn describe_errors(errors: &[ResultValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
