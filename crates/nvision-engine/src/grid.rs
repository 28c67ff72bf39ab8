//! Dense row-major grid and input validation.

use nvision_spec::{EngineError, ScanFrame};

/// Smallest accepted grid dimension. Smoothing and the local-maximum test
/// need a one-cell border.
pub const MIN_DIMENSION: usize = 3;

/// Row-major grid of `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Values, `height * width` long.
    pub data: Vec<f64>,
}

impl Grid {
    /// Creates a grid filled with `value`.
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Flattens a frame's counts after validating shape, size and values.
    pub fn from_frame(frame: &ScanFrame) -> Result<Self, EngineError> {
        validate_counts(&frame.counts)?;
        let height = frame.counts.len();
        let width = frame.counts[0].len();
        let mut data = Vec::with_capacity(width * height);
        for row in &frame.counts {
            data.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns the value at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    /// Sets the value at `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.width + col] = value;
    }

    /// Converts to nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data
            .chunks(self.width.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

/// Checks that `counts` is rectangular, at least 3x3, and holds only finite,
/// non-negative values.
pub fn validate_counts(counts: &[Vec<f64>]) -> Result<(), EngineError> {
    let rows = counts.len();
    let cols = counts.first().map_or(0, Vec::len);

    for (row, values) in counts.iter().enumerate() {
        if values.len() != cols {
            return Err(EngineError::Shape {
                row,
                expected: cols,
                actual: values.len(),
            });
        }
    }

    if rows < MIN_DIMENSION || cols < MIN_DIMENSION {
        return Err(EngineError::InsufficientSize { rows, cols });
    }

    for (row, values) in counts.iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::DataQuality { row, col, value });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_frame_flattens_row_major() {
        let frame = ScanFrame::new(vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ]);
        let grid = Grid::from_frame(&frame).unwrap();
        assert_eq!(grid.width, 3);
        assert_eq!(grid.get(1, 2), 6.0);
        assert_eq!(grid.to_rows(), frame.counts);
    }

    #[test]
    fn test_ragged_rows_are_shape_errors() {
        let counts = vec![vec![1.0; 4], vec![1.0; 4], vec![1.0; 3], vec![1.0; 4]];
        assert_eq!(
            validate_counts(&counts),
            Err(EngineError::Shape {
                row: 2,
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_small_grids_rejected() {
        assert_eq!(
            validate_counts(&[vec![1.0; 5], vec![1.0; 5]]),
            Err(EngineError::InsufficientSize { rows: 2, cols: 5 })
        );
        assert_eq!(
            validate_counts(&[vec![1.0; 2], vec![1.0; 2], vec![1.0; 2]]),
            Err(EngineError::InsufficientSize { rows: 3, cols: 2 })
        );
        assert_eq!(
            validate_counts(&[]),
            Err(EngineError::InsufficientSize { rows: 0, cols: 0 })
        );
    }

    #[test]
    fn test_bad_values_rejected() {
        let mut counts = vec![vec![1.0; 3]; 3];
        counts[1][1] = f64::INFINITY;
        assert!(matches!(
            validate_counts(&counts),
            Err(EngineError::DataQuality { row: 1, col: 1, .. })
        ));

        counts[1][1] = -1.0;
        assert!(matches!(
            validate_counts(&counts),
            Err(EngineError::DataQuality { row: 1, col: 1, .. })
        ));
    }
}
