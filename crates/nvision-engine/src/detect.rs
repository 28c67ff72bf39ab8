//! The detection pipeline.

use nvision_spec::{
    threshold_mask, AxisName, DetectionParameters, DetectionResult, EngineError, ScanFrame,
};
use tracing::debug;

use crate::axis::{interp_index, validate_axis};
use crate::grid::{validate_counts, Grid};
use crate::peaks::{local_maxima, suppress_close};
use crate::smooth::gaussian_smooth;
use crate::stats::{grid_stats, threshold};

/// Checks a request without running detection.
///
/// Errors come out in a fixed order: parameters, grid shape, grid size,
/// values, then the x and y axes.
pub fn validate_input(frame: &ScanFrame, params: &DetectionParameters) -> Result<(), EngineError> {
    params.validate()?;
    validate_counts(&frame.counts)?;
    if let Some(axis) = &frame.x_axis {
        validate_axis(axis, AxisName::X)?;
    }
    if let Some(axis) = &frame.y_axis {
        validate_axis(axis, AxisName::Y)?;
    }
    Ok(())
}

/// Runs peak detection on one frame.
///
/// Deterministic: identical input yields a bit-identical result. Fails only
/// on malformed input; see [`validate_input`].
///
/// # Example
///
/// ```
/// use nvision_engine::detect;
/// use nvision_spec::{DetectionParameters, ScanFrame};
///
/// let mut counts = vec![vec![10.0; 5]; 5];
/// counts[2][2] = 100.0;
/// let frame = ScanFrame::new(counts);
///
/// let result = detect(&frame, &DetectionParameters::new(1.0, 1)).unwrap();
/// assert_eq!(result.peak_count(), 1);
/// assert_eq!((result.peaks[0].row, result.peaks[0].col), (2, 2));
/// ```
pub fn detect(
    frame: &ScanFrame,
    params: &DetectionParameters,
) -> Result<DetectionResult, EngineError> {
    validate_input(frame, params)?;
    let grid = Grid::from_frame(frame)?;

    let stats = grid_stats(&grid.data);
    let cutoff = threshold(&stats, params.threshold_factor);
    debug!(
        rows = grid.height,
        cols = grid.width,
        mean = stats.mean,
        std_dev = stats.std_dev,
        threshold = cutoff,
        "computed grid statistics"
    );

    let smoothed = gaussian_smooth(&grid, params.smoothing_sigma);
    let smoothed_rows = smoothed.to_rows();
    let mask = threshold_mask(&smoothed_rows, cutoff);

    let candidates = local_maxima(&smoothed, cutoff);
    let peaks = suppress_close(&candidates, params.min_distance);
    debug!(
        candidates = candidates.len(),
        accepted = peaks.len(),
        min_distance = params.min_distance,
        "suppressed close peaks"
    );

    let x_axis = frame.x_axis_or_default();
    let y_axis = frame.y_axis_or_default();
    let x_positions = peaks
        .iter()
        .map(|p| interp_index(&x_axis, p.col as f64))
        .collect();
    let y_positions = peaks
        .iter()
        .map(|p| interp_index(&y_axis, p.row as f64))
        .collect();
    let intensities = peaks.iter().map(|p| grid.get(p.row, p.col)).collect();

    Ok(DetectionResult {
        peaks,
        x_positions,
        y_positions,
        intensities,
        smoothed: smoothed_rows,
        mask,
        threshold: cutoff,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nvision_spec::Peak;
    use pretty_assertions::assert_eq;

    fn single_spike() -> ScanFrame {
        let mut counts = vec![vec![10.0; 5]; 5];
        counts[2][2] = 100.0;
        ScanFrame::new(counts)
    }

    #[test]
    fn test_single_spike_scenario() {
        let result = detect(&single_spike(), &DetectionParameters::new(1.0, 1)).unwrap();
        assert_eq!(result.peaks, vec![Peak::new(2, 2)]);
        assert_eq!(result.intensities, vec![100.0]);
        assert_eq!(result.x_positions, vec![0.0]);
        assert_eq!(result.y_positions, vec![0.0]);
        assert!(result.mask[2][2]);
        assert!(!result.mask[0][0]);
    }

    #[test]
    fn test_constant_grid_has_no_peaks() {
        let frame = ScanFrame::new(vec![vec![7.0; 3]; 3]);
        let result = detect(&frame, &DetectionParameters::default()).unwrap();
        assert_eq!(result.stats.std_dev, 0.0);
        assert_eq!(result.threshold, 7.0);
        assert!(result.peaks.is_empty());
        assert!(result.mask.iter().flatten().all(|&m| !m));
    }

    #[test]
    fn test_explicit_axes_are_used() {
        let frame = single_spike().with_axes(
            vec![0.0, 0.1, 0.2, 0.3, 0.4],
            vec![10.0, 20.0, 30.0, 40.0, 50.0],
        );
        let result = detect(&frame, &DetectionParameters::new(1.0, 1)).unwrap();
        assert_eq!(result.x_positions, vec![0.2]);
        assert_eq!(result.y_positions, vec![30.0]);
    }

    #[test]
    fn test_short_axis_clamps() {
        let frame = single_spike().with_axes(vec![1.0, 2.0], vec![5.0, 6.0, 7.0]);
        let result = detect(&frame, &DetectionParameters::new(1.0, 1)).unwrap();
        assert_eq!(result.x_positions, vec![2.0]);
        assert_eq!(result.y_positions, vec![7.0]);
    }

    #[test]
    fn test_min_distance_keeps_first_scanned() {
        let mut counts = vec![vec![0.0; 9]; 9];
        counts[2][2] = 50.0;
        counts[2][5] = 90.0;
        let frame = ScanFrame::new(counts);

        let near = detect(&frame, &DetectionParameters::new(1.0, 4)).unwrap();
        assert_eq!(near.peaks, vec![Peak::new(2, 2)]);

        let far = detect(&frame, &DetectionParameters::new(1.0, 3)).unwrap();
        assert_eq!(far.peaks, vec![Peak::new(2, 2), Peak::new(2, 5)]);
    }

    #[test]
    fn test_errors_are_reported_in_order() {
        let bad_params = DetectionParameters::new(0.0, 1);
        let err = detect(&ScanFrame::new(vec![vec![1.0; 2]; 2]), &bad_params).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters { .. }));

        let frame = single_spike().with_axes(vec![0.0, 1.0, 1.0, 2.0, 3.0], vec![0.0; 5]);
        let err = detect(&frame, &DetectionParameters::new(1.0, 1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidAxis {
                axis: AxisName::X,
                ..
            }
        ));
    }

    #[test]
    fn test_nan_cell_is_data_quality() {
        let mut frame = single_spike();
        frame.counts[4][1] = f64::NAN;
        let err = detect(&frame, &DetectionParameters::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DataQuality { row: 4, col: 1, .. }
        ));
    }
}
