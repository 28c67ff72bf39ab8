//! Grid statistics and the intensity threshold.

use nvision_spec::GridStats;

/// Computes mean, population standard deviation, min and max.
///
/// Samples are summed in row-major order. A flat grid reports its value as
/// the mean and a standard deviation of exactly zero.
pub fn grid_stats(values: &[f64]) -> GridStats {
    let n = values.len() as f64;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in values {
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }

    if min == max {
        return GridStats {
            mean: min,
            std_dev: 0.0,
            min,
            max,
        };
    }

    let mean = sum / n;
    let sum_sq: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
    let std_dev = (sum_sq / n).sqrt();

    GridStats {
        mean,
        std_dev,
        min,
        max,
    }
}

/// Intensity cutoff: `mean + threshold_factor * std_dev`.
#[inline]
pub fn threshold(stats: &GridStats, threshold_factor: f64) -> f64 {
    stats.mean + threshold_factor * stats.std_dev
}
