//! Gaussian smoothing.
//!
//! The kernel is a sampled Gaussian truncated at `ceil(3 * sigma)` taps on
//! each side, applied separably (rows, then columns). At the border only
//! in-bounds taps contribute and their weights are renormalized, which in 2D
//! is the same as averaging over the in-bounds part of the full kernel.
//!
//! Each output is clamped to the range of the taps that produced it, so flat
//! regions stay exactly flat despite rounding in the weighted sum.

use crate::grid::Grid;

/// Builds the one-sided half of the kernel: `weights[k]` is the weight at
/// offset `±k`. Weights are not normalized.
pub fn gaussian_weights(sigma: f64) -> Vec<f64> {
    let radius = ((3.0 * sigma).ceil() as usize).max(1);
    let two_sigma_sq = 2.0 * sigma * sigma;
    (0..=radius)
        .map(|k| {
            let k = k as f64;
            (-(k * k) / two_sigma_sq).exp()
        })
        .collect()
}

/// Smooths `input` with a Gaussian of the given sigma.
///
/// A sigma of zero returns an unchanged copy.
pub fn gaussian_smooth(input: &Grid, sigma: f64) -> Grid {
    if sigma <= 0.0 {
        return input.clone();
    }

    let weights = gaussian_weights(sigma);
    let mut horizontal = Grid::filled(input.width, input.height, 0.0);
    let mut output = Grid::filled(input.width, input.height, 0.0);

    for row in 0..input.height {
        let start = row * input.width;
        smooth_line(
            &input.data[start..start + input.width],
            &mut horizontal.data[start..start + input.width],
            &weights,
        );
    }

    let mut column = vec![0.0; input.height];
    let mut smoothed_column = vec![0.0; input.height];
    for col in 0..input.width {
        for row in 0..input.height {
            column[row] = horizontal.get(row, col);
        }
        smooth_line(&column, &mut smoothed_column, &weights);
        for row in 0..input.height {
            output.set(row, col, smoothed_column[row]);
        }
    }

    output
}

fn smooth_line(src: &[f64], dst: &mut [f64], weights: &[f64]) {
    let n = src.len() as isize;
    let radius = weights.len() as isize - 1;

    for (i, out) in dst.iter_mut().enumerate() {
        let i = i as isize;
        let mut sum = 0.0;
        let mut norm = 0.0;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;

        for k in -radius..=radius {
            let j = i + k;
            if j < 0 || j >= n {
                continue;
            }
            let w = weights[k.unsigned_abs()];
            let v = src[j as usize];
            sum += w * v;
            norm += w;
            lo = lo.min(v);
            hi = hi.max(v);
        }

        *out = (sum / norm).clamp(lo, hi);
    }
}
