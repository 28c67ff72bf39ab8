//! Detection result types.
//!
//! Field names on the wire follow the historical result document
//! (`coordinates`, `x_positions`, `processed_image`, ...), so results written
//! by any backend can be read back without translation.

use serde::{Deserialize, Deserializer, Serialize};

/// A grid cell accepted as a peak.
///
/// Serialized as a `[row, col]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Peak {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl Peak {
    /// Creates a new peak.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Euclidean distance to another peak in index space.
    pub fn distance_to(&self, other: &Peak) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

impl From<[usize; 2]> for Peak {
    fn from([row, col]: [usize; 2]) -> Self {
        Self { row, col }
    }
}

impl From<Peak> for [usize; 2] {
    fn from(peak: Peak) -> Self {
        [peak.row, peak.col]
    }
}

/// Summary statistics of the raw grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl GridStats {
    /// Returns true if every statistic is finite.
    pub fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.std_dev.is_finite() && self.min.is_finite() && self.max.is_finite()
    }
}

/// Output of one detection run.
///
/// Constructed once per successful detection and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Accepted peaks in discovery (row-major) order.
    #[serde(rename = "coordinates")]
    pub peaks: Vec<Peak>,
    /// Physical x position of each peak.
    pub x_positions: Vec<f64>,
    /// Physical y position of each peak.
    pub y_positions: Vec<f64>,
    /// Raw (unsmoothed) grid value at each peak.
    pub intensities: Vec<f64>,
    /// Smoothed grid used for the threshold and peak tests.
    #[serde(rename = "processed_image")]
    pub smoothed: Vec<Vec<f64>>,
    /// True where the smoothed grid exceeds the threshold.
    #[serde(default, deserialize_with = "deserialize_mask")]
    pub mask: Vec<Vec<bool>>,
    /// Intensity cutoff: `mean + thresholdFactor * stdDev`.
    pub threshold: f64,
    /// Raw grid statistics.
    pub stats: GridStats,
}

impl DetectionResult {
    /// Number of accepted peaks.
    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    /// Iterates over `(x, y)` physical positions of the peaks.
    pub fn positions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x_positions
            .iter()
            .copied()
            .zip(self.y_positions.iter().copied())
    }

    /// Fills in the mask from the smoothed grid when a backend omitted it.
    ///
    /// Results from older external backends do not carry a mask.
    pub fn fill_missing_mask(&mut self) {
        if self.mask.is_empty() && !self.smoothed.is_empty() {
            self.mask = threshold_mask(&self.smoothed, self.threshold);
        }
    }
}

/// Boolean mask of cells strictly above `threshold`.
pub fn threshold_mask(grid: &[Vec<f64>], threshold: f64) -> Vec<Vec<bool>> {
    grid.iter()
        .map(|row| row.iter().map(|&v| v > threshold).collect())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaskCell {
    Flag(bool),
    Number(f64),
}

fn deserialize_mask<'de, D>(deserializer: D) -> Result<Vec<Vec<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Option<Vec<Vec<MaskCell>>> = Option::deserialize(deserializer)?;
    Ok(rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    MaskCell::Flag(b) => b,
                    MaskCell::Number(n) => n != 0.0,
                })
                .collect()
        })
        .collect())
}
