//! Detection parameters.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default multiplier on the standard deviation.
pub const DEFAULT_THRESHOLD_FACTOR: f64 = 2.5;

/// Default minimum peak separation, in grid-index units.
pub const DEFAULT_MIN_DISTANCE: u32 = 10;

/// Default Gaussian smoothing sigma, in grid-index units.
pub const DEFAULT_SMOOTHING_SIGMA: f64 = 0.7;

fn default_smoothing_sigma() -> f64 {
    DEFAULT_SMOOTHING_SIGMA
}

/// Parameters controlling peak detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionParameters {
    /// Multiplier on the standard deviation above the mean that forms the cutoff.
    pub threshold_factor: f64,
    /// Minimum Euclidean separation between accepted peaks.
    pub min_distance: u32,
    /// Sigma of the Gaussian smoothing kernel. Zero disables smoothing.
    #[serde(default = "default_smoothing_sigma")]
    pub smoothing_sigma: f64,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            threshold_factor: DEFAULT_THRESHOLD_FACTOR,
            min_distance: DEFAULT_MIN_DISTANCE,
            smoothing_sigma: DEFAULT_SMOOTHING_SIGMA,
        }
    }
}

impl DetectionParameters {
    /// Creates parameters with the default smoothing sigma.
    pub fn new(threshold_factor: f64, min_distance: u32) -> Self {
        Self {
            threshold_factor,
            min_distance,
            smoothing_sigma: DEFAULT_SMOOTHING_SIGMA,
        }
    }

    /// Sets the smoothing sigma.
    pub fn with_smoothing_sigma(mut self, sigma: f64) -> Self {
        self.smoothing_sigma = sigma;
        self
    }

    /// Checks that every parameter is in range.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.threshold_factor.is_finite() || self.threshold_factor <= 0.0 {
            return Err(EngineError::invalid_parameters(format!(
                "thresholdFactor must be a positive number, got {}",
                self.threshold_factor
            )));
        }
        if self.min_distance < 1 {
            return Err(EngineError::invalid_parameters(
                "minDistance must be at least 1",
            ));
        }
        if !self.smoothing_sigma.is_finite() || self.smoothing_sigma < 0.0 {
            return Err(EngineError::invalid_parameters(format!(
                "smoothingSigma must be a non-negative number, got {}",
                self.smoothing_sigma
            )));
        }
        Ok(())
    }
}
