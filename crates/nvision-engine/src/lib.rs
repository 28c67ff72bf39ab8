//! nvision Detection Engine
//!
//! This crate locates bright, spatially isolated centers in a 2D intensity
//! grid from a fast steering mirror scan. It is pure and synchronous: no I/O,
//! no shared state, safe to call from any number of threads at once.
//!
//! # Pipeline
//!
//! 1. **Statistics**: mean and population standard deviation of the raw grid;
//!    `threshold = mean + thresholdFactor * stdDev`
//! 2. **Smoothing**: separable truncated Gaussian (sigma 0.7 by default),
//!    renormalized over in-bounds taps at the border
//! 3. **Mask**: smoothed cells strictly above the threshold
//! 4. **Local maxima**: interior cells above the threshold that no
//!    8-neighbour exceeds
//! 5. **Suppression**: greedy row-major minimum-distance filter
//! 6. **Mapping**: peak indices interpolated onto the position axes
//!
//! # Example
//!
//! ```
//! use nvision_engine::{detect, generate_sample, SampleProfile};
//! use nvision_spec::DetectionParameters;
//!
//! let frame = generate_sample(SampleProfile::Fallback, 42);
//! let result = detect(&frame, &DetectionParameters::default()).unwrap();
//! assert_eq!(result.peak_count(), 3);
//! ```
//!
//! # Determinism
//!
//! - Same frame + same parameters = bit-identical result
//! - Synthetic scans use PCG32 seeded from a 32-bit seed
//! - PNG encoding uses fixed compression settings

pub mod axis;
pub mod backend;
pub mod detect;
pub mod grid;
pub mod peaks;
pub mod render;
pub mod rng;
pub mod sample;
pub mod smooth;
pub mod stats;

pub use backend::{
    InProcessBackend, SyntheticBackend, DEFAULT_SAMPLE_SEED, IN_PROCESS_ID, SYNTHETIC_ID,
};
pub use detect::{detect, validate_input};
pub use grid::Grid;
pub use render::{hot_colormap, render_png, RenderError};
pub use rng::DeterministicRng;
pub use sample::{generate_sample, SampleProfile, SAMPLE_SIZE};
