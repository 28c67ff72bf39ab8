//! Synthetic scan generation.
//!
//! Two profiles reproduce the sample scans the upload service has always
//! served: a high-count fallback scan with three bright centers, and a
//! low-count demo scan with ten.

use std::fmt;
use std::str::FromStr;

use nvision_spec::{default_axis, ScanFrame, ScanMetadata};
use serde::{Deserialize, Serialize};

use crate::rng::DeterministicRng;

/// Side length of every synthetic scan.
pub const SAMPLE_SIZE: usize = 100;

/// Radius of the disc each synthetic center is drawn into.
const CENTER_RADIUS: i64 = 5;

/// Which synthetic scan to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleProfile {
    /// Used when every real backend failed.
    #[default]
    Fallback,
    /// Served by the sample download endpoint.
    Demo,
}

/// A synthetic bright spot at column `x`, row `y`.
#[derive(Debug, Clone, Copy)]
struct Center {
    x: i64,
    y: i64,
    intensity: f64,
}

const fn center(x: i64, y: i64, intensity: f64) -> Center {
    Center { x, y, intensity }
}

const FALLBACK_CENTERS: [Center; 3] = [
    center(25, 35, 120_000.0),
    center(42, 67, 140_000.0),
    center(78, 23, 130_000.0),
];

const DEMO_CENTERS: [Center; 10] = [
    center(25, 35, 1250.0),
    center(42, 67, 1450.0),
    center(78, 23, 1350.0),
    center(56, 89, 1550.0),
    center(12, 45, 1650.0),
    center(67, 34, 1250.0),
    center(89, 56, 1350.0),
    center(34, 78, 1450.0),
    center(45, 23, 1550.0),
    center(78, 45, 1250.0),
];

impl SampleProfile {
    /// Returns the profile name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleProfile::Fallback => "fallback",
            SampleProfile::Demo => "demo",
        }
    }

    /// Lowest background count.
    fn background_floor(&self) -> f64 {
        match self {
            SampleProfile::Fallback => 20_000.0,
            SampleProfile::Demo => 800.0,
        }
    }

    /// Width of the uniform background noise band.
    fn background_span(&self) -> f64 {
        match self {
            SampleProfile::Fallback => 10_000.0,
            SampleProfile::Demo => 400.0,
        }
    }

    /// Level subtracted from a center's intensity before it is added.
    fn baseline(&self) -> f64 {
        match self {
            SampleProfile::Fallback => 30_000.0,
            SampleProfile::Demo => 1_000.0,
        }
    }

    fn centers(&self) -> &'static [Center] {
        match self {
            SampleProfile::Fallback => &FALLBACK_CENTERS,
            SampleProfile::Demo => &DEMO_CENTERS,
        }
    }

    fn axis(&self) -> Vec<f64> {
        match self {
            SampleProfile::Fallback => default_axis(SAMPLE_SIZE),
            SampleProfile::Demo => (0..SAMPLE_SIZE).map(|i| i as f64 * 0.1).collect(),
        }
    }

    fn metadata(&self) -> ScanMetadata {
        let (center_of_scan, sweep) = match self {
            SampleProfile::Fallback => ([0.0, 0.0], [30.0, 30.0]),
            SampleProfile::Demo => ([5.0, 5.0], [10.0, 10.0]),
        };
        ScanMetadata {
            center_of_scan: Some(center_of_scan),
            sweep_ranges: Some(sweep),
            scan_points_per_axis: Some(SAMPLE_SIZE as u32),
        }
    }
}

impl fmt::Display for SampleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fallback" => Ok(SampleProfile::Fallback),
            "demo" => Ok(SampleProfile::Demo),
            other => Err(format!(
                "unknown sample profile '{}', expected 'fallback' or 'demo'",
                other
            )),
        }
    }
}

/// Generates a synthetic scan. The same profile and seed always produce the
/// same frame.
pub fn generate_sample(profile: SampleProfile, seed: u32) -> ScanFrame {
    let mut rng = DeterministicRng::new(DeterministicRng::derive_seed(seed, profile.as_str()));

    let floor = profile.background_floor();
    let span = profile.background_span();
    let mut counts: Vec<Vec<f64>> = (0..SAMPLE_SIZE)
        .map(|_| {
            (0..SAMPLE_SIZE)
                .map(|_| floor + rng.gen_f64() * span)
                .collect()
        })
        .collect();

    for c in profile.centers() {
        add_center(&mut counts, c, profile.baseline());
    }

    let axis = profile.axis();
    ScanFrame::new(counts)
        .with_axes(axis.clone(), axis)
        .with_metadata(profile.metadata())
}

fn add_center(counts: &mut [Vec<f64>], c: &Center, baseline: f64) {
    let radius = CENTER_RADIUS as f64;
    let size = SAMPLE_SIZE as i64;
    for dy in -CENTER_RADIUS..=CENTER_RADIUS {
        for dx in -CENTER_RADIUS..=CENTER_RADIUS {
            let (row, col) = (c.y + dy, c.x + dx);
            if row < 0 || row >= size || col < 0 || col >= size {
                continue;
            }
            let dist_sq = (dx * dx + dy * dy) as f64;
            if dist_sq.sqrt() <= radius {
                let factor = (-dist_sq / (radius * 0.5)).exp();
                counts[row as usize][col as usize] += (c.intensity - baseline) * factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect;
    use nvision_spec::DetectionParameters;

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(
            generate_sample(SampleProfile::Demo, 9),
            generate_sample(SampleProfile::Demo, 9)
        );
        assert_ne!(
            generate_sample(SampleProfile::Demo, 9),
            generate_sample(SampleProfile::Demo, 10)
        );
    }

    #[test]
    fn test_fallback_layout() {
        let frame = generate_sample(SampleProfile::Fallback, 42);
        assert_eq!(frame.rows(), SAMPLE_SIZE);
        assert_eq!(frame.cols(), SAMPLE_SIZE);

        let x = frame.x_axis.as_deref().unwrap();
        assert_eq!(x[0], -15.0);
        assert!((x[99] - 15.0).abs() < 1e-12);

        // Center (x=42, y=67) gains 110000 on top of the background.
        assert!(frame.counts[67][42] >= 130_000.0);
        let meta = frame.metadata.unwrap();
        assert_eq!(meta.sweep_ranges, Some([30.0, 30.0]));
    }

    #[test]
    fn test_demo_background_band() {
        let frame = generate_sample(SampleProfile::Demo, 1);
        assert!((800.0..1200.0).contains(&frame.counts[0][0]));
        assert_eq!(frame.y_axis.as_deref().unwrap()[10], 1.0);
    }

    #[test]
    fn test_fallback_centers_are_detected() {
        let frame = generate_sample(SampleProfile::Fallback, 42);
        let result = detect(&frame, &DetectionParameters::default()).unwrap();
        let found: Vec<(usize, usize)> = result.peaks.iter().map(|p| (p.row, p.col)).collect();
        assert_eq!(found, vec![(23, 78), (35, 25), (67, 42)]);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!("demo".parse::<SampleProfile>(), Ok(SampleProfile::Demo));
        assert!("other".parse::<SampleProfile>().is_err());
    }
}
