//! Worker command implementation
//!
//! The bundled external backend. Speaks the same file protocol as any other
//! external program: reads the scan from `<input>`, writes the image to
//! `<output.png>` and the result to the sibling `.json` file.

use anyhow::{bail, Context, Result};
use nvision_backend_process::SIGMA_ENV_VAR;
use nvision_engine::{detect, render_png};
use nvision_spec::{DetectionParameters, ScanFrame, DEFAULT_SMOOTHING_SIGMA};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

/// Answer a dependency probe.
///
/// The worker links the engine statically, so there is nothing to check
/// beyond having been started at all.
pub fn probe() -> Result<ExitCode> {
    println!("ok");
    Ok(ExitCode::SUCCESS)
}

/// Picks the smoothing sigma: the flag, then the environment, then the default.
pub fn resolve_sigma(flag: Option<f64>, env_value: Option<&str>) -> Result<f64> {
    if let Some(sigma) = flag {
        return Ok(sigma);
    }
    match env_value {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Invalid {} value: '{}'", SIGMA_ENV_VAR, raw)),
        None => Ok(DEFAULT_SMOOTHING_SIGMA),
    }
}

/// Run the worker command
///
/// # Arguments
/// * `input` - Scan document in the upload layout
/// * `output` - Image path; the result is written next to it with a `.json` extension
/// * `threshold_factor` - Standard deviations above the mean
/// * `min_distance` - Minimum peak separation in pixels
/// * `sigma` - Smoothing sigma override
///
/// # Returns
/// Exit code 0 when both files were written
pub fn run(
    input: &Path,
    output: &Path,
    threshold_factor: f64,
    min_distance: u32,
    sigma: Option<f64>,
) -> Result<ExitCode> {
    if output.extension().and_then(|e| e.to_str()) == Some("json") {
        bail!(
            "Output path {} would be overwritten by the result file",
            output.display()
        );
    }

    let env_sigma = std::env::var(SIGMA_ENV_VAR).ok();
    let sigma = resolve_sigma(sigma, env_sigma.as_deref())?;
    let params = DetectionParameters::new(threshold_factor, min_distance).with_smoothing_sigma(sigma);

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read scan file: {}", input.display()))?;
    let frame = ScanFrame::from_json_str(&text)
        .with_context(|| format!("Failed to parse scan file: {}", input.display()))?;

    let result = detect(&frame, &params)?;
    debug!(
        rows = frame.rows(),
        cols = frame.cols(),
        peaks = result.peak_count(),
        "worker detection finished"
    );

    let image = render_png(&frame.counts, &result)?;
    std::fs::write(output, image)
        .with_context(|| format!("Failed to write image: {}", output.display()))?;

    let result_path = output.with_extension("json");
    let json = serde_json::to_vec_pretty(&result)?;
    std::fs::write(&result_path, json)
        .with_context(|| format!("Failed to write result: {}", result_path.display()))?;

    Ok(ExitCode::SUCCESS)
}
