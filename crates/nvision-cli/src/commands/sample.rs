//! Sample command implementation
//!
//! Writes a synthetic scan in the upload layout.

use anyhow::{Context, Result};
use colored::Colorize;
use nvision_engine::{generate_sample, SampleProfile};
use std::path::Path;
use std::process::ExitCode;

/// Run the sample command
///
/// # Arguments
/// * `profile` - Which synthetic scan to generate
/// * `seed` - RNG seed
/// * `output` - Output file path (default: stdout)
pub fn run(profile: SampleProfile, seed: u32, output: Option<&Path>) -> Result<ExitCode> {
    let frame = generate_sample(profile, seed);
    let json = serde_json::to_string_pretty(&frame.to_json_value())?;

    match output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("Failed to write sample: {}", path.display()))?;
            println!(
                "{} {} sample ({}x{}, seed {}) to {}",
                "Wrote".green().bold(),
                profile,
                frame.rows(),
                frame.cols(),
                seed,
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(ExitCode::SUCCESS)
}
