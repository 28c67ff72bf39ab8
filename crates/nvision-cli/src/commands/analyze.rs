//! Analyze command implementation
//!
//! Runs a scan through the backend orchestrator and reports the outcome.

use anyhow::{Context, Result};
use colored::Colorize;
use nvision_spec::{BackendOutcome, CancellationToken, CodedError, DetectionParameters, ScanFrame};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::load_config;
use crate::backends::Orchestrator;

/// Error document printed in `--json` mode when no outcome was produced.
#[derive(Debug, Serialize)]
struct JsonError {
    code: &'static str,
    category: &'static str,
    message: String,
}

/// Run the analyze command
///
/// # Arguments
/// * `input` - Scan document in the upload layout
/// * `config_path` - Optional orchestrator configuration file
/// * `out_dir` - Artifact directory, overriding the configuration
/// * `params` - Detection parameters
/// * `json_output` - Print the outcome as JSON instead of a summary
///
/// # Returns
/// Exit code: 0 if an outcome was produced, 1 otherwise
pub fn run(
    input: &Path,
    config_path: Option<&Path>,
    out_dir: Option<&Path>,
    params: DetectionParameters,
    json_output: bool,
) -> Result<ExitCode> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read scan file: {}", input.display()))?;
    let frame = ScanFrame::from_json_str(&text)
        .with_context(|| format!("Failed to parse scan file: {}", input.display()))?;

    let mut config = load_config(config_path)?;
    if let Some(dir) = out_dir {
        config = config.artifact_dir(dir);
    }
    let orchestrator = Orchestrator::from_config(&config);

    if !json_output {
        println!("{} {}", "Analyzing:".cyan().bold(), input.display());
    }

    match orchestrator.run(&frame, &params, &CancellationToken::new()) {
        Ok(outcome) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_summary(&outcome);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if json_output => {
            let doc = JsonError {
                code: err.code(),
                category: err.category(),
                message: err.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(ExitCode::from(1))
        }
        Err(err) => {
            println!("{} [{}] {}", "FAILED".red().bold(), err.code(), err);
            Ok(ExitCode::from(1))
        }
    }
}

fn print_summary(outcome: &BackendOutcome) {
    let result = &outcome.result;

    println!(
        "{} {} ({})",
        "Backend:".dimmed(),
        outcome.backend_id,
        outcome.backend_kind
    );
    if let Some(ref advisory) = outcome.advisory {
        println!("  {} {}", "!!".yellow(), advisory);
    }
    for attempt in outcome.attempts.iter().filter(|a| a.message.is_some()) {
        println!(
            "     {}",
            format!(
                "{}: {}",
                attempt.backend_id,
                attempt.message.as_deref().unwrap_or_default()
            )
            .dimmed()
        );
    }

    println!(
        "{} {:.2} (mean {:.2}, std {:.2}, range {:.2}..{:.2})",
        "Threshold:".dimmed(),
        result.threshold,
        result.stats.mean,
        result.stats.std_dev,
        result.stats.min,
        result.stats.max
    );

    println!();
    println!("{} {}", "Peaks:".bold(), result.peak_count());
    for (i, (peak, (x, y))) in result.peaks.iter().zip(result.positions()).enumerate() {
        println!(
            "  {:>3}  row {:>4}  col {:>4}  x {:>9.3}  y {:>9.3}  counts {:.1}",
            i + 1,
            peak.row,
            peak.col,
            x,
            y,
            result.intensities[i]
        );
    }

    if !outcome.artifacts.is_empty() {
        println!();
        println!("{}", "Artifacts:".bold());
        for key in &outcome.artifacts {
            println!("  {} {}", "->".green(), key);
        }
    }

    println!();
    let status = if outcome.degraded || outcome.is_sample {
        "DEGRADED".yellow().bold()
    } else {
        "SUCCESS".green().bold()
    };
    println!("{} {}", status, outcome.message());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{ "backends": [{ "type": "in_process" }] }"#).unwrap();
        path
    }

    #[test]
    fn test_analyze_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.json");
        let mut counts = vec![vec![10.0; 5]; 5];
        counts[2][2] = 100.0;
        std::fs::write(
            &input,
            serde_json::to_string(&ScanFrame::new(counts).to_json_value()).unwrap(),
        )
        .unwrap();
        let config = write_config(dir.path());
        let out_dir = dir.path().join("out");

        let code = run(
            &input,
            Some(&config),
            Some(&out_dir),
            DetectionParameters::new(1.0, 1),
            true,
        )
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let mut names: Vec<String> = std::fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with(".json"));
        assert!(names[1].ends_with(".png"));
    }

    #[test]
    fn test_analyze_invalid_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.json");
        std::fs::write(&input, r#"{ "datasets": { "ScanCounts": [[1, 2], [3, 4]] } }"#).unwrap();
        let config = write_config(dir.path());

        let code = run(
            &input,
            Some(&config),
            None,
            DetectionParameters::default(),
            false,
        )
        .unwrap();
        assert_eq!(code, ExitCode::from(1));
    }

    #[test]
    fn test_analyze_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &dir.path().join("nope.json"),
            None,
            None,
            DetectionParameters::default(),
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read scan file"));
    }
}
