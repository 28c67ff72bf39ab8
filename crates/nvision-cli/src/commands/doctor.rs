//! Doctor command implementation
//!
//! Probes every configured backend and checks the artifact directory.

use anyhow::Result;
use colored::Colorize;
use nvision_spec::ProbeStatus;
use std::path::Path;
use std::process::ExitCode;

use super::load_config;
use crate::backends::OrchestratorConfig;

/// Run the doctor command
///
/// Checks:
/// - Availability of each configured backend, in preference order
/// - Artifact directory permissions, if one is configured
///
/// Probes run fresh and bypass the process-wide probe cache.
///
/// # Returns
/// Exit code: 0 if at least one backend is available and storage is
/// writable, 1 otherwise
pub fn run(config_path: Option<&Path>) -> Result<ExitCode> {
    println!("{}", "nvision Doctor".cyan().bold());
    println!("{}", "==============".cyan());
    println!();

    println!("{}", "Versions:".bold());
    println!("  {} nvision-cli v{}", "->".green(), env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => println!("  {} config {}", "->".green(), path.display()),
        None => println!("  {} config (built-in defaults)", "->".green()),
    }
    println!();

    let config = load_config(config_path)?;
    let mut all_ok = check_backends(&config);
    println!();

    if let Some(ref dir) = config.artifact_dir {
        println!("{}", "Storage:".bold());
        all_ok &= check_artifact_dir(dir);
        println!();
    }

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

/// Probes each backend. Returns true if any of them is usable.
fn check_backends(config: &OrchestratorConfig) -> bool {
    println!("{}", "Backends:".bold());
    let mut any_available = false;

    for (rank, backend) in config.build_backends().iter().enumerate() {
        let label = format!("{}. {} ({})", rank + 1, backend.id(), backend.kind());
        match backend.probe() {
            ProbeStatus::Available => {
                any_available = true;
                println!("  {} {}", "ok".green(), label);
            }
            ProbeStatus::NotInstalled(detail) => {
                println!("  {} {} not installed", "!!".yellow(), label);
                println!("     {}", detail.dimmed());
            }
            ProbeStatus::MissingDependency(detail) => {
                println!("  {} {} missing dependency", "!!".yellow(), label);
                println!("     {}", detail.dimmed());
            }
        }
    }

    if !any_available {
        println!("  {} no configured backend is available", "!!".red());
    }
    any_available
}

fn check_artifact_dir(dir: &Path) -> bool {
    let probe = dir.join(".nvision_write_test");
    let result = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&probe, "test"));
    match result {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            println!(
                "  {} Artifact directory is writable ({})",
                "ok".green(),
                dir.display()
            );
            true
        }
        Err(e) => {
            println!(
                "  {} Cannot write to artifact directory {}: {}",
                "!!".red(),
                dir.display(),
                e
            );
            false
        }
    }
}
