//! nvision CLI - Command-line interface for scan peak detection
//!
//! This binary analyses scans through the backend orchestrator, generates
//! sample scans, and doubles as the bundled external backend (`worker`).

use clap::Parser;
use nvision_spec::DetectionParameters;
use std::process::ExitCode;

use nvision_cli::{commands, logging};

mod cli_args;

use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            input,
            config,
            out_dir,
            threshold_factor,
            min_distance,
            sigma,
            json,
        } => {
            let mut params = DetectionParameters::new(threshold_factor, min_distance);
            if let Some(sigma) = sigma {
                params = params.with_smoothing_sigma(sigma);
            }
            commands::analyze::run(&input, config.as_deref(), out_dir.as_deref(), params, json)
        }
        Commands::Sample {
            profile,
            seed,
            output,
        } => commands::sample::run(profile, seed, output.as_deref()),
        Commands::Worker { probe: true, .. } => commands::worker::probe(),
        Commands::Worker {
            input: Some(input),
            output: Some(output),
            threshold_factor: Some(threshold_factor),
            min_distance: Some(min_distance),
            sigma,
            ..
        } => commands::worker::run(&input, &output, threshold_factor, min_distance, sigma),
        Commands::Worker { .. } => Err(anyhow::anyhow!(
            "worker needs <input> <output> <thresholdFactor> <minDistance>"
        )),
        Commands::Doctor { config } => commands::doctor::run(config.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nvision_engine::SampleProfile;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parses_worker_protocol() {
        let cli = Cli::try_parse_from([
            "nvision", "worker", "in.json", "out.png", "2.5", "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Worker {
                input,
                output,
                threshold_factor,
                min_distance,
                probe,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("in.json")));
                assert_eq!(output, Some(PathBuf::from("out.png")));
                assert_eq!(threshold_factor, Some(2.5));
                assert_eq!(min_distance, Some(10));
                assert!(!probe);
            }
            _ => panic!("expected worker command"),
        }
    }

    #[test]
    fn test_cli_parses_worker_probe() {
        let cli = Cli::try_parse_from(["nvision", "worker", "--probe"]).unwrap();
        assert!(matches!(cli.command, Commands::Worker { probe: true, .. }));

        assert!(Cli::try_parse_from(["nvision", "worker", "in.json"]).is_err());
    }

    #[test]
    fn test_cli_analyze_defaults() {
        let cli = Cli::try_parse_from(["nvision", "analyze", "--input", "scan.json"]).unwrap();
        match cli.command {
            Commands::Analyze {
                threshold_factor,
                min_distance,
                sigma,
                json,
                ..
            } => {
                assert_eq!(threshold_factor, 2.5);
                assert_eq!(min_distance, 10);
                assert_eq!(sigma, None);
                assert!(!json);
            }
            _ => panic!("expected analyze command"),
        }
    }

    #[test]
    fn test_cli_parses_sample_profile() {
        let cli = Cli::try_parse_from(["nvision", "sample", "--profile", "fallback", "--seed", "7"])
            .unwrap();
        match cli.command {
            Commands::Sample { profile, seed, .. } => {
                assert_eq!(profile, SampleProfile::Fallback);
                assert_eq!(seed, 7);
            }
            _ => panic!("expected sample command"),
        }
    }
}
