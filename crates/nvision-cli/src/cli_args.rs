//! CLI argument definitions for the nvision command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};
use nvision_engine::{SampleProfile, DEFAULT_SAMPLE_SEED};
use nvision_spec::{DEFAULT_MIN_DISTANCE, DEFAULT_THRESHOLD_FACTOR};
use std::path::PathBuf;

/// nvision - NV center detection for confocal scans
#[derive(Parser)]
#[command(name = "nvision")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Log debug output to stderr (overridden by NVISION_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Detect peaks in a scan, falling back through the configured backends
    Analyze {
        /// Path to the scan file (JSON upload layout)
        #[arg(short, long)]
        input: PathBuf,

        /// Orchestrator configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the image and result artifacts
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Standard deviations above the mean for the intensity cutoff
        #[arg(long, default_value_t = DEFAULT_THRESHOLD_FACTOR)]
        threshold_factor: f64,

        /// Minimum separation between peaks, in pixels
        #[arg(long, default_value_t = DEFAULT_MIN_DISTANCE)]
        min_distance: u32,

        /// Gaussian smoothing sigma (0 disables smoothing)
        #[arg(long)]
        sigma: Option<f64>,

        /// Print the outcome as JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic scan in the upload layout
    Sample {
        /// Which synthetic scan to generate (fallback, demo)
        #[arg(short, long, default_value = "demo")]
        profile: SampleProfile,

        /// RNG seed
        #[arg(long, default_value_t = DEFAULT_SAMPLE_SEED)]
        seed: u32,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bundled external backend: <input> <output.png> <thresholdFactor> <minDistance>
    Worker {
        /// Scan file to read
        #[arg(required_unless_present = "probe")]
        input: Option<PathBuf>,

        /// Image path; the result is written to the sibling .json file
        #[arg(required_unless_present = "probe")]
        output: Option<PathBuf>,

        /// Standard deviations above the mean for the intensity cutoff
        #[arg(required_unless_present = "probe")]
        threshold_factor: Option<f64>,

        /// Minimum separation between peaks, in pixels
        #[arg(required_unless_present = "probe")]
        min_distance: Option<u32>,

        /// Gaussian smoothing sigma (default: NVISION_SMOOTHING_SIGMA or 0.7)
        #[arg(long)]
        sigma: Option<f64>,

        /// Check that the worker can run, then exit
        #[arg(long, conflicts_with_all = ["input", "output", "threshold_factor", "min_distance"])]
        probe: bool,
    },

    /// Check backend availability and configuration
    Doctor {
        /// Orchestrator configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
