//! External backend configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the backend program path.
pub const BACKEND_ENV_VAR: &str = "NVISION_BACKEND";

/// Program name of the bundled worker.
const WORKER_PROGRAM: &str = "nvision";

/// Subcommand that runs the bundled worker.
const WORKER_SUBCOMMAND: &str = "worker";

/// Default timeout for the dependency probe.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

fn default_env_var() -> Option<String> {
    Some(BACKEND_ENV_VAR.to_string())
}

fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

/// How to find, probe and invoke an external backend program.
///
/// The program is called as
/// `<program> <args...> <input.json> <output.png> <thresholdFactor> <minDistance>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Backend id reported in outcomes.
    pub id: String,
    /// Program name looked up on `PATH`.
    pub program: String,
    /// Explicit program path, checked first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_path: Option<PathBuf>,
    /// Arguments placed before the protocol arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Arguments (after `args`) for the dependency probe. No probe if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_args: Option<Vec<String>>,
    /// Probe timeout in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Environment variable holding an override path. `None` disables it.
    #[serde(default = "default_env_var")]
    pub env_var: Option<String>,
}

impl ExternalConfig {
    /// Creates a config that looks `program` up on `PATH`.
    pub fn new(id: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            program: program.into(),
            program_path: None,
            args: Vec::new(),
            probe_args: None,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            env_var: default_env_var(),
        }
    }

    /// Config for the bundled `nvision worker` command.
    pub fn bundled_worker(id: impl Into<String>) -> Self {
        Self::new(id, WORKER_PROGRAM)
            .args([WORKER_SUBCOMMAND])
            .probe_args(["--probe"])
    }

    /// Returns true if this runs the bundled `nvision worker` command.
    pub fn is_bundled_worker(&self) -> bool {
        self.program == WORKER_PROGRAM && self.args == [WORKER_SUBCOMMAND]
    }

    /// Sets the program path.
    pub fn program_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.program_path = Some(path.into());
        self
    }

    /// Sets the leading arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the probe arguments.
    pub fn probe_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.probe_args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the probe timeout in seconds.
    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.probe_timeout_secs = secs;
        self
    }

    /// Sets or clears the override environment variable.
    pub fn env_var(mut self, var: Option<&str>) -> Self {
        self.env_var = var.map(str::to_string);
        self
    }

    /// Probe timeout as a duration.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
