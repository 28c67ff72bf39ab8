//! Program discovery and dependency probing.

use std::path::{Path, PathBuf};
use std::process::Command;

use nvision_spec::CancellationToken;
use tracing::debug;

use crate::config::ExternalConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::runner::{run_command, RunLimits};

/// Capture limit for probe output; only the tail of an error is shown.
const PROBE_OUTPUT_LIMIT: usize = 16 * 1024;

/// Finds the backend program.
///
/// Checks, in order: the configured path, the override environment
/// variable, then the program name on `PATH`.
pub fn find_program(config: &ExternalConfig) -> ProcessResult<PathBuf> {
    if let Some(ref path) = config.program_path {
        if path.exists() {
            return Ok(path.clone());
        }
        debug!(path = %path.display(), "configured backend path does not exist");
    }

    if let Some(ref var) = config.env_var {
        if let Some(value) = std::env::var_os(var) {
            let path = PathBuf::from(value);
            if path.exists() {
                return Ok(path);
            }
            debug!(var = %var, path = %path.display(), "backend override path does not exist");
        }
    }

    which::which(&config.program).map_err(|_| ProcessError::NotFound {
        program: config.program.clone(),
    })
}

/// Runs the configured dependency probe against `program`.
///
/// Succeeds immediately when no probe is configured.
pub fn probe_dependencies(config: &ExternalConfig, program: &Path) -> ProcessResult<()> {
    let Some(ref probe_args) = config.probe_args else {
        return Ok(());
    };

    let mut cmd = Command::new(program);
    cmd.args(&config.args).args(probe_args);

    let limits = RunLimits {
        timeout: config.probe_timeout(),
        max_output_bytes: PROBE_OUTPUT_LIMIT,
    };
    let output = match run_command(cmd, limits, &CancellationToken::new()) {
        Ok(output) => output,
        Err(ProcessError::Timeout { timeout_ms }) => {
            return Err(ProcessError::dependency_check_failed(format!(
                "probe timed out after {} ms",
                timeout_ms
            )))
        }
        Err(e) => return Err(e),
    };

    if output.status.success() {
        return Ok(());
    }

    let stderr = output.stderr.text();
    let detail = stderr.trim();
    let exit_code = output.status.code().unwrap_or(-1);
    Err(ProcessError::dependency_check_failed(if detail.is_empty() {
        format!("probe exited with status {}", exit_code)
    } else {
        format!("probe exited with status {}: {}", exit_code, last_line(detail))
    }))
}

fn last_line(text: &str) -> &str {
    text.lines().last().unwrap_or(text)
}
