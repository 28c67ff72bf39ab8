//! The external process backend adapter.

use std::path::Path;
use std::process::Command;

use nvision_spec::{
    BackendFailure, BackendKind, BackendRequest, BackendRun, DetectionBackend, DetectionResult,
    ProbeStatus,
};
use tracing::debug;

use crate::config::ExternalConfig;
use crate::error::{ProcessError, ProcessResult};
use crate::locate::{find_program, probe_dependencies};
use crate::runner::{run_command, RunLimits};

/// Environment variable carrying the smoothing sigma to the child.
///
/// The positional protocol has no slot for it; programs that do not know it
/// ignore it.
pub const SIGMA_ENV_VAR: &str = "NVISION_SMOOTHING_SIGMA";

const INPUT_FILE: &str = "input.json";
const IMAGE_FILE: &str = "output.png";

/// Runs detection in a separate program over the file protocol.
///
/// The program reads the scan from `input.json`, writes an image to
/// `output.png` and the result document to the sibling `output.json`, all
/// inside a private scratch directory.
#[derive(Debug, Clone)]
pub struct ExternalProcessBackend {
    config: ExternalConfig,
}

impl ExternalProcessBackend {
    /// Creates a backend from its configuration.
    pub fn new(config: ExternalConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExternalConfig {
        &self.config
    }

    fn execute(&self, request: &BackendRequest<'_>) -> ProcessResult<BackendRun> {
        if request.cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }
        let program = find_program(&self.config)?;

        let scratch = tempfile::Builder::new()
            .prefix("nvision_backend_")
            .tempdir()?;
        let input_path = scratch.path().join(INPUT_FILE);
        let image_path = scratch.path().join(IMAGE_FILE);
        let result_path = image_path.with_extension("json");

        let input = serde_json::to_vec(&request.frame.to_json_value())
            .map_err(ProcessError::SerializeFailed)?;
        std::fs::write(&input_path, input).map_err(ProcessError::WriteInputFailed)?;

        let mut cmd = Command::new(&program);
        cmd.args(&self.config.args)
            .arg(&input_path)
            .arg(&image_path)
            .arg(request.params.threshold_factor.to_string())
            .arg(request.params.min_distance.to_string())
            .env(SIGMA_ENV_VAR, request.params.smoothing_sigma.to_string())
            .current_dir(scratch.path());

        debug!(
            backend = %self.config.id,
            program = %program.display(),
            timeout = ?request.timeout,
            "spawning external backend"
        );
        let limits = RunLimits {
            timeout: request.timeout,
            max_output_bytes: request.max_output_bytes,
        };
        let output = run_command(cmd, limits, request.cancel)?;

        if output.stdout.truncated || output.stderr.truncated {
            debug!(
                backend = %self.config.id,
                limit = request.max_output_bytes,
                "backend output truncated"
            );
        }
        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            return Err(ProcessError::process_failed(
                exit_code,
                output.stderr.text().trim(),
            ));
        }

        let image = read_image(&image_path)?;
        let raw_result =
            std::fs::read(&result_path).map_err(|e| ProcessError::ReadResultFailed {
                path: result_path.clone(),
                source: e,
            })?;
        let mut result: DetectionResult =
            serde_json::from_slice(&raw_result).map_err(ProcessError::ParseResultFailed)?;
        result.fill_missing_mask();

        let run = BackendRun::new(result);
        Ok(if request.render_image {
            run.with_image(image)
        } else {
            run
        })
    }
}

/// Reads the image artifact, treating a missing or empty file as a failure.
fn read_image(path: &Path) -> ProcessResult<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(ProcessError::ImageMissing {
            path: path.to_path_buf(),
        }),
    }
}

impl DetectionBackend for ExternalProcessBackend {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::ExternalProcess
    }

    fn probe(&self) -> ProbeStatus {
        let program = match find_program(&self.config) {
            Ok(program) => program,
            Err(e) => return ProbeStatus::NotInstalled(e.to_string()),
        };
        match probe_dependencies(&self.config, &program) {
            Ok(()) => ProbeStatus::Available,
            Err(e @ ProcessError::DependencyCheckFailed { .. }) => {
                ProbeStatus::MissingDependency(e.to_string())
            }
            Err(e) => ProbeStatus::NotInstalled(e.to_string()),
        }
    }

    fn run(&self, request: &BackendRequest<'_>) -> Result<BackendRun, BackendFailure> {
        self.execute(request).map_err(BackendFailure::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_image_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.png");
        assert!(matches!(
            read_image(&path),
            Err(ProcessError::ImageMissing { .. })
        ));

        std::fs::write(&path, b"").unwrap();
        assert!(read_image(&path).is_err());

        std::fs::write(&path, b"\x89PNG").unwrap();
        assert_eq!(read_image(&path).unwrap(), b"\x89PNG".to_vec());
    }

    #[test]
    fn test_missing_program_probes_not_installed() {
        let backend = ExternalProcessBackend::new(
            ExternalConfig::new("missing", "nvision-no-such-program-xyz").env_var(None),
        );
        assert_eq!(backend.kind(), BackendKind::ExternalProcess);
        assert!(matches!(backend.probe(), ProbeStatus::NotInstalled(_)));
    }
}
