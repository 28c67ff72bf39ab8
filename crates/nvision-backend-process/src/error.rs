//! Error types for the external process backend.

use std::path::PathBuf;

use nvision_spec::{BackendFailure, CodedError, UnavailableKind};
use thiserror::Error;

/// Result type for external process operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors that can occur while locating, probing or running an external
/// backend program.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Backend program not found.
    #[error("Backend program '{program}' not found. Install it, put it on PATH, or set NVISION_BACKEND")]
    NotFound { program: String },

    /// Dependency probe exited with an error or timed out.
    #[error("Backend dependency check failed: {message}")]
    DependencyCheckFailed { message: String },

    /// Failed to spawn the backend process.
    #[error("Failed to spawn backend process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// Backend process timed out.
    #[error("Backend process timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u128 },

    /// The request was cancelled while the process was running.
    #[error("Backend process cancelled")]
    Cancelled,

    /// Backend process exited with non-zero status.
    #[error("Backend process exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// Failed to write the input document.
    #[error("Failed to write input file: {0}")]
    WriteInputFailed(#[source] std::io::Error),

    /// Image artifact missing or empty after a successful exit.
    #[error("Expected image artifact not found or empty: {path}")]
    ImageMissing { path: PathBuf },

    /// Failed to read the result document.
    #[error("Failed to read backend result from {path}: {source}")]
    ReadResultFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Result document is not a valid detection result.
    #[error("Failed to parse backend result: {0}")]
    ParseResultFailed(#[source] serde_json::Error),

    /// Failed to serialize the input document.
    #[error("Failed to serialize input: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new dependency check failed error.
    pub fn dependency_check_failed(message: impl Into<String>) -> Self {
        Self::DependencyCheckFailed {
            message: message.into(),
        }
    }
}

impl CodedError for ProcessError {
    fn code(&self) -> &'static str {
        match self {
            ProcessError::NotFound { .. } => "PROCESS_001",
            ProcessError::DependencyCheckFailed { .. } => "PROCESS_002",
            ProcessError::SpawnFailed(_) => "PROCESS_003",
            ProcessError::Timeout { .. } => "PROCESS_004",
            ProcessError::Cancelled => "PROCESS_005",
            ProcessError::ProcessFailed { .. } => "PROCESS_006",
            ProcessError::WriteInputFailed(_) => "PROCESS_007",
            ProcessError::ImageMissing { .. } => "PROCESS_008",
            ProcessError::ReadResultFailed { .. } => "PROCESS_009",
            ProcessError::ParseResultFailed(_) => "PROCESS_010",
            ProcessError::SerializeFailed(_) => "PROCESS_011",
            ProcessError::Io(_) => "PROCESS_012",
        }
    }

    fn category(&self) -> &'static str {
        "process"
    }
}

impl From<ProcessError> for BackendFailure {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound { .. } => {
                BackendFailure::unavailable(UnavailableKind::NotInstalled, err.to_string())
            }
            ProcessError::DependencyCheckFailed { .. } => {
                BackendFailure::unavailable(UnavailableKind::MissingDependency, err.to_string())
            }
            ProcessError::Cancelled => BackendFailure::Cancelled,
            ProcessError::ParseResultFailed(_) => BackendFailure::output_invalid(err.to_string()),
            other => BackendFailure::execution(format!("[{}] {}", other.code(), other)),
        }
    }
}
