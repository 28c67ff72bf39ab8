//! Orchestrator-level outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BackendFailure, UnavailableKind};
use crate::frame::ScanFrame;
use crate::result::DetectionResult;

/// Execution variant of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Runs the engine inside the current process.
    InProcess,
    /// Runs an external program over the file protocol.
    ExternalProcess,
    /// Runs the engine on generated sample data.
    Synthetic,
}

impl BackendKind {
    /// Returns the string identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::InProcess => "in_process",
            BackendKind::ExternalProcess => "external_process",
            BackendKind::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a more-preferred backend was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationReason {
    /// The preferred backend is not installed.
    NotInstalled,
    /// The preferred backend is installed but lacks a dependency.
    MissingDependency,
    /// The preferred backend ran and failed.
    RaisedError,
}

impl DegradationReason {
    /// Maps a candidate failure to the reason it implies.
    ///
    /// Returns `None` for cancellation, which never degrades.
    pub fn from_failure(failure: &BackendFailure) -> Option<Self> {
        match failure {
            BackendFailure::Unavailable {
                kind: UnavailableKind::NotInstalled,
                ..
            } => Some(Self::NotInstalled),
            BackendFailure::Unavailable {
                kind: UnavailableKind::MissingDependency,
                ..
            } => Some(Self::MissingDependency),
            BackendFailure::Execution { .. } | BackendFailure::OutputInvalid { .. } => {
                Some(Self::RaisedError)
            }
            BackendFailure::Cancelled => None,
        }
    }
}

impl fmt::Display for DegradationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradationReason::NotInstalled => write!(f, "preferred backend not installed"),
            DegradationReason::MissingDependency => {
                write!(f, "preferred backend missing dependency")
            }
            DegradationReason::RaisedError => write!(f, "preferred backend raised an error"),
        }
    }
}

/// Terminal state of one candidate attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    /// The availability probe failed; the backend was not run.
    Unavailable,
    /// The backend ran and failed, or its output was rejected.
    Failed,
    /// The backend produced the accepted result.
    Succeeded,
}

/// Record of one candidate the orchestrator tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    /// Backend identifier.
    pub backend_id: String,
    /// Backend execution variant.
    pub kind: BackendKind,
    /// How the attempt ended.
    pub state: AttemptState,
    /// Failure detail, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AttemptRecord {
    /// Creates a record for a successful attempt.
    pub fn succeeded(backend_id: impl Into<String>, kind: BackendKind) -> Self {
        Self {
            backend_id: backend_id.into(),
            kind,
            state: AttemptState::Succeeded,
            message: None,
        }
    }

    /// Creates a record for a failed or unavailable attempt.
    pub fn from_failure(
        backend_id: impl Into<String>,
        kind: BackendKind,
        failure: &BackendFailure,
    ) -> Self {
        let state = match failure {
            BackendFailure::Unavailable { .. } => AttemptState::Unavailable,
            _ => AttemptState::Failed,
        };
        Self {
            backend_id: backend_id.into(),
            kind,
            state,
            message: Some(failure.to_string()),
        }
    }
}

/// A detection result plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendOutcome {
    /// The accepted, validated result.
    #[serde(rename = "results")]
    pub result: DetectionResult,
    /// Backend that produced `results`.
    pub backend_id: String,
    /// Execution variant of that backend.
    pub backend_kind: BackendKind,
    /// True if a more-preferred backend was skipped or failed.
    pub degraded: bool,
    /// Reason derived from the most-preferred failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DegradationReason>,
    /// Human-readable advisory for the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    /// True if `results` were computed on synthetic data.
    pub is_sample: bool,
    /// The synthetic frame analysed when `is_sample` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_frame: Option<ScanFrame>,
    /// Every candidate tried, in order.
    pub attempts: Vec<AttemptRecord>,
    /// Content hash of the request.
    pub request_key: String,
    /// Keys of artifacts written to the store.
    #[serde(default)]
    pub artifacts: Vec<String>,
}

impl BackendOutcome {
    /// Human-readable status line, in the style of the historical API
    /// messages.
    pub fn message(&self) -> String {
        let mut msg = format!("Analysis completed with {} backend", self.backend_id);
        if self.is_sample {
            msg.push_str(" on sample data");
        }
        if let Some(reason) = self.reason {
            msg.push_str(&format!(" ({})", reason));
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(
            DegradationReason::NotInstalled.to_string(),
            "preferred backend not installed"
        );
        assert_eq!(
            DegradationReason::MissingDependency.to_string(),
            "preferred backend missing dependency"
        );
        assert_eq!(
            DegradationReason::RaisedError.to_string(),
            "preferred backend raised an error"
        );
    }

    #[test]
    fn test_reason_from_failure() {
        let f = BackendFailure::unavailable(UnavailableKind::NotInstalled, "python");
        assert_eq!(
            DegradationReason::from_failure(&f),
            Some(DegradationReason::NotInstalled)
        );
        let f = BackendFailure::output_invalid("bad shape");
        assert_eq!(
            DegradationReason::from_failure(&f),
            Some(DegradationReason::RaisedError)
        );
        assert_eq!(DegradationReason::from_failure(&BackendFailure::Cancelled), None);
    }

    #[test]
    fn test_attempt_record_state() {
        let f = BackendFailure::unavailable(UnavailableKind::MissingDependency, "scipy");
        let rec = AttemptRecord::from_failure("python", BackendKind::ExternalProcess, &f);
        assert_eq!(rec.state, AttemptState::Unavailable);

        let f = BackendFailure::execution("exit 1");
        let rec = AttemptRecord::from_failure("python", BackendKind::ExternalProcess, &f);
        assert_eq!(rec.state, AttemptState::Failed);
        assert!(rec.message.unwrap().contains("exit 1"));
    }

    #[test]
    fn test_backend_kind_serde() {
        let json = serde_json::to_string(&BackendKind::ExternalProcess).unwrap();
        assert_eq!(json, "\"external_process\"");
        assert_eq!(BackendKind::InProcess.to_string(), "in_process");
    }
}
