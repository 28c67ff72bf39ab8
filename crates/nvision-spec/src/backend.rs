//! Backend adapter contract.
//!
//! Every execution variant (in-process engine, external process, synthetic
//! data) implements [`DetectionBackend`]. The orchestrator only sees this
//! trait, so new variants can be added without touching its state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BackendFailure, UnavailableKind};
use crate::frame::ScanFrame;
use crate::outcome::BackendKind;
use crate::params::DetectionParameters;
use crate::result::DetectionResult;

/// Default per-run timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default cap on captured stdout/stderr, per stream.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1 << 20;

/// Shared flag a caller sets to abandon a request.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the request as abandoned.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of an availability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProbeStatus {
    /// Ready to run.
    Available,
    /// The program or runtime is absent.
    NotInstalled(String),
    /// The program is present but a dependency check failed.
    MissingDependency(String),
}

impl ProbeStatus {
    /// Returns true if the backend can be run.
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeStatus::Available)
    }

    /// Converts a failed probe into the failure the orchestrator records.
    pub fn into_failure(self) -> Option<BackendFailure> {
        match self {
            ProbeStatus::Available => None,
            ProbeStatus::NotInstalled(msg) => Some(BackendFailure::unavailable(
                UnavailableKind::NotInstalled,
                msg,
            )),
            ProbeStatus::MissingDependency(msg) => Some(BackendFailure::unavailable(
                UnavailableKind::MissingDependency,
                msg,
            )),
        }
    }
}

/// Everything a backend needs for one run.
#[derive(Clone, Copy)]
pub struct BackendRequest<'a> {
    /// Frame to analyse.
    pub frame: &'a ScanFrame,
    /// Detection parameters.
    pub params: &'a DetectionParameters,
    /// Content hash of the request, used to name artifacts.
    pub request_key: &'a str,
    /// Cancellation flag shared with the caller.
    pub cancel: &'a CancellationToken,
    /// Upper bound on wall time for blocking backends.
    pub timeout: Duration,
    /// Upper bound on captured output per stream.
    pub max_output_bytes: usize,
    /// Whether the caller wants a rendered image back.
    pub render_image: bool,
}

impl<'a> BackendRequest<'a> {
    /// Creates a request with default limits and no store.
    pub fn new(
        frame: &'a ScanFrame,
        params: &'a DetectionParameters,
        request_key: &'a str,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            frame,
            params,
            request_key,
            cancel,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            render_image: false,
        }
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the output capture limit.
    pub fn max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Asks the backend to return a rendered image with its result.
    pub fn render_image(mut self, render: bool) -> Self {
        self.render_image = render;
        self
    }
}

/// Successful backend run.
///
/// Backends never write to storage themselves. The orchestrator persists
/// the image and result only after the run has been accepted.
#[derive(Debug, Clone)]
pub struct BackendRun {
    /// Detection result, not yet validated by the orchestrator.
    pub result: DetectionResult,
    /// Frame that was actually analysed, when it is not the request frame.
    pub analysed_frame: Option<ScanFrame>,
    /// PNG bytes of the visualization, when one was requested and produced.
    pub image: Option<Vec<u8>>,
}

impl BackendRun {
    /// Creates a run over the request frame with no image.
    pub fn new(result: DetectionResult) -> Self {
        Self {
            result,
            analysed_frame: None,
            image: None,
        }
    }

    /// Records that a substitute frame was analysed.
    pub fn with_analysed_frame(mut self, frame: ScanFrame) -> Self {
        self.analysed_frame = Some(frame);
        self
    }

    /// Attaches the rendered image.
    pub fn with_image(mut self, png: Vec<u8>) -> Self {
        self.image = Some(png);
        self
    }
}

/// An interchangeable implementation of the detection contract.
pub trait DetectionBackend: Send + Sync {
    /// Stable identifier used in outcomes and probe caching.
    fn id(&self) -> &str;

    /// Execution variant.
    fn kind(&self) -> BackendKind;

    /// Checks whether the backend can run, without committing resources.
    fn probe(&self) -> ProbeStatus;

    /// Runs detection.
    fn run(&self, request: &BackendRequest<'_>) -> Result<BackendRun, BackendFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_probe_status_into_failure() {
        assert!(ProbeStatus::Available.into_failure().is_none());
        let failure = ProbeStatus::NotInstalled("python".into())
            .into_failure()
            .unwrap();
        assert!(matches!(
            failure,
            BackendFailure::Unavailable {
                kind: UnavailableKind::NotInstalled,
                ..
            }
        ));
    }

    #[test]
    fn test_request_builder() {
        let frame = ScanFrame::new(vec![vec![0.0; 3]; 3]);
        let params = DetectionParameters::default();
        let cancel = CancellationToken::new();
        let request = BackendRequest::new(&frame, &params, "key", &cancel)
            .timeout(Duration::from_secs(2))
            .max_output_bytes(64)
            .render_image(true);
        assert_eq!(request.timeout, Duration::from_secs(2));
        assert_eq!(request.max_output_bytes, 64);
        assert!(request.render_image);
    }
}
