//! Ordered backend fallback.

use std::sync::Arc;
use std::time::Duration;

use nvision_engine::validate_input;
use nvision_spec::{
    describe_errors, request_key, validate_result, ArtifactStore, AttemptRecord, BackendFailure,
    BackendKind, BackendOutcome, BackendRequest, BackendRun, CancellationToken, CodedError,
    DegradationReason, DetectionBackend, DetectionParameters, DirStore, EngineError, ScanFrame,
    StorageError, DEFAULT_MAX_OUTPUT_BYTES,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::{auto_timeout, OrchestratorConfig};
use super::probe_cache::ProbeCache;

/// Errors that end a request without an outcome.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The input cannot be analysed by any backend.
    #[error("{0}")]
    InvalidInput(#[from] EngineError),

    /// Every backend was unavailable or failed.
    #[error("All backends failed: {}", summarize(.attempts))]
    Exhausted { attempts: Vec<AttemptRecord> },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// The request or result could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The accepted result could not be stored.
    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl CodedError for OrchestratorError {
    fn code(&self) -> &'static str {
        match self {
            OrchestratorError::InvalidInput(_) => "ORCH_001",
            OrchestratorError::Exhausted { .. } => "ORCH_002",
            OrchestratorError::Cancelled => "ORCH_003",
            OrchestratorError::Serialize(_) => "ORCH_004",
            OrchestratorError::Storage(_) => "ORCH_005",
        }
    }

    fn category(&self) -> &'static str {
        "orchestrator"
    }
}

fn summarize(attempts: &[AttemptRecord]) -> String {
    attempts
        .iter()
        .map(|a| match a.message {
            Some(ref msg) => format!("{}: {}", a.backend_id, msg),
            None => a.backend_id.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Runs a request through an ordered list of backends.
///
/// Each candidate is probed (once per process, through the [`ProbeCache`]),
/// run, and its output validated against the analysed frame. The first
/// candidate that passes produces the outcome; every failure before it is
/// recorded and marks the outcome degraded.
pub struct Orchestrator {
    backends: Vec<Box<dyn DetectionBackend>>,
    timeout: Option<Duration>,
    max_output_bytes: usize,
    store: Option<Box<dyn ArtifactStore>>,
    cache: Arc<ProbeCache>,
}

impl Orchestrator {
    /// Creates an orchestrator over `backends`, most preferred first.
    pub fn new(backends: Vec<Box<dyn DetectionBackend>>) -> Self {
        Self {
            backends,
            timeout: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            store: None,
            cache: ProbeCache::global(),
        }
    }

    /// Creates an orchestrator from a configuration.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let mut orchestrator =
            Self::new(config.build_backends()).max_output_bytes(config.max_output_bytes);
        if let Some(secs) = config.timeout_secs {
            orchestrator = orchestrator.timeout(Duration::from_secs(secs));
        }
        if let Some(ref dir) = config.artifact_dir {
            orchestrator = orchestrator.store(Box::new(DirStore::new(dir)));
        }
        orchestrator
    }

    /// Sets a fixed per-backend timeout instead of the size-derived one.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the output capture limit.
    pub fn max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Sets the artifact store.
    pub fn store(mut self, store: Box<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses a private probe cache instead of the process-wide one.
    pub fn with_cache(mut self, cache: Arc<ProbeCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The configured backends, in order.
    pub fn backends(&self) -> &[Box<dyn DetectionBackend>] {
        &self.backends
    }

    /// Analyses `frame`, falling back through the backends until one succeeds.
    pub fn run(
        &self,
        frame: &ScanFrame,
        params: &DetectionParameters,
        cancel: &CancellationToken,
    ) -> Result<BackendOutcome, OrchestratorError> {
        validate_input(frame, params)?;
        let key = request_key(frame, params)?;
        let timeout = self
            .timeout
            .unwrap_or_else(|| auto_timeout(frame.rows() * frame.cols()));

        let mut attempts = Vec::new();
        let mut reason = None;

        for backend in &self.backends {
            if cancel.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }
            let (id, kind) = (backend.id(), backend.kind());

            if let Some(failure) = self.cache.probe(backend.as_ref()).into_failure() {
                warn!(backend = id, error = %failure, "backend unavailable, skipping");
                record_failure(&mut attempts, &mut reason, id, kind, &failure);
                continue;
            }

            let request = BackendRequest::new(frame, params, &key, cancel)
                .timeout(timeout)
                .max_output_bytes(self.max_output_bytes)
                .render_image(self.store.is_some());

            debug!(backend = id, kind = %kind, "running backend");
            let run = match backend.run(&request).and_then(|run| accept(run, frame)) {
                Ok(run) => run,
                Err(BackendFailure::Cancelled) => return Err(OrchestratorError::Cancelled),
                Err(failure) => {
                    warn!(backend = id, error = %failure, "backend failed, trying next");
                    record_failure(&mut attempts, &mut reason, id, kind, &failure);
                    continue;
                }
            };
            if cancel.is_cancelled() {
                debug!(backend = id, "discarding result of cancelled request");
                return Err(OrchestratorError::Cancelled);
            }

            let degraded = !attempts.is_empty();
            attempts.push(AttemptRecord::succeeded(id, kind));
            return self.finish(run, &key, id, kind, degraded, reason, attempts);
        }

        Err(OrchestratorError::Exhausted { attempts })
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        run: BackendRun,
        key: &str,
        id: &str,
        kind: BackendKind,
        degraded: bool,
        reason: Option<DegradationReason>,
        attempts: Vec<AttemptRecord>,
    ) -> Result<BackendOutcome, OrchestratorError> {
        let is_sample = kind == BackendKind::Synthetic;
        let mut artifacts = Vec::new();

        if let Some(ref store) = self.store {
            if let Some(ref png) = run.image {
                let image_key = format!("{}.png", key);
                store.write(&image_key, png)?;
                artifacts.push(image_key);
            }
            let result_key = format!("{}.json", key);
            store.write(&result_key, &serde_json::to_vec_pretty(&run.result)?)?;
            artifacts.push(result_key);
        }

        let advisory = advisory(reason, id, is_sample);
        if let Some(ref text) = advisory {
            warn!(backend = id, "{}", text);
        }
        info!(
            backend = id,
            kind = %kind,
            peaks = run.result.peak_count(),
            degraded,
            "backend result accepted"
        );

        Ok(BackendOutcome {
            result: run.result,
            backend_id: id.to_string(),
            backend_kind: kind,
            degraded,
            reason,
            advisory,
            is_sample,
            sample_frame: if is_sample { run.analysed_frame } else { None },
            attempts,
            request_key: key.to_string(),
            artifacts,
        })
    }
}

/// Checks a backend's output in full before it can become the outcome.
fn accept(mut run: BackendRun, frame: &ScanFrame) -> Result<BackendRun, BackendFailure> {
    run.result.fill_missing_mask();
    let analysed = run.analysed_frame.as_ref().unwrap_or(frame);
    validate_result(&run.result, analysed.rows(), analysed.cols())
        .map_err(|errors| BackendFailure::output_invalid(describe_errors(&errors)))?;
    Ok(run)
}

fn record_failure(
    attempts: &mut Vec<AttemptRecord>,
    reason: &mut Option<DegradationReason>,
    id: &str,
    kind: BackendKind,
    failure: &BackendFailure,
) {
    attempts.push(AttemptRecord::from_failure(id, kind, failure));
    if reason.is_none() {
        *reason = DegradationReason::from_failure(failure);
    }
}

/// Human-readable note attached to degraded or sample outcomes.
fn advisory(reason: Option<DegradationReason>, id: &str, is_sample: bool) -> Option<String> {
    match (reason, is_sample) {
        (None, false) => None,
        (None, true) => Some("Results were computed on synthetic sample data".to_string()),
        (Some(reason), false) => Some(format!("{}; results produced by the {} backend", reason, id)),
        (Some(reason), true) => Some(format!(
            "{}; results were computed on synthetic sample data",
            reason
        )),
    }
}
