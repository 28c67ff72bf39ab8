//! Backends that run the engine inside the current process.

use nvision_spec::{
    BackendFailure, BackendKind, BackendRequest, BackendRun, DetectionBackend, DetectionResult,
    ProbeStatus, ScanFrame,
};
use tracing::debug;

use crate::detect::detect;
use crate::render::render_png;
use crate::sample::{generate_sample, SampleProfile};

/// Default identifier of [`InProcessBackend`].
pub const IN_PROCESS_ID: &str = "in_process";

/// Default identifier of [`SyntheticBackend`].
pub const SYNTHETIC_ID: &str = "synthetic";

/// Default seed for the synthetic fallback scan.
pub const DEFAULT_SAMPLE_SEED: u32 = 42;

/// Runs [`detect`] on the request frame.
///
/// Always available. The engine has no cancellation point, so a request
/// cancelled mid-run is finished and its result discarded.
#[derive(Debug, Clone)]
pub struct InProcessBackend {
    id: String,
}

impl InProcessBackend {
    /// Creates a backend with the default id.
    pub fn new() -> Self {
        Self::with_id(IN_PROCESS_ID)
    }

    /// Creates a backend with a custom id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for InProcessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionBackend for InProcessBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::InProcess
    }

    fn probe(&self) -> ProbeStatus {
        ProbeStatus::Available
    }

    fn run(&self, request: &BackendRequest<'_>) -> Result<BackendRun, BackendFailure> {
        let result = run_engine(request.frame, request)?;
        let image = render_image(request, request.frame, &result)?;

        let mut run = BackendRun::new(result);
        if let Some(png) = image {
            run = run.with_image(png);
        }
        Ok(run)
    }
}

/// Runs [`detect`] on a generated sample scan instead of the request frame.
///
/// The last resort when every real backend failed: the caller still gets a
/// well-formed result, flagged as sample data.
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    id: String,
    seed: u32,
    profile: SampleProfile,
}

impl SyntheticBackend {
    /// Creates a backend generating `profile` scans from `seed`.
    pub fn new(seed: u32, profile: SampleProfile) -> Self {
        Self {
            id: SYNTHETIC_ID.to_string(),
            seed,
            profile,
        }
    }

    /// Sets a custom id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns the seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Returns the sample profile.
    pub fn profile(&self) -> SampleProfile {
        self.profile
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SEED, SampleProfile::Fallback)
    }
}

impl DetectionBackend for SyntheticBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Synthetic
    }

    fn probe(&self) -> ProbeStatus {
        ProbeStatus::Available
    }

    fn run(&self, request: &BackendRequest<'_>) -> Result<BackendRun, BackendFailure> {
        let frame = generate_sample(self.profile, self.seed);
        debug!(
            profile = %self.profile,
            seed = self.seed,
            "generated synthetic scan"
        );
        let result = run_engine(&frame, request)?;
        let image = render_image(request, &frame, &result)?;

        let mut run = BackendRun::new(result);
        if let Some(png) = image {
            run = run.with_image(png);
        }
        Ok(run.with_analysed_frame(frame))
    }
}

fn run_engine(
    frame: &ScanFrame,
    request: &BackendRequest<'_>,
) -> Result<DetectionResult, BackendFailure> {
    if request.cancel.is_cancelled() {
        return Err(BackendFailure::Cancelled);
    }
    let result = detect(frame, request.params)
        .map_err(|e| BackendFailure::execution(e.to_string()))?;
    if request.cancel.is_cancelled() {
        return Err(BackendFailure::Cancelled);
    }
    Ok(result)
}

/// Renders the result image when the request asks for one.
fn render_image(
    request: &BackendRequest<'_>,
    frame: &ScanFrame,
    result: &DetectionResult,
) -> Result<Option<Vec<u8>>, BackendFailure> {
    if !request.render_image {
        return Ok(None);
    }
    render_png(&frame.counts, result)
        .map(Some)
        .map_err(|e| BackendFailure::execution(format!("rendering failed: {}", e)))
}
