//! nvision canonical types
//!
//! This crate defines the data model shared by every part of the nvision
//! peak-detection pipeline: the scan input, detection parameters, the
//! detection result, the orchestrator outcome, and the contracts that
//! backends and artifact stores implement.
//!
//! # Overview
//!
//! - [`ScanFrame`] - 2D intensity grid plus optional position axes
//! - [`DetectionParameters`] - threshold factor, minimum distance, smoothing sigma
//! - [`DetectionResult`] - peaks, positions, smoothed grid, mask, statistics
//! - [`BackendOutcome`] - a result plus provenance and degradation info
//! - [`DetectionBackend`] - the adapter trait every backend implements
//! - [`ArtifactStore`] - key-addressed artifact storage
//!
//! # Example
//!
//! ```
//! use nvision_spec::{ScanFrame, DetectionParameters};
//!
//! let doc = serde_json::json!({
//!     "datasets": { "ScanCounts": [[1, 2, 3], [4, 5, 6], [7, 8, 9]] }
//! });
//! let frame = ScanFrame::from_json_value(&doc).unwrap();
//! assert_eq!(frame.rows(), 3);
//! assert_eq!(frame.x_axis_or_default()[0], -15.0);
//!
//! let params = DetectionParameters::default();
//! assert!(params.validate().is_ok());
//! ```

pub mod backend;
pub mod error;
pub mod frame;
pub mod hash;
pub mod outcome;
pub mod params;
pub mod result;
pub mod storage;
pub mod validation;

pub use backend::{
    BackendRequest, BackendRun, CancellationToken, DetectionBackend, ProbeStatus,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_SECS,
};
pub use error::{AxisName, BackendFailure, CodedError, EngineError, InputError, UnavailableKind};
pub use frame::{default_axis, linspace, ScanFrame, ScanMetadata, DEFAULT_AXIS_HALF_RANGE};
pub use hash::request_key;
pub use outcome::{AttemptRecord, AttemptState, BackendKind, BackendOutcome, DegradationReason};
pub use params::{
    DetectionParameters, DEFAULT_MIN_DISTANCE, DEFAULT_SMOOTHING_SIGMA, DEFAULT_THRESHOLD_FACTOR,
};
pub use result::{threshold_mask, DetectionResult, GridStats, Peak};
pub use storage::{ArtifactStore, DirStore, MemoryStore, StorageError};
pub use validation::{describe_errors, validate_result, ResultValidationError};
