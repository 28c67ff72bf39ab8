//! Error types for scan input, detection and backend execution.

use std::fmt;

use thiserror::Error;

/// Common interface for errors that carry a stable code.
///
/// Codes are stable strings like "ENGINE_001" or "PROCESS_004" and can be
/// used for programmatic error handling and reporting.
pub trait CodedError: std::error::Error {
    /// Get the error code for reporting.
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the error category for grouping related errors.
    ///
    /// Returns a category like "input", "engine", "backend", "process".
    fn category(&self) -> &'static str;
}

/// Which axis an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisName {
    /// Column-to-position axis (`xSteps`).
    X,
    /// Row-to-position axis (`ySteps`).
    Y,
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisName::X => write!(f, "x"),
            AxisName::Y => write!(f, "y"),
        }
    }
}

/// Errors raised by the Detection Engine on malformed input.
///
/// These are fatal for the call and are never retried: no backend can fix
/// bad input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Grid rows have unequal length.
    #[error("ShapeError: row {row} has {actual} columns, expected {expected}")]
    Shape {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Grid is smaller than 3x3.
    #[error("InsufficientSizeError: grid is {rows}x{cols}, need at least 3x3")]
    InsufficientSize { rows: usize, cols: usize },

    /// Grid contains a non-finite or negative value.
    #[error("DataQualityError: cell ({row}, {col}) has invalid value {value}")]
    DataQuality { row: usize, col: usize, value: f64 },

    /// Position axis is empty or not strictly monotonic.
    #[error("Invalid {axis} axis: {reason}")]
    InvalidAxis { axis: AxisName, reason: String },

    /// Detection parameters are out of range.
    #[error("Invalid detection parameters: {message}")]
    InvalidParameters { message: String },
}

impl EngineError {
    /// Creates a new invalid axis error.
    pub fn invalid_axis(axis: AxisName, reason: impl Into<String>) -> Self {
        Self::InvalidAxis {
            axis,
            reason: reason.into(),
        }
    }

    /// Creates a new invalid parameters error.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }
}

impl CodedError for EngineError {
    fn code(&self) -> &'static str {
        match self {
            EngineError::Shape { .. } => "ENGINE_001",
            EngineError::InsufficientSize { .. } => "ENGINE_002",
            EngineError::DataQuality { .. } => "ENGINE_003",
            EngineError::InvalidAxis { .. } => "ENGINE_004",
            EngineError::InvalidParameters { .. } => "ENGINE_005",
        }
    }

    fn category(&self) -> &'static str {
        "engine"
    }
}

/// Errors converting an untyped upload document into a [`crate::ScanFrame`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The document has no `datasets.ScanCounts` field.
    #[error("Invalid JSON structure: missing 'datasets.ScanCounts'")]
    MissingScanCounts,

    /// `ScanCounts` is not an array of arrays.
    #[error("Invalid JSON structure: 'datasets.ScanCounts' must be a 2D array")]
    NotTwoDimensional,

    /// A `ScanCounts` cell is not a number.
    #[error("Invalid JSON structure: ScanCounts[{row}][{col}] is not a number")]
    NonNumericCell { row: usize, col: usize },

    /// `xSteps` or `ySteps` is present but not an array of numbers.
    #[error("Invalid JSON structure: '{field}' must be an array of numbers")]
    InvalidSteps { field: &'static str },

    /// The `params` block does not match the scan metadata layout.
    #[error("Invalid scan params: {0}")]
    InvalidMetadata(String),

    /// The document is not valid JSON.
    #[error("Invalid JSON file: {0}")]
    Parse(String),
}

impl CodedError for InputError {
    fn code(&self) -> &'static str {
        match self {
            InputError::MissingScanCounts => "INPUT_001",
            InputError::NotTwoDimensional => "INPUT_002",
            InputError::NonNumericCell { .. } => "INPUT_003",
            InputError::InvalidSteps { .. } => "INPUT_004",
            InputError::InvalidMetadata(_) => "INPUT_005",
            InputError::Parse(_) => "INPUT_006",
        }
    }

    fn category(&self) -> &'static str {
        "input"
    }
}

/// Why a backend reported itself unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableKind {
    /// The backend program or runtime is not installed.
    NotInstalled,
    /// The backend is installed but a required dependency is missing.
    MissingDependency,
}

impl fmt::Display for UnavailableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableKind::NotInstalled => write!(f, "not installed"),
            UnavailableKind::MissingDependency => write!(f, "missing dependency"),
        }
    }
}

/// Failure of a single backend candidate.
///
/// The orchestrator absorbs every variant except `Cancelled` by advancing to
/// the next candidate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendFailure {
    /// Availability probe failed.
    #[error("Backend unavailable ({kind}): {message}")]
    Unavailable {
        kind: UnavailableKind,
        message: String,
    },

    /// Backend threw, timed out, or exited with an error.
    #[error("Backend execution failed: {message}")]
    Execution { message: String },

    /// Backend output failed schema validation.
    #[error("Backend output invalid: {message}")]
    OutputInvalid { message: String },

    /// Caller abandoned the request.
    #[error("Backend run cancelled")]
    Cancelled,
}

impl BackendFailure {
    /// Creates a new unavailable failure.
    pub fn unavailable(kind: UnavailableKind, message: impl Into<String>) -> Self {
        Self::Unavailable {
            kind,
            message: message.into(),
        }
    }

    /// Creates a new execution failure.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Creates a new output invalid failure.
    pub fn output_invalid(message: impl Into<String>) -> Self {
        Self::OutputInvalid {
            message: message.into(),
        }
    }
}

impl CodedError for BackendFailure {
    fn code(&self) -> &'static str {
        match self {
            BackendFailure::Unavailable { .. } => "BACKEND_001",
            BackendFailure::Execution { .. } => "BACKEND_002",
            BackendFailure::OutputInvalid { .. } => "BACKEND_003",
            BackendFailure::Cancelled => "BACKEND_004",
        }
    }

    fn category(&self) -> &'static str {
        "backend"
    }
}
