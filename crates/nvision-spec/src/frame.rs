//! Scan frame type and the upload-document adapter.
//!
//! A [`ScanFrame`] is one rectangular intensity measurement from a fast
//! steering mirror scan, plus the optional axes that map grid indices to
//! physical positions.
//!
//! Uploads arrive in the historical document layout:
//!
//! ```text
//! {
//!   "datasets": { "ScanCounts": [[...]], "xSteps": [...], "ySteps": [...] },
//!   "params":   { "CenterOfScan": [0, 0], "sweepRanges": [30, 30], "scanPointsPerAxis": 100 }
//! }
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::InputError;

/// Half-width of the default physical axis, in micrometres.
pub const DEFAULT_AXIS_HALF_RANGE: f64 = 15.0;

/// Scan acquisition metadata carried alongside the counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    /// Center of the scan in physical units.
    #[serde(rename = "CenterOfScan", default, skip_serializing_if = "Option::is_none")]
    pub center_of_scan: Option<[f64; 2]>,
    /// Sweep range per axis in physical units.
    #[serde(rename = "sweepRanges", default, skip_serializing_if = "Option::is_none")]
    pub sweep_ranges: Option<[f64; 2]>,
    /// Number of scan points per axis.
    #[serde(
        rename = "scanPointsPerAxis",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scan_points_per_axis: Option<u32>,
}

/// A 2D intensity measurement.
///
/// `counts` is stored row-major as the caller supplied it. Shape and value
/// checks happen in the engine, not at construction, so a ragged frame can
/// be represented and rejected with a precise error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFrame {
    /// Intensity grid, R rows by C columns.
    pub counts: Vec<Vec<f64>>,
    /// Column index to physical x position (length C).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<Vec<f64>>,
    /// Row index to physical y position (length R).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<Vec<f64>>,
    /// Acquisition metadata, if the upload carried any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ScanMetadata>,
}

impl ScanFrame {
    /// Creates a frame with synthesized default axes.
    pub fn new(counts: Vec<Vec<f64>>) -> Self {
        Self {
            counts,
            x_axis: None,
            y_axis: None,
            metadata: None,
        }
    }

    /// Sets both position axes.
    pub fn with_axes(mut self, x_axis: Vec<f64>, y_axis: Vec<f64>) -> Self {
        self.x_axis = Some(x_axis);
        self.y_axis = Some(y_axis);
        self
    }

    /// Sets the acquisition metadata.
    pub fn with_metadata(mut self, metadata: ScanMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.counts.len()
    }

    /// Number of columns, taken from the first row.
    pub fn cols(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }

    /// Returns the x axis, synthesizing the default one when absent.
    pub fn x_axis_or_default(&self) -> Cow<'_, [f64]> {
        match &self.x_axis {
            Some(axis) => Cow::Borrowed(axis.as_slice()),
            None => Cow::Owned(default_axis(self.cols())),
        }
    }

    /// Returns the y axis, synthesizing the default one when absent.
    pub fn y_axis_or_default(&self) -> Cow<'_, [f64]> {
        match &self.y_axis {
            Some(axis) => Cow::Borrowed(axis.as_slice()),
            None => Cow::Owned(default_axis(self.rows())),
        }
    }

    /// Parses an upload document string.
    pub fn from_json_str(s: &str) -> Result<Self, InputError> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| InputError::Parse(e.to_string()))?;
        Self::from_json_value(&value)
    }

    /// Converts an untyped upload document into a frame.
    ///
    /// `null` cells are read as NaN so that the engine reports them as a
    /// data quality problem with their exact position.
    pub fn from_json_value(value: &Value) -> Result<Self, InputError> {
        let datasets = value.get("datasets").ok_or(InputError::MissingScanCounts)?;
        let raw_counts = datasets
            .get("ScanCounts")
            .filter(|v| !v.is_null())
            .ok_or(InputError::MissingScanCounts)?;

        let rows = raw_counts.as_array().ok_or(InputError::NotTwoDimensional)?;
        if rows.is_empty() {
            return Err(InputError::NotTwoDimensional);
        }

        let mut counts = Vec::with_capacity(rows.len());
        for (r, row) in rows.iter().enumerate() {
            let cells = row.as_array().ok_or(InputError::NotTwoDimensional)?;
            let mut parsed = Vec::with_capacity(cells.len());
            for (c, cell) in cells.iter().enumerate() {
                let v = match cell {
                    Value::Null => f64::NAN,
                    other => other
                        .as_f64()
                        .ok_or(InputError::NonNumericCell { row: r, col: c })?,
                };
                parsed.push(v);
            }
            counts.push(parsed);
        }

        let x_axis = parse_steps(datasets, "xSteps")?;
        let y_axis = parse_steps(datasets, "ySteps")?;

        let metadata = match value.get("params") {
            Some(Value::Null) | None => None,
            Some(params) => Some(
                serde_json::from_value::<ScanMetadata>(params.clone())
                    .map_err(|e| InputError::InvalidMetadata(e.to_string()))?,
            ),
        };

        Ok(Self {
            counts,
            x_axis,
            y_axis,
            metadata,
        })
    }

    /// Writes the frame back out in the upload document layout.
    pub fn to_json_value(&self) -> Value {
        let mut datasets = Map::new();
        datasets.insert("ScanCounts".to_string(), json!(self.counts));
        if let Some(x) = &self.x_axis {
            datasets.insert("xSteps".to_string(), json!(x));
        }
        if let Some(y) = &self.y_axis {
            datasets.insert("ySteps".to_string(), json!(y));
        }

        let mut doc = Map::new();
        doc.insert("datasets".to_string(), Value::Object(datasets));
        if let Some(meta) = &self.metadata {
            doc.insert("params".to_string(), json!(meta));
        }
        Value::Object(doc)
    }
}

fn parse_steps(datasets: &Value, field: &'static str) -> Result<Option<Vec<f64>>, InputError> {
    match datasets.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_f64().ok_or(InputError::InvalidSteps { field }))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(InputError::InvalidSteps { field }),
    }
}

/// Returns `n` evenly spaced samples over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Default physical axis for a dimension of `n` samples.
pub fn default_axis(n: usize) -> Vec<f64> {
    linspace(-DEFAULT_AXIS_HALF_RANGE, DEFAULT_AXIS_HALF_RANGE, n)
}
