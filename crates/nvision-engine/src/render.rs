//! PNG rendering of a detection result.
//!
//! The image holds three panels side by side: raw counts, the smoothed grid
//! and the threshold mask. Accepted peaks are ringed on the first two.
//! Row 0 is drawn at the bottom so the picture matches the scan's physical
//! orientation. Fixed encoder settings keep the output byte-identical for
//! identical input.

use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use thiserror::Error;

use nvision_spec::DetectionResult;

/// Target edge length of one panel in pixels.
const PANEL_TARGET: usize = 300;

/// Blank columns between panels.
const GAP: usize = 6;

const GAP_COLOR: [u8; 3] = [255, 255, 255];
const RING_COLOR: [u8; 3] = [0, 200, 255];
const MASK_ON: [u8; 3] = [255, 255, 255];
const MASK_OFF: [u8; 3] = [0, 0, 0];

/// Errors from rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encoding error: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Maps `t` in `[0, 1]` onto the black-red-yellow-white "hot" ramp.
pub fn hot_colormap(t: f64) -> [u8; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        channel(3.0 * t),
        channel(3.0 * t - 1.0),
        channel(3.0 * t - 2.0),
    ]
}

struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: usize, height: usize, fill: [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            pixels.extend_from_slice(&fill);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let offset = (y as usize * self.width + x as usize) * 3;
        self.pixels[offset..offset + 3].copy_from_slice(&color);
    }
}

/// Geometry shared by all three panels.
struct Layout {
    rows: usize,
    cols: usize,
    scale: usize,
}

impl Layout {
    fn panel_width(&self) -> usize {
        self.cols * self.scale
    }

    fn panel_height(&self) -> usize {
        self.rows * self.scale
    }

    fn panel_origin(&self, panel: usize) -> usize {
        panel * (self.panel_width() + GAP)
    }

    /// Fills the block for grid cell `(row, col)` in `panel`.
    fn fill_cell(
        &self,
        canvas: &mut Canvas,
        panel: usize,
        row: usize,
        col: usize,
        color: [u8; 3],
    ) {
        let x0 = self.panel_origin(panel) + col * self.scale;
        let y0 = (self.rows - 1 - row) * self.scale;
        for dy in 0..self.scale {
            for dx in 0..self.scale {
                canvas.put((x0 + dx) as i64, (y0 + dy) as i64, color);
            }
        }
    }

    /// Draws a ring around the center of cell `(row, col)` in `panel`.
    fn ring(&self, canvas: &mut Canvas, panel: usize, row: usize, col: usize) {
        let half = self.scale as f64 / 2.0;
        let cx = (self.panel_origin(panel) + col * self.scale) as f64 + half;
        let cy = ((self.rows - 1 - row) * self.scale) as f64 + half;
        let radius = (self.scale as f64 * 2.5).max(4.0);
        let left = self.panel_origin(panel) as i64;
        let right = left + self.panel_width() as i64;

        let steps = (radius * 8.0).ceil() as usize;
        for i in 0..steps {
            let angle = i as f64 / steps as f64 * std::f64::consts::TAU;
            let x = (cx + radius * angle.cos()).floor() as i64;
            let y = (cy + radius * angle.sin()).floor() as i64;
            if x >= left && x < right {
                canvas.put(x, y, RING_COLOR);
            }
        }
    }
}

fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        0.0
    }
}

fn value_range(grid: &[Vec<f64>]) -> (f64, f64) {
    grid.iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn check_shape(name: &str, grid: &[Vec<f64>], rows: usize, cols: usize) -> Result<(), RenderError> {
    if grid.len() != rows || grid.iter().any(|r| r.len() != cols) {
        return Err(RenderError::InvalidDimensions(format!(
            "{} does not match the {}x{} scan grid",
            name, rows, cols
        )));
    }
    Ok(())
}

/// Renders `counts` and `result` into PNG bytes.
pub fn render_png(counts: &[Vec<f64>], result: &DetectionResult) -> Result<Vec<u8>, RenderError> {
    let rows = counts.len();
    let cols = counts.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(RenderError::InvalidDimensions("scan grid is empty".to_string()));
    }
    check_shape("counts", counts, rows, cols)?;
    check_shape("processed_image", &result.smoothed, rows, cols)?;
    if result.mask.len() != rows || result.mask.iter().any(|r| r.len() != cols) {
        return Err(RenderError::InvalidDimensions(format!(
            "mask does not match the {}x{} scan grid",
            rows, cols
        )));
    }

    let layout = Layout {
        rows,
        cols,
        scale: (PANEL_TARGET / rows.max(cols)).max(1),
    };
    let width = layout.panel_width() * 3 + GAP * 2;
    let height = layout.panel_height();
    let mut canvas = Canvas::new(width, height, GAP_COLOR);

    let (raw_lo, raw_hi) = value_range(counts);
    let (smooth_lo, smooth_hi) = value_range(&result.smoothed);
    for row in 0..rows {
        for col in 0..cols {
            let raw = hot_colormap(normalize(counts[row][col], raw_lo, raw_hi));
            layout.fill_cell(&mut canvas, 0, row, col, raw);

            let smooth = hot_colormap(normalize(result.smoothed[row][col], smooth_lo, smooth_hi));
            layout.fill_cell(&mut canvas, 1, row, col, smooth);

            let mask = if result.mask[row][col] { MASK_ON } else { MASK_OFF };
            layout.fill_cell(&mut canvas, 2, row, col, mask);
        }
    }

    for peak in &result.peaks {
        if peak.row < rows && peak.col < cols {
            layout.ring(&mut canvas, 0, peak.row, peak.col);
            layout.ring(&mut canvas, 1, peak.row, peak.col);
        }
    }

    encode_rgb(&canvas)
}

fn encode_rgb(canvas: &Canvas) -> Result<Vec<u8>, RenderError> {
    let width = u32::try_from(canvas.width)
        .map_err(|_| RenderError::InvalidDimensions(format!("width {} too large", canvas.width)))?;
    let height = u32::try_from(canvas.height)
        .map_err(|_| RenderError::InvalidDimensions(format!("height {} too large", canvas.height)))?;

    let mut bytes = Vec::new();
    {
        let mut encoder = Encoder::new(&mut bytes, width, height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_compression(Compression::Default);
        encoder.set_filter(FilterType::NoFilter);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&canvas.pixels)?;
        writer.finish()?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect;
    use nvision_spec::{DetectionParameters, ScanFrame};

    fn spike_counts() -> Vec<Vec<f64>> {
        let mut counts = vec![vec![10.0; 5]; 5];
        counts[2][2] = 100.0;
        counts
    }

    #[test]
    fn test_hot_colormap_endpoints() {
        assert_eq!(hot_colormap(0.0), [0, 0, 0]);
        assert_eq!(hot_colormap(1.0), [255, 255, 255]);
        assert_eq!(hot_colormap(1.0 / 3.0), [255, 0, 0]);
        assert_eq!(hot_colormap(f64::NAN), [0, 0, 0]);
    }

    #[test]
    fn test_render_is_deterministic_png() {
        let counts = spike_counts();
        let result = detect(&ScanFrame::new(counts.clone()), &DetectionParameters::new(1.0, 1)).unwrap();

        let a = render_png(&counts, &result).unwrap();
        let b = render_png(&counts, &result).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");

        let decoder = png::Decoder::new(a.as_slice());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!(info.height, 300);
        assert_eq!(info.width, 300 * 3 + GAP as u32 * 2);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let counts = spike_counts();
        let mut result = detect(&ScanFrame::new(counts.clone()), &DetectionParameters::new(1.0, 1)).unwrap();
        result.mask.pop();
        assert!(matches!(
            render_png(&counts, &result),
            Err(RenderError::InvalidDimensions(_))
        ));
        assert!(render_png(&[], &result).is_err());
    }
}
