//! Position axes: validation and index-to-position mapping.

use nvision_spec::{AxisName, EngineError};

/// Checks that an axis is non-empty, finite and strictly monotonic.
///
/// The axis length is not compared with the grid dimension; mapping
/// interpolates over the axis's own index domain.
pub fn validate_axis(axis: &[f64], name: AxisName) -> Result<(), EngineError> {
    if axis.is_empty() {
        return Err(EngineError::invalid_axis(name, "axis is empty"));
    }
    if let Some(i) = axis.iter().position(|v| !v.is_finite()) {
        return Err(EngineError::invalid_axis(
            name,
            format!("value at index {} is not finite", i),
        ));
    }

    let increasing = axis.windows(2).all(|w| w[1] > w[0]);
    let decreasing = axis.windows(2).all(|w| w[1] < w[0]);
    if !(increasing || decreasing) {
        return Err(EngineError::invalid_axis(
            name,
            "values must be strictly monotonic",
        ));
    }

    Ok(())
}

/// Linearly interpolates `axis` at a (possibly fractional) index.
///
/// Indices outside `0..axis.len()-1` clamp to the end values.
pub fn interp_index(axis: &[f64], index: f64) -> f64 {
    let Some(&last) = axis.last() else {
        return f64::NAN;
    };
    let last_index = (axis.len() - 1) as f64;

    if index <= 0.0 {
        return axis[0];
    }
    if index >= last_index {
        return last;
    }

    let lo = index.floor() as usize;
    let frac = index - lo as f64;
    if frac == 0.0 {
        return axis[lo];
    }
    axis[lo] + frac * (axis[lo + 1] - axis[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_axis() {
        assert!(validate_axis(&[0.0, 0.1, 0.2], AxisName::X).is_ok());
        assert!(validate_axis(&[3.0, 2.0, 1.0], AxisName::Y).is_ok());
        assert!(validate_axis(&[5.0], AxisName::X).is_ok());
        assert!(validate_axis(&[], AxisName::X).is_err());
        assert!(validate_axis(&[0.0, 0.0, 1.0], AxisName::X).is_err());
        assert!(validate_axis(&[0.0, 2.0, 1.0], AxisName::Y).is_err());
        assert!(validate_axis(&[0.0, f64::NAN], AxisName::Y).is_err());
    }

    #[test]
    fn test_interp_integer_index_is_exact() {
        let axis = [-15.0, -5.0, 5.0, 15.0];
        assert_eq!(interp_index(&axis, 2.0), 5.0);
        assert_eq!(interp_index(&axis, 0.0), -15.0);
    }

    #[test]
    fn test_interp_fractional_and_clamped() {
        let axis = [0.0, 10.0, 20.0];
        assert_eq!(interp_index(&axis, 0.5), 5.0);
        assert_eq!(interp_index(&axis, 7.0), 20.0);
        assert_eq!(interp_index(&axis, -1.0), 0.0);
        assert!(interp_index(&[], 1.0).is_nan());
    }
}
