//! Gaussian Filter

use texcore::filter::*;
use texcore::math::Float;

/// Gaussian with the offsets rescaled so the filter extent maps to
/// `[-1, 1]`, cut off to zero outside the extent.
pub struct GaussianFilter;

impl Filter for GaussianFilter {
    /// Returns value of the filter at a given point.
    ///
    /// * `x`       - Offset in x.
    /// * `y`       - Offset in y.
    /// * `x_width` - Filter width in x.
    /// * `y_width` - Filter width in y.
    fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float {
        let x = 2.0 * x / x_width;
        let y = 2.0 * y / y_width;
        if x.abs() > 1.0 || y.abs() > 1.0 {
            0.0
        } else {
            (-2.0 * (x * x + y * y)).exp()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn values() {
        assert_eq!(GaussianFilter.evaluate(0.0, 0.0, 2.0, 2.0), 1.0);
        let edge = GaussianFilter.evaluate(1.0, 0.0, 2.0, 2.0);
        assert!(approx_eq!(Float, edge, (-2.0 as Float).exp(), epsilon = 1e-6));
        // Width scales the offsets.
        assert_eq!(
            GaussianFilter.evaluate(1.0, 0.5, 4.0, 2.0),
            GaussianFilter.evaluate(0.5, 0.5, 2.0, 2.0)
        );
    }
}
