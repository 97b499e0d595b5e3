//! Triangle Filter

use texcore::filter::*;
use texcore::math::Float;

/// Implements the triangle filter in which the weight falls off linearly from
/// the filter center over the square extent of the filter.
pub struct TriangleFilter;

impl Filter for TriangleFilter {
    /// Returns value of the filter at a given point.
    ///
    /// * `x`       - Offset in x.
    /// * `y`       - Offset in y.
    /// * `x_width` - Filter width in x.
    /// * `y_width` - Filter width in y.
    fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float {
        let hx = 0.5 * x_width;
        let hy = 0.5 * y_width;
        (1.0 - x.abs() / hx).max(0.0) * (1.0 - y.abs() / hy).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn falls_off_linearly() {
        assert_eq!(TriangleFilter.evaluate(0.0, 0.0, 2.0, 2.0), 1.0);
        assert!(approx_eq!(Float, TriangleFilter.evaluate(0.5, 0.0, 2.0, 2.0), 0.5, epsilon = 1e-6));
        assert!(approx_eq!(Float, TriangleFilter.evaluate(0.5, 0.5, 2.0, 2.0), 0.25, epsilon = 1e-6));
        assert_eq!(TriangleFilter.evaluate(1.0, 0.0, 2.0, 2.0), 0.0);
    }
}
