//! Box Filter

use texcore::filter::*;
use texcore::math::Float;

/// Equally weights every sample inside the filter extent, including samples
/// exactly on its boundary.
pub struct BoxFilter;

impl Filter for BoxFilter {
    /// Returns value of the filter at a given point.
    ///
    /// * `x`       - Offset in x.
    /// * `y`       - Offset in y.
    /// * `x_width` - Filter width in x.
    /// * `y_width` - Filter width in y.
    fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float {
        if x.abs() <= 0.5 * x_width && y.abs() <= 0.5 * y_width {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_boundary() {
        assert_eq!(BoxFilter.evaluate(0.5, -0.5, 1.0, 1.0), 1.0);
        assert_eq!(BoxFilter.evaluate(0.51, 0.0, 1.0, 1.0), 0.0);
    }
}
