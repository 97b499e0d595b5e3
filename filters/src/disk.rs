//! Disk Filter

use texcore::filter::*;
use texcore::math::Float;

/// Radially symmetric box: one inside the ellipse inscribed in the filter
/// extent, zero outside.
pub struct DiskFilter;

impl Filter for DiskFilter {
    fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float {
        let x = 2.0 * x / x_width;
        let y = 2.0 * y / y_width;
        if x * x + y * y <= 1.0 {
            1.0
        } else {
            0.0
        }
    }
}
