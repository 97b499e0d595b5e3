//! Catmull-Rom Filter

use texcore::filter::*;
use texcore::math::Float;

/// Separable Catmull-Rom cubic spanning two lobes on each side of the centre.
pub struct CatmullRomFilter;

/// Evaluates the 1D cubic at `t` in `[0, 2]`.
///
/// * `t` - Absolute distance from the centre in lobes.
#[inline]
fn catmull_rom_1d(t: Float) -> Float {
    if t < 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

impl Filter for CatmullRomFilter {
    fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float {
        if x.abs() > 0.5 * x_width || y.abs() > 0.5 * y_width {
            return 0.0;
        }
        catmull_rom_1d(4.0 * x.abs() / x_width) * catmull_rom_1d(4.0 * y.abs() / y_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn interpolating_at_integers() {
        assert_eq!(catmull_rom_1d(0.0), 1.0);
        assert!(approx_eq!(Float, catmull_rom_1d(1.0), 0.0, epsilon = 1e-6));
        assert_eq!(catmull_rom_1d(2.0), 0.0);
        // Negative lobe.
        assert!(catmull_rom_1d(1.5) < 0.0);
        assert!(CatmullRomFilter.evaluate(1.5, 0.0, 4.0, 4.0) < 0.0);
    }
}
