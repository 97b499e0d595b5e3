//! Windowed Sinc Filter

use texcore::filter::*;
use texcore::math::{Float, PI};

/// Separable sinc filter windowed by a Lanczos lobe that reaches zero at the
/// edge of the filter extent.
pub struct SincFilter;

/// Returns `sin(πx) / πx`.
///
/// * `x` - The argument.
#[inline]
fn sinc(x: Float) -> Float {
    let x = x.abs();
    if x < 1e-5 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Returns the windowed sinc for one axis.
///
/// * `x`   - Offset.
/// * `tau` - Half width of the window.
#[inline]
fn windowed_sinc(x: Float, tau: Float) -> Float {
    let x = x.abs();
    if x > tau {
        0.0
    } else {
        sinc(x) * sinc(x / tau)
    }
}

impl Filter for SincFilter {
    fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float {
        windowed_sinc(x, 0.5 * x_width) * windowed_sinc(y, 0.5 * y_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn zero_crossings() {
        assert_eq!(SincFilter.evaluate(0.0, 0.0, 6.0, 6.0), 1.0);
        assert!(approx_eq!(Float, SincFilter.evaluate(1.0, 0.0, 6.0, 6.0), 0.0, epsilon = 1e-6));
        assert!(SincFilter.evaluate(1.5, 0.0, 6.0, 6.0) < 0.0);
    }
}
