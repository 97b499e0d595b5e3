//! Common numeric helpers

use num_traits::{Num, Zero};

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// PI (π)
pub const PI: Float = std::f32::consts::PI;

/// 2*PI (2π)
pub const TWO_PI: Float = PI * 2.0;

/// 1/2*PI (1/2π)
pub const INV_TWO_PI: Float = 1.0 / TWO_PI;

/// 1/PI (1/π)
pub const INV_PI: Float = 1.0 / PI;

/// Clamps a value to the range `[low, high]`.
///
/// * `val`  - The value.
/// * `low`  - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Computes a mod b (the remainder of a divided by b). This version
/// ensures that modulus of a negative number is zero or positive.
///
/// * `a` - Dividend.
/// * `b` - Divisor.
#[inline(always)]
pub fn rem<T>(a: T, b: T) -> T
where
    T: Num + Zero + PartialOrd + Copy,
{
    let result = a % b;
    if result < T::zero() {
        result + b
    } else {
        result
    }
}

/// Returns the floor of log base 2 of a positive value, or 0 for values
/// less than or equal to 1.
///
/// * `v` - The value.
#[inline]
pub fn log2_floor(v: Float) -> usize {
    if v <= 1.0 {
        0
    } else {
        v.log2().floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rem_negative_is_positive() {
        assert_eq!(rem(-1, 4), 3);
        assert_eq!(rem(-4, 4), 0);
        assert_eq!(rem(5, 4), 1);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5, 0, 3), 3);
        assert_eq!(clamp(-5, 0, 3), 0);
        assert_eq!(clamp(2.5, 0.0, 3.0), 2.5);
    }

    #[test]
    fn log2_helpers() {
        assert_eq!(log2_floor(0.5), 0);
        assert_eq!(log2_floor(7.9), 2);
    }
}
