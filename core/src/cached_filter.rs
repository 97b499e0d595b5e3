//! Cached Filter
//!
//! A discrete, normalized grid of filter weights built once from a continuous
//! filter function and reused for many lookups with the same parameters.

use crate::filter::*;
use crate::filter_support::*;
use crate::math::Float;
use itertools::iproduct;

/// Weights smaller than this fraction of the peak weight are set to zero so
/// the filtering loops can skip them.
const ZERO_WEIGHT_THRESHOLD: Float = 1e-5;

/// Largest number of kernel samples along one axis.
pub const MAX_KERNEL_SIZE: usize = 1025;

/// Precomputed normalized filter kernel.
#[derive(Clone, Debug)]
pub struct CachedFilter {
    /// Kernel width in raster samples.
    width: usize,

    /// Kernel height in raster samples.
    height: usize,

    /// Whether the kernel straddles a centre sample in x (odd width).
    include_zero_x: bool,

    /// Whether the kernel straddles a centre sample in y (odd height).
    include_zero_y: bool,

    /// Row-major weights.
    weights: Vec<Float>,
}

impl CachedFilter {
    /// Builds a kernel from a filter function.
    ///
    /// * `filter`         - The continuous filter function.
    /// * `width`          - Filter width in raster samples.
    /// * `height`         - Filter height in raster samples.
    /// * `include_zero_x` - Use an odd number of samples in x, centred on a
    ///                      sample; otherwise an even number centred between
    ///                      samples.
    /// * `include_zero_y` - As `include_zero_x` for y.
    /// * `scale`          - Size of one raster step in filter units.
    pub fn new(
        filter: &dyn Filter,
        width: Float,
        height: Float,
        include_zero_x: bool,
        include_zero_y: bool,
        scale: Float,
    ) -> Self {
        debug_assert!(width > 0.0 && height > 0.0, "filter width must be positive");

        let w = Self::kernel_size(include_zero_x, width);
        let h = Self::kernel_size(include_zero_y, height);
        let x_offset = 0.5 * (w as Float - 1.0);
        let y_offset = 0.5 * (h as Float - 1.0);
        let filter_width = width * scale;
        let filter_height = height * scale;

        let mut weights = vec![0.0; w * h];
        let mut total = 0.0;
        for (j, i) in iproduct!(0..h, 0..w) {
            let x = (i as Float - x_offset) * scale;
            let y = (j as Float - y_offset) * scale;
            let weight = filter.evaluate(x, y, filter_width, filter_height);
            weights[j * w + i] = weight;
            total += weight;
        }

        if total != 0.0 {
            weights.iter_mut().for_each(|w| *w /= total);
            let peak = weights.iter().fold(0.0 as Float, |m, w| m.max(w.abs()));
            let threshold = ZERO_WEIGHT_THRESHOLD * peak;
            for weight in weights.iter_mut() {
                if weight.abs() < threshold {
                    *weight = 0.0;
                }
            }

            // Pruning removes a little mass; put it back.
            let pruned_total: Float = weights.iter().sum();
            if pruned_total != 0.0 && pruned_total != 1.0 {
                weights.iter_mut().for_each(|w| *w /= pruned_total);
            }
        } else {
            weights.iter_mut().for_each(|w| *w = 0.0);
        }

        Self {
            width: w,
            height: h,
            include_zero_x,
            include_zero_y,
            weights,
        }
    }

    /// Returns the number of kernel samples needed along one axis, at most
    /// `MAX_KERNEL_SIZE`.
    ///
    /// * `include_zero` - Whether the kernel is centred on a sample.
    /// * `width`        - Filter width in raster samples.
    pub fn kernel_size(include_zero: bool, width: Float) -> usize {
        let half_max = (MAX_KERNEL_SIZE / 2) as Float;
        if include_zero {
            let half = (0.5 * width).floor().clamp(0.0, half_max) as usize;
            std::cmp::max(2 * half + 1, 3)
        } else {
            let half = (0.5 * (width + 1.0)).floor().clamp(0.0, half_max) as usize;
            std::cmp::max(2 * half, 2)
        }
    }

    /// Returns the kernel width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the kernel height in samples.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the weight at kernel position `(x, y)`.
    ///
    /// * `x` - Column in `[0, width)`.
    /// * `y` - Row in `[0, height)`.
    #[inline(always)]
    pub fn weight(&self, x: usize, y: usize) -> Float {
        self.weights[y * self.width + x]
    }

    /// Returns all weights in row-major order.
    pub fn weights(&self) -> &[Float] {
        &self.weights
    }

    /// Returns true if every weight is zero, i.e. the filter produced no
    /// useful signal.
    pub fn is_degenerate(&self) -> bool {
        self.weights.iter().all(|w| *w == 0.0)
    }

    /// Returns the raster support of the kernel when placed at a continuous
    /// raster position, where sample `i` has its centre at `i + 0.5`. Odd
    /// kernels centre on the sample containing the position; even kernels
    /// centre on the sample boundary nearest to it.
    ///
    /// * `x` - Continuous raster x.
    /// * `y` - Continuous raster y.
    pub fn support_at(&self, x: Float, y: Float) -> FilterSupport {
        let sx = place(self.include_zero_x, self.width, x);
        let sy = place(self.include_zero_y, self.height, y);
        FilterSupport::new(sx, sy)
    }
}

/// Places a kernel of `n` samples along one axis.
///
/// * `include_zero` - Whether the kernel is centred on a sample.
/// * `n`            - Kernel size.
/// * `c`            - Continuous raster position.
fn place(include_zero: bool, n: usize, c: Float) -> FilterSupport1D {
    let n = n as i64;
    let start = if include_zero {
        (c.floor() as i64).saturating_sub((n - 1) / 2)
    } else {
        (c.round() as i64).saturating_sub(n / 2)
    };
    FilterSupport1D::new(start, start.saturating_add(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    struct TestBox;

    impl Filter for TestBox {
        fn evaluate(&self, x: Float, y: Float, xw: Float, yw: Float) -> Float {
            if x.abs() <= 0.5 * xw && y.abs() <= 0.5 * yw {
                1.0
            } else {
                0.0
            }
        }
    }

    struct TestTent;

    impl Filter for TestTent {
        fn evaluate(&self, x: Float, y: Float, xw: Float, yw: Float) -> Float {
            (0.5 * xw - x.abs()).max(0.0) * (0.5 * yw - y.abs()).max(0.0)
        }
    }

    struct Zero;

    impl Filter for Zero {
        fn evaluate(&self, _x: Float, _y: Float, _xw: Float, _yw: Float) -> Float {
            0.0
        }
    }

    #[test]
    fn kernel_sizes() {
        assert_eq!(CachedFilter::kernel_size(true, 5.0), 5);
        assert_eq!(CachedFilter::kernel_size(false, 4.0), 4);
        assert_eq!(CachedFilter::kernel_size(true, 1.0), 3);
        assert_eq!(CachedFilter::kernel_size(true, 4.0), 5);
        assert_eq!(CachedFilter::kernel_size(false, 0.5), 2);
        assert_eq!(CachedFilter::kernel_size(false, 5.0), 6);
    }

    #[test]
    fn kernel_sizes_are_capped() {
        assert_eq!(CachedFilter::kernel_size(true, 1e30), MAX_KERNEL_SIZE);
        assert_eq!(CachedFilter::kernel_size(false, Float::INFINITY), MAX_KERNEL_SIZE - 1);
        assert_eq!(CachedFilter::kernel_size(true, Float::NAN), 3);

        let k = CachedFilter::new(&TestBox, 1.0, 1.0, true, false, 1.0);
        let s = k.support_at(1e30, -1e30);
        assert!(s.sx.range() <= 3);
        assert!(s.sy.range() <= 2);
    }

    #[test]
    fn wide_kernels_keep_their_weights() {
        // Every normalized weight of a 601 x 601 tent is far below 1e-5.
        let k = CachedFilter::new(&TestTent, 600.0, 600.0, true, true, 1.0);
        assert_eq!(k.width(), 601);
        assert!(!k.is_degenerate());
        let sum: Float = k.weights().iter().sum();
        assert!(approx_eq!(Float, sum, 1.0, epsilon = 1e-3));
        assert!(k.weight(300, 300) > 0.0);
        assert!(k.weight(10, 300) > 0.0);
    }

    #[test]
    fn unit_box_picks_centre_sample() {
        let k = CachedFilter::new(&TestBox, 1.0, 1.0, true, true, 1.0);
        assert_eq!(k.width(), 3);
        assert_eq!(k.height(), 3);
        assert_eq!(k.weight(1, 1), 1.0);
        assert_eq!(k.weights().iter().sum::<Float>(), 1.0);
    }

    #[test]
    fn even_box_splits_between_samples() {
        let k = CachedFilter::new(&TestBox, 1.0, 1.0, false, false, 1.0);
        assert_eq!(k.width(), 2);
        assert!(k.weights().iter().all(|w| *w == 0.25));
    }

    #[test]
    fn zero_total_gives_degenerate_kernel() {
        let k = CachedFilter::new(&Zero, 3.0, 3.0, true, true, 1.0);
        assert!(k.is_degenerate());
        assert!(k.weights().iter().all(|w| !w.is_nan()));
    }

    #[test]
    fn tiny_weights_are_pruned() {
        // Tent of width 6 sampled on a 7 wide grid; the outermost samples
        // land exactly on the zero crossing.
        let k = CachedFilter::new(&TestTent, 6.0, 6.0, true, true, 1.0);
        assert_eq!(k.width(), 7);
        assert_eq!(k.weight(0, 3), 0.0);
        assert!(k.weight(3, 3) > 0.0);
    }

    #[test]
    fn support_placement() {
        let k = CachedFilter::new(&TestBox, 1.0, 1.0, true, false, 1.0);
        let s = k.support_at(0.5, 1.0);
        assert_eq!(s.sx, FilterSupport1D::new(-1, 2));
        assert_eq!(s.sy, FilterSupport1D::new(0, 2));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]
        #[test]
        fn large_kernels_sum_to_one(
            w in 50.0..400.0f32, h in 50.0..400.0f32,
            zx in any::<bool>(), zy in any::<bool>(),
        ) {
            let k = CachedFilter::new(&TestTent, w, h, zx, zy, 1.0);
            prop_assert!(!k.is_degenerate());
            let sum: Float = k.weights().iter().sum();
            prop_assert!(approx_eq!(Float, sum, 1.0, epsilon = 1e-3));
        }
    }

    proptest! {
        #[test]
        fn weights_sum_to_one(
            w in 0.5..12.0f32, h in 0.5..12.0f32,
            zx in any::<bool>(), zy in any::<bool>(),
            scale in 0.25..2.0f32,
        ) {
            let k = CachedFilter::new(&TestTent, w, h, zx, zy, scale);
            if !k.is_degenerate() {
                let sum: Float = k.weights().iter().sum();
                prop_assert!(approx_eq!(Float, sum, 1.0, epsilon = 1e-4));
            }
            prop_assert_eq!(k.width() % 2 == 1, zx);
            prop_assert_eq!(k.height() % 2 == 1, zy);
        }
    }
}
