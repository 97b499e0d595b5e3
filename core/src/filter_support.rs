//! Filter Support
//!
//! Integer raster intervals over which a filter is evaluated.

use std::cmp::{max, min};

/// Half-open 1D raster interval `[start, end)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterSupport1D {
    /// First raster index in the support (inclusive).
    pub start: i64,

    /// One past the last raster index in the support (exclusive).
    pub end: i64,
}

impl FilterSupport1D {
    /// Creates a new support. An `end` before `start` produces an empty support
    /// at `start`.
    ///
    /// * `start` - First index (inclusive).
    /// * `end`   - Last index (exclusive).
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end: max(start, end),
        }
    }

    /// Returns the number of raster positions in the support.
    pub fn range(&self) -> i64 {
        self.end - self.start
    }

    /// Returns true if the support contains no raster positions.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `x` lies in the support.
    ///
    /// * `x` - Raster index.
    pub fn in_range(&self, x: i64) -> bool {
        x >= self.start && x < self.end
    }

    /// Returns true if the support overlaps the interval `[lo, hi)`.
    ///
    /// * `lo` - Start of the interval (inclusive).
    /// * `hi` - End of the interval (exclusive).
    pub fn intersects_range(&self, lo: i64, hi: i64) -> bool {
        !self.is_empty() && self.start < hi && self.end > lo
    }

    /// Returns true if the support lies completely inside `[lo, hi)`.
    ///
    /// * `lo` - Start of the interval (inclusive).
    /// * `hi` - End of the interval (exclusive).
    pub fn within_range(&self, lo: i64, hi: i64) -> bool {
        self.start >= lo && self.end <= hi
    }

    /// Clamps the support into `[lo, hi)`. The support never grows and may
    /// become empty.
    ///
    /// * `lo` - Start of the interval (inclusive).
    /// * `hi` - End of the interval (exclusive).
    pub fn truncate(&mut self, lo: i64, hi: i64) {
        let start = min(max(self.start, lo), hi);
        let end = max(min(self.end, hi), start);
        self.start = start;
        self.end = end;
    }

    /// Returns the intersection of two supports. The result is empty when
    /// they do not overlap.
    ///
    /// * `a` - First support.
    /// * `b` - Second support.
    pub fn intersect(a: &Self, b: &Self) -> Self {
        Self::new(max(a.start, b.start), min(a.end, b.end))
    }
}

/// 2D raster support made of independent x and y intervals.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterSupport {
    /// Support in x.
    pub sx: FilterSupport1D,

    /// Support in y.
    pub sy: FilterSupport1D,
}

impl FilterSupport {
    /// Creates a new 2D support.
    ///
    /// * `sx` - Support in x.
    /// * `sy` - Support in y.
    pub fn new(sx: FilterSupport1D, sy: FilterSupport1D) -> Self {
        Self { sx, sy }
    }

    /// Creates a new 2D support from raw bounds.
    ///
    /// * `start_x` - First x index (inclusive).
    /// * `end_x`   - Last x index (exclusive).
    /// * `start_y` - First y index (inclusive).
    /// * `end_y`   - Last y index (exclusive).
    pub fn from_bounds(start_x: i64, end_x: i64, start_y: i64, end_y: i64) -> Self {
        Self::new(
            FilterSupport1D::new(start_x, end_x),
            FilterSupport1D::new(start_y, end_y),
        )
    }

    /// Returns the number of raster positions covered; 0 if either axis is
    /// empty.
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.sx.range() * self.sy.range()
        }
    }

    /// Returns true if either axis is empty.
    pub fn is_empty(&self) -> bool {
        self.sx.is_empty() || self.sy.is_empty()
    }

    /// Returns true if `(x, y)` lies in the support.
    ///
    /// * `x` - Raster x index.
    /// * `y` - Raster y index.
    pub fn in_range(&self, x: i64, y: i64) -> bool {
        self.sx.in_range(x) && self.sy.in_range(y)
    }

    /// Returns true if the support overlaps another one.
    ///
    /// * `other` - The other support.
    pub fn intersects_range(&self, other: &Self) -> bool {
        self.sx.intersects_range(other.sx.start, other.sx.end)
            && self.sy.intersects_range(other.sy.start, other.sy.end)
    }

    /// Returns true if the support lies completely inside another one.
    ///
    /// * `other` - The enclosing support.
    pub fn within_range(&self, other: &Self) -> bool {
        self.sx.within_range(other.sx.start, other.sx.end)
            && self.sy.within_range(other.sy.start, other.sy.end)
    }

    /// Clamps both axes into `[0, width) x [0, height)`.
    ///
    /// * `width`  - Raster width.
    /// * `height` - Raster height.
    pub fn truncate(&mut self, width: i64, height: i64) {
        self.sx.truncate(0, width);
        self.sy.truncate(0, height);
    }

    /// Returns the per-axis intersection of two supports.
    ///
    /// * `a` - First support.
    /// * `b` - Second support.
    pub fn intersect(a: &Self, b: &Self) -> Self {
        Self::new(
            FilterSupport1D::intersect(&a.sx, &b.sx),
            FilterSupport1D::intersect(&a.sy, &b.sy),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn support_1d()(start in -50..50i64, len in 0..40i64) -> FilterSupport1D {
            FilterSupport1D::new(start, start + len)
        }
    }

    #[test]
    fn reversed_bounds_are_empty() {
        let s = FilterSupport1D::new(5, 2);
        assert!(s.is_empty());
        assert_eq!(s.range(), 0);
    }

    #[test]
    fn truncate_to_raster() {
        let mut s = FilterSupport1D::new(-2, 3);
        s.truncate(0, 10);
        assert_eq!(s, FilterSupport1D::new(0, 3));

        let mut s = FilterSupport1D::new(12, 15);
        s.truncate(0, 10);
        assert!(s.is_empty());
        assert!(s.start <= s.end);
    }

    #[test]
    fn area_zero_for_empty_axis() {
        let s = FilterSupport::from_bounds(0, 4, 3, 3);
        assert_eq!(s.area(), 0);
        assert!(s.is_empty());
        assert_eq!(FilterSupport::from_bounds(0, 4, 0, 2).area(), 8);
    }

    #[test]
    fn range_predicates() {
        let s = FilterSupport::from_bounds(0, 4, 0, 4);
        assert!(s.in_range(3, 0));
        assert!(!s.in_range(4, 0));
        assert!(s.intersects_range(&FilterSupport::from_bounds(3, 8, -2, 1)));
        assert!(!s.intersects_range(&FilterSupport::from_bounds(4, 8, 0, 4)));
        assert!(FilterSupport::from_bounds(1, 2, 1, 2).within_range(&s));
    }

    proptest! {
        #[test]
        fn intersect_never_larger(a in support_1d(), b in support_1d()) {
            let c = FilterSupport1D::intersect(&a, &b);
            prop_assert!(c.range() <= a.range().min(b.range()));
            prop_assert!(c.start <= c.end);
        }

        #[test]
        fn truncate_never_widens(a in support_1d(), lo in -60..60i64, len in 0..60i64) {
            let mut t = a;
            t.truncate(lo, lo + len);
            prop_assert!(t.range() <= a.range());
            prop_assert!(t.start <= t.end);
        }

        #[test]
        fn area_matches_axes(a in support_1d(), b in support_1d()) {
            let s = FilterSupport::new(a, b);
            prop_assert_eq!(s.area(), a.range() * b.range());
        }
    }
}
