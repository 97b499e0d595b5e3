//! Sample Footprints
//!
//! The regions of texture space (or of 3D space for environment, shadow and
//! occlusion lookups) a filtered sample integrates over.

use texcore::geometry::*;
use texcore::math::Float;

/// Quadrilateral footprint in `[0, 1]^2` texture space. `v1` and `v2` form
/// the top edge, `v3` and `v4` the bottom edge.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SampleQuad {
    /// Top left.
    pub v1: Point2f,

    /// Top right.
    pub v2: Point2f,

    /// Bottom left.
    pub v3: Point2f,

    /// Bottom right.
    pub v4: Point2f,
}

impl SampleQuad {
    /// Creates a new quad.
    ///
    /// * `v1` - Top left.
    /// * `v2` - Top right.
    /// * `v3` - Bottom left.
    /// * `v4` - Bottom right.
    pub fn new(v1: Point2f, v2: Point2f, v3: Point2f, v4: Point2f) -> Self {
        Self { v1, v2, v3, v4 }
    }

    /// Returns the average of the corners.
    pub fn centre(&self) -> Point2f {
        (self.v1 + self.v2 + self.v3 + self.v4) * 0.25
    }
}

/// Parallelogram footprint with corners `c ± s1 ± s2`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SamplePllgram {
    /// Centre.
    pub c: Point2f,

    /// First half side.
    pub s1: Vector2f,

    /// Second half side.
    pub s2: Vector2f,
}

impl SamplePllgram {
    /// Creates a new parallelogram.
    ///
    /// * `c`  - Centre.
    /// * `s1` - First half side.
    /// * `s2` - Second half side.
    pub fn new(c: Point2f, s1: Vector2f, s2: Vector2f) -> Self {
        Self { c, s1, s2 }
    }

    /// Creates an axis aligned footprint from a centre and full extents.
    ///
    /// * `c`  - Centre.
    /// * `ds` - Width in s.
    /// * `dt` - Height in t.
    pub fn from_extents(c: Point2f, ds: Float, dt: Float) -> Self {
        Self::new(c, Vector2f::new(0.5 * ds, 0.0), Vector2f::new(0.0, 0.5 * dt))
    }

    /// Returns the corners in quad order.
    pub fn corners(&self) -> [Point2f; 4] {
        [
            self.c - self.s1 - self.s2,
            self.c + self.s1 - self.s2,
            self.c - self.s1 + self.s2,
            self.c + self.s1 + self.s2,
        ]
    }

    /// Returns the full width and height of the bounding box.
    pub fn extents(&self) -> (Float, Float) {
        (
            2.0 * (self.s1.x.abs() + self.s2.x.abs()),
            2.0 * (self.s1.y.abs() + self.s2.y.abs()),
        )
    }

    /// Scales the sides, leaving the centre in place.
    ///
    /// * `s1_scale` - Scale for `s1`.
    /// * `s2_scale` - Scale for `s2`.
    pub fn scale_width(&self, s1_scale: Float, s2_scale: Float) -> Self {
        Self::new(self.c, self.s1 * s1_scale, self.s2 * s2_scale)
    }
}

impl From<&SampleQuad> for SamplePllgram {
    /// Returns the parallelogram best fitting a quad: the centroid, and half
    /// the averages of opposite edges.
    ///
    /// * `q` - The quad.
    fn from(q: &SampleQuad) -> Self {
        let s1 = ((q.v2 - q.v1) + (q.v4 - q.v3)) * 0.25;
        let s2 = ((q.v3 - q.v1) + (q.v4 - q.v2)) * 0.25;
        Self::new(q.centre(), s1, s2)
    }
}

/// Quadrilateral footprint in 3D (directions or positions).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sample3dQuad {
    /// Top left.
    pub v1: Vector3f,

    /// Top right.
    pub v2: Vector3f,

    /// Bottom left.
    pub v3: Vector3f,

    /// Bottom right.
    pub v4: Vector3f,
}

impl Sample3dQuad {
    /// Creates a new quad.
    ///
    /// * `v1` - Top left.
    /// * `v2` - Top right.
    /// * `v3` - Bottom left.
    /// * `v4` - Bottom right.
    pub fn new(v1: Vector3f, v2: Vector3f, v3: Vector3f, v4: Vector3f) -> Self {
        Self { v1, v2, v3, v4 }
    }
}

/// Parallelogram footprint in 3D with corners `c ± s1 ± s2`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sample3dPllgram {
    /// Centre.
    pub c: Vector3f,

    /// First half side.
    pub s1: Vector3f,

    /// Second half side.
    pub s2: Vector3f,
}

impl Sample3dPllgram {
    /// Creates a new parallelogram.
    ///
    /// * `c`  - Centre.
    /// * `s1` - First half side.
    /// * `s2` - Second half side.
    pub fn new(c: Vector3f, s1: Vector3f, s2: Vector3f) -> Self {
        Self { c, s1, s2 }
    }

    /// Creates a degenerate footprint at a single point or direction.
    ///
    /// * `c` - The point or direction.
    pub fn point(c: Vector3f) -> Self {
        Self::new(c, Vector3f::default(), Vector3f::default())
    }

    /// Returns the corners in quad order.
    pub fn corners(&self) -> [Vector3f; 4] {
        [
            self.c - self.s1 - self.s2,
            self.c + self.s1 - self.s2,
            self.c - self.s1 + self.s2,
            self.c + self.s1 + self.s2,
        ]
    }
}

impl From<&Sample3dQuad> for Sample3dPllgram {
    fn from(q: &Sample3dQuad) -> Self {
        let c = (q.v1 + q.v2 + q.v3 + q.v4) * 0.25;
        let s1 = ((q.v2 - q.v1) + (q.v4 - q.v3)) * 0.25;
        let s2 = ((q.v3 - q.v1) + (q.v4 - q.v2)) * 0.25;
        Self::new(c, s1, s2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    prop_compose! {
        fn point2()(x in -10.0..10.0f32, y in -10.0..10.0f32) -> Point2f {
            Point2f::new(x, y)
        }
    }

    prop_compose! {
        fn vector2()(x in -10.0..10.0f32, y in -10.0..10.0f32) -> Vector2f {
            Vector2f::new(x, y)
        }
    }

    proptest! {
        #[test]
        fn pllgram_quad_round_trip(c in point2(), s1 in vector2(), s2 in vector2()) {
            let p = SamplePllgram::new(c, s1, s2);
            let [v1, v2, v3, v4] = p.corners();
            let q = SamplePllgram::from(&SampleQuad::new(v1, v2, v3, v4));
            prop_assert!(approx_eq!(Float, q.c.x, c.x, epsilon = 1e-4));
            prop_assert!(approx_eq!(Float, q.c.y, c.y, epsilon = 1e-4));
            prop_assert!(approx_eq!(Float, q.s1.x, s1.x, epsilon = 1e-4));
            prop_assert!(approx_eq!(Float, q.s2.y, s2.y, epsilon = 1e-4));
        }
    }

    #[test]
    fn extents_of_axis_aligned_footprint() {
        let p = SamplePllgram::from_extents(Point2f::new(0.5, 0.5), 0.25, 0.125);
        assert_eq!(p.extents(), (0.25, 0.125));
        assert_eq!(p.scale_width(2.0, 1.0).extents(), (0.5, 0.125));
    }

    #[test]
    fn quad_3d_to_pllgram() {
        let q = Sample3dQuad::new(
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(2.0, 0.0, 1.0),
            Vector3f::new(0.0, 2.0, 1.0),
            Vector3f::new(2.0, 2.0, 1.0),
        );
        let p = Sample3dPllgram::from(&q);
        assert_eq!(p.c, Vector3f::new(1.0, 1.0, 1.0));
        assert_eq!(p.s1, Vector3f::new(1.0, 0.0, 0.0));
        assert_eq!(p.s2, Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(p.corners()[0], q.v1);
    }
}
