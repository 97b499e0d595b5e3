//! 3-D Points and Vectors

use crate::math::*;
use num_traits::Num;
use std::ops::{Add, Mul, Neg, Sub};

/// A 3-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D point containing `Float` values.
pub type Point3f = Point3<Float>;

/// A 3-D vector containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D vector containing `Float` values.
pub type Vector3f = Vector3<Float>;

impl<T: Num> Point3<T> {
    /// Creates a new 3-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Num> Vector3<T> {
    /// Creates a new 3-D vector.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl Vector3f {
    /// Returns the dot product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn dot(&self, other: &Self) -> Float {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the vector's length.
    pub fn length(&self) -> Float {
        self.dot(self).sqrt()
    }

    /// Returns a unit vector in the same direction. Zero vectors are returned
    /// unchanged.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            *self
        }
    }

    /// Returns the component with the largest magnitude as an axis index
    /// (0 = x, 1 = y, 2 = z).
    pub fn max_dimension(&self) -> usize {
        let (ax, ay, az) = (self.x.abs(), self.y.abs(), self.z.abs());
        if ax >= ay && ax >= az {
            0
        } else if ay >= az {
            1
        } else {
            2
        }
    }

    /// Returns the component at the given axis index.
    ///
    /// * `axis` - 0 = x, 1 = y, 2 = z.
    pub fn component(&self, axis: usize) -> Float {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl From<Point3f> for Vector3f {
    /// Convert a point to the vector from the origin.
    ///
    /// * `p` - The point.
    fn from(p: Point3f) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl<T: Num> Add<Vector3<T>> for Point3<T> {
    type Output = Point3<T>;

    /// Offsets a point by a vector.
    ///
    /// * `v` - The vector to add.
    fn add(self, v: Vector3<T>) -> Self::Output {
        Point3::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl<T: Num> Sub<Vector3<T>> for Point3<T> {
    type Output = Point3<T>;

    /// Offsets a point by the negated vector.
    ///
    /// * `v` - The vector to subtract.
    fn sub(self, v: Vector3<T>) -> Self::Output {
        Point3::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl<T: Num> Sub for Point3<T> {
    type Output = Vector3<T>;

    /// Returns the vector between two points.
    ///
    /// * `other` - The point to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<T: Num> Add for Vector3<T> {
    type Output = Vector3<T>;

    /// Adds two vectors.
    ///
    /// * `other` - The vector to add.
    fn add(self, other: Self) -> Self::Output {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<T: Num> Sub for Vector3<T> {
    type Output = Vector3<T>;

    /// Subtracts two vectors.
    ///
    /// * `other` - The vector to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<T: Num + Copy> Mul<T> for Vector3<T> {
    type Output = Vector3<T>;

    /// Scales the vector.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Vector3::new(self.x * f, self.y * f, self.z * f)
    }
}

impl<T: Num + Neg<Output = T>> Neg for Vector3<T> {
    type Output = Vector3<T>;

    fn neg(self) -> Self::Output {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_and_dot() {
        let v = Vector3f::new(0.0, 3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.normalize(), Vector3f::new(0.0, 0.6, 0.8));
        assert_eq!(v.dot(&Vector3f::new(1.0, 1.0, 1.0)), 7.0);
        assert_eq!(Vector3f::new(0.0, 0.0, 0.0).normalize(), Vector3f::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn max_dimension() {
        assert_eq!(Vector3f::new(-5.0, 1.0, 2.0).max_dimension(), 0);
        assert_eq!(Vector3f::new(0.0, -3.0, 2.0).max_dimension(), 1);
        assert_eq!(Vector3f::new(0.0, 1.0, -2.0).max_dimension(), 2);
    }

    #[test]
    fn point_offsets() {
        let p = Point3f::new(1.0, 1.0, 1.0);
        let v = Vector3f::new(1.0, 2.0, 3.0);
        assert_eq!((p + v) - p, v);
        assert_eq!(p - v, Point3f::new(0.0, -1.0, -2.0));
    }
}
