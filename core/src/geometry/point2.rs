//! 2-D Points and Vectors

use crate::math::*;
use num_traits::{Num, Zero};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A 2-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point2<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,
}

/// 2-D point containing `Float` values.
pub type Point2f = Point2<Float>;

/// A 2-D vector containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector2<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,
}

/// 2-D vector containing `Float` values.
pub type Vector2f = Vector2<Float>;

impl<T: Num> Point2<T> {
    /// Creates a new 2-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Creates a new 2-D zero point.
    pub fn zero() -> Self
    where
        T: Zero,
    {
        Self::new(T::zero(), T::zero())
    }
}

impl<T: Num> Vector2<T> {
    /// Creates a new 2-D vector.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Creates a new 2-D zero vector.
    pub fn zero() -> Self
    where
        T: Zero,
    {
        Self::new(T::zero(), T::zero())
    }

    /// Returns the square of the vector's length.
    pub fn length_squared(&self) -> T
    where
        T: Copy,
    {
        self.x * self.x + self.y * self.y
    }
}

impl Vector2f {
    /// Returns the vector's length.
    pub fn length(&self) -> Float {
        self.length_squared().sqrt()
    }

    /// Returns a vector with absolute values of the components.
    pub fn abs(&self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }
}

impl<T: Num> Add<Vector2<T>> for Point2<T> {
    type Output = Point2<T>;

    /// Offsets a point by a vector.
    ///
    /// * `other` - The vector to add.
    fn add(self, other: Vector2<T>) -> Self::Output {
        Point2::new(self.x + other.x, self.y + other.y)
    }
}

impl<T: Num> Add for Point2<T> {
    type Output = Point2<T>;

    /// Adds the coordinates of two points.
    ///
    /// * `other` - The point to add.
    fn add(self, other: Self) -> Self::Output {
        Point2::new(self.x + other.x, self.y + other.y)
    }
}

impl<T: Num> Sub for Point2<T> {
    type Output = Vector2<T>;

    /// Returns the vector between two points.
    ///
    /// * `other` - The point to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Vector2::new(self.x - other.x, self.y - other.y)
    }
}

impl<T: Num> Sub<Vector2<T>> for Point2<T> {
    type Output = Point2<T>;

    /// Offsets a point by the negated vector.
    ///
    /// * `other` - The vector to subtract.
    fn sub(self, other: Vector2<T>) -> Self::Output {
        Point2::new(self.x - other.x, self.y - other.y)
    }
}

impl<T: Num + Copy> Mul<T> for Point2<T> {
    type Output = Point2<T>;

    /// Scales the point coordinates.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Point2::new(self.x * f, self.y * f)
    }
}

impl<T: Num> Add for Vector2<T> {
    type Output = Vector2<T>;

    /// Adds two vectors.
    ///
    /// * `other` - The vector to add.
    fn add(self, other: Self) -> Self::Output {
        Vector2::new(self.x + other.x, self.y + other.y)
    }
}

impl<T: Num + Copy> AddAssign for Vector2<T> {
    /// Adds a vector in place.
    ///
    /// * `other` - The vector to add.
    fn add_assign(&mut self, other: Self) {
        self.x = self.x + other.x;
        self.y = self.y + other.y;
    }
}

impl<T: Num> Sub for Vector2<T> {
    type Output = Vector2<T>;

    /// Subtracts two vectors.
    ///
    /// * `other` - The vector to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Vector2::new(self.x - other.x, self.y - other.y)
    }
}

impl<T: Num + Copy> Mul<T> for Vector2<T> {
    type Output = Vector2<T>;

    /// Scales the vector.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Vector2::new(self.x * f, self.y * f)
    }
}

impl<T: Num + Neg<Output = T>> Neg for Vector2<T> {
    type Output = Vector2<T>;

    fn neg(self) -> Self::Output {
        Vector2::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_vector_arithmetic() {
        let p = Point2f::new(1.0, 2.0);
        let v = Vector2f::new(0.5, -1.0);
        assert_eq!(p + v, Point2f::new(1.5, 1.0));
        assert_eq!((p + v) - p, v);
        assert_eq!(v * 2.0, Vector2f::new(1.0, -2.0));
        assert_eq!(-v, Vector2f::new(-0.5, 1.0));
        assert_eq!(Vector2f::new(3.0, 4.0).length(), 5.0);
    }
}
