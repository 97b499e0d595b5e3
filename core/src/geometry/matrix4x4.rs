//! 4x4 Matrix

use super::{Point3f, Vector3f};
use crate::math::Float;
use std::ops::Mul;

/// A 4x4 matrix containing Float values. Transforms use the column-vector
/// convention so `p' = M * p`, and `A * B` applies `B` first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix4x4 {
    /// Stores a 2-D array of Float in row-major order.
    pub m: [[Float; 4]; 4],
}

/// Identity matrix.
pub const IDENTITY_MATRIX: Matrix4x4 = Matrix4x4 {
    m: [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ],
};

impl Matrix4x4 {
    /// Create a matrix from rows.
    ///
    /// * `m` - Rows of the matrix.
    pub fn new(m: [[Float; 4]; 4]) -> Self {
        Self { m }
    }

    /// Returns a translation matrix.
    ///
    /// * `delta` - Translation.
    #[rustfmt::skip]
    pub fn translate(delta: Vector3f) -> Self {
        Self::new([
            [1.0, 0.0, 0.0, delta.x],
            [0.0, 1.0, 0.0, delta.y],
            [0.0, 0.0, 1.0, delta.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Returns a non-uniform scaling matrix.
    ///
    /// * `x` - Scale along x.
    /// * `y` - Scale along y.
    /// * `z` - Scale along z.
    #[rustfmt::skip]
    pub fn scale(x: Float, y: Float, z: Float) -> Self {
        Self::new([
            [  x, 0.0, 0.0, 0.0],
            [0.0,   y, 0.0, 0.0],
            [0.0, 0.0,   z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Returns the transpose of the matrix.
    pub fn transpose(&self) -> Self {
        let mut t = [[0.0; 4]; 4];
        for (i, row) in t.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = self.m[j][i];
            }
        }
        Self::new(t)
    }

    /// Returns the inverse of the matrix using Gauss-Jordan elimination with
    /// partial pivoting, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let mut a = self.m;
        let mut inv = IDENTITY_MATRIX.m;

        for col in 0..4 {
            // Choose pivot.
            let pivot = (col..4).max_by(|&r1, &r2| {
                a[r1][col]
                    .abs()
                    .partial_cmp(&a[r2][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
            if a[pivot][col].abs() < Float::EPSILON * 1e-3 {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let pivinv = 1.0 / a[col][col];
            for k in 0..4 {
                a[col][k] *= pivinv;
                inv[col][k] *= pivinv;
            }

            // Zero out the column in other rows.
            for row in 0..4 {
                if row != col {
                    let f = a[row][col];
                    if f != 0.0 {
                        for k in 0..4 {
                            a[row][k] -= f * a[col][k];
                            inv[row][k] -= f * inv[col][k];
                        }
                    }
                }
            }
        }

        Some(Self::new(inv))
    }

    /// Transforms a point, including the homogeneous divide.
    ///
    /// * `p` - The point.
    pub fn transform_point(&self, p: &Point3f) -> Point3f {
        let m = &self.m;
        let x = m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3];
        let y = m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3];
        let z = m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3];
        let w = m[3][0] * p.x + m[3][1] * p.y + m[3][2] * p.z + m[3][3];
        if w == 1.0 || w == 0.0 {
            Point3f::new(x, y, z)
        } else {
            Point3f::new(x / w, y / w, z / w)
        }
    }

    /// Transforms a direction vector; translation is ignored.
    ///
    /// * `v` - The vector.
    pub fn transform_vector(&self, v: &Vector3f) -> Vector3f {
        let m = &self.m;
        Vector3f::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// Transforms a surface normal using the inverse transpose. Singular
    /// matrices fall back to transforming the normal as a vector.
    ///
    /// * `n` - The normal.
    pub fn transform_normal(&self, n: &Vector3f) -> Vector3f {
        match self.inverse() {
            Some(inv) => inv.transpose().transform_vector(n),
            None => self.transform_vector(n),
        }
    }
}

impl Default for Matrix4x4 {
    /// Returns the default as identity matrix.
    fn default() -> Self {
        IDENTITY_MATRIX
    }
}

impl Mul<Matrix4x4> for Matrix4x4 {
    type Output = Matrix4x4;

    /// Post-multiply the given matrix.
    ///
    /// * `other` - The other matrix
    fn mul(self, other: Matrix4x4) -> Self::Output {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Matrix4x4::new(m)
    }
}
