//! Geometry

mod matrix4x4;
mod point2;
mod point3;

// Re-export
pub use matrix4x4::*;
pub use point2::*;
pub use point3::*;
