//! Samplers

#[macro_use]
extern crate log;

mod cache;
mod dummy;
mod environment;
mod filtering;
mod footprint;
mod occlusion;
mod options;
mod shadow;
mod texture;

// Re-export.
pub use cache::*;
pub use dummy::*;
pub use environment::*;
pub use filtering::*;
pub use footprint::*;
pub use occlusion::*;
pub use options::*;
pub use shadow::*;
pub use texture::*;
