//! Texture Core

#[macro_use]
extern crate log;

// Re-export.
pub mod cached_filter;
pub mod channel;
pub mod error;
pub mod filter;
pub mod filter_support;
pub mod geometry;
pub mod image_io;
pub mod math;
pub mod memory;
pub mod mipmap;
pub mod search_path;
pub mod texfile;
pub mod tile_array;
