//! Texture Files
//!
//! The boundary to image files. The engine never decodes pixels itself; it
//! consumes `TextureFile` handles produced by a `TextureFileOpener`.

use crate::error::*;
use std::path::Path;
use std::sync::Arc;

mod header;
mod memory_file;
mod tile;

// Re-export
pub use header::*;
pub use memory_file::*;
pub use tile::*;

/// An opened texture file.
pub trait TextureFile: Send + Sync {
    /// Returns the path the file was opened from.
    fn path(&self) -> &str;

    /// Returns the number of subimages. Plain and environment maps store one
    /// mipmap level per subimage; occlusion maps store one shadow map per
    /// subimage.
    fn num_subimages(&self) -> usize {
        1
    }

    /// Returns the header of a subimage.
    ///
    /// * `subimage` - Subimage index; must be less than `num_subimages()`.
    fn header(&self, subimage: usize) -> &TextureFileHeader;

    /// Reads one tile of a subimage. Tiles at the right and bottom edges may
    /// be smaller than the nominal tile size.
    ///
    /// * `subimage` - Subimage index.
    /// * `tile_x`   - Tile column.
    /// * `tile_y`   - Tile row.
    fn read_tile(&self, subimage: usize, tile_x: usize, tile_y: usize) -> TexResult<TextureTile>;
}

/// Atomic reference counted `TextureFile`.
pub type ArcTextureFile = Arc<dyn TextureFile>;

/// Opens texture files given a resolved path.
pub trait TextureFileOpener: Send + Sync {
    /// Opens a file.
    ///
    /// * `path` - Resolved path.
    fn open(&self, path: &str) -> TexResult<ArcTextureFile>;

    /// Returns true if a file exists at the path.
    ///
    /// * `path` - Candidate path.
    fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }
}
