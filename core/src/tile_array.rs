//! Tile Array
//!
//! Lazily loaded tiles of one texture subimage with memory accounting.

use crate::error::*;
use crate::memory::*;
use crate::texfile::*;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Tiles of one subimage, loaded on first access and released on `zap_memory`.
pub struct TileArray {
    /// The file the tiles come from.
    file: ArcTextureFile,

    /// Subimage index.
    subimage: usize,

    /// Tile size in pixels.
    tile_size: (usize, usize),

    /// Number of tiles in x and y.
    num_tiles: (usize, usize),

    /// Loaded tiles keyed by tile column and row.
    tiles: RwLock<HashMap<(usize, usize), Arc<TextureTile>>>,

    /// Memory accounting.
    reporter: MemoryReporter,
}

impl TileArray {
    /// Creates a tile array and registers it with the sentry.
    ///
    /// * `file`     - The file.
    /// * `subimage` - Subimage index.
    /// * `sentry`   - Memory sentry to report to.
    pub fn new(
        file: ArcTextureFile,
        subimage: usize,
        sentry: Option<&Arc<MemorySentry>>,
    ) -> TexResult<Arc<Self>> {
        if subimage >= file.num_subimages() {
            return Err(TexError::Index {
                index: subimage,
                len: file.num_subimages(),
            });
        }
        let header = file.header(subimage);
        let tile_size = header.tile_size();
        let num_tiles = (
            (header.width + tile_size.0 - 1) / tile_size.0,
            (header.height + tile_size.1 - 1) / tile_size.1,
        );

        let array = Arc::new(Self {
            file,
            subimage,
            tile_size,
            num_tiles,
            tiles: RwLock::new(HashMap::new()),
            reporter: MemoryReporter::new(sentry),
        });
        if let Some(sentry) = sentry {
            let monitored: Arc<dyn MemoryMonitored> = array.clone();
            sentry.register_as_managed(&monitored);
        }
        Ok(array)
    }

    /// Returns the subimage header.
    pub fn header(&self) -> &TextureFileHeader {
        self.file.header(self.subimage)
    }

    /// Returns the subimage width.
    pub fn width(&self) -> usize {
        self.header().width
    }

    /// Returns the subimage height.
    pub fn height(&self) -> usize {
        self.header().height
    }

    /// Returns the bytes currently held by loaded tiles.
    pub fn memory_usage(&self) -> i64 {
        self.reporter.memory_usage()
    }

    /// Returns the number of loaded tiles.
    pub fn num_loaded(&self) -> usize {
        self.tiles.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Returns the tile holding a raster position, loading it if needed.
    ///
    /// * `x` - Raster x; must be inside the subimage.
    /// * `y` - Raster y; must be inside the subimage.
    pub fn tile_for(&self, x: usize, y: usize) -> TexResult<Arc<TextureTile>> {
        let key = (x / self.tile_size.0, y / self.tile_size.1);
        if key.0 >= self.num_tiles.0 || key.1 >= self.num_tiles.1 {
            return Err(TexError::BadParams(format!(
                "pixel ({x}, {y}) outside {} x {} image",
                self.width(),
                self.height()
            )));
        }

        if let Some(tile) = self.tiles.read().ok().and_then(|t| t.get(&key).cloned()) {
            return Ok(tile);
        }

        // Decode outside the lock; a concurrent load of the same tile only
        // wastes work.
        let tile = Arc::new(self.file.read_tile(self.subimage, key.0, key.1)?);
        debug!(
            "Loaded tile ({}, {}) of {} subimage {}",
            key.0,
            key.1,
            self.file.path(),
            self.subimage
        );

        let (tile, added) = {
            let mut tiles = self
                .tiles
                .write()
                .map_err(|_| TexError::invalid_file(self.file.path(), "tile cache poisoned"))?;
            match tiles.get(&key) {
                Some(existing) => (existing.clone(), 0),
                None => {
                    let bytes = tile_bytes(&tile);
                    tiles.insert(key, tile.clone());
                    (tile, bytes)
                }
            }
        };

        // Report after releasing the lock; this may trigger eviction which
        // calls back into `zap_memory()`.
        if added > 0 {
            self.reporter.increment_memory_usage(added);
        }
        Ok(tile)
    }
}

/// Returns the accounted size of a tile.
///
/// * `tile` - The tile.
fn tile_bytes(tile: &TextureTile) -> i64 {
    tile.memory_size() as i64
}

impl MemoryMonitored for TileArray {
    fn zap_memory(&self) -> u64 {
        let freed: i64 = match self.tiles.write() {
            Ok(mut tiles) => tiles.drain().map(|(_, t)| tile_bytes(&t)).sum(),
            Err(_) => 0,
        };
        if freed > 0 {
            debug!(
                "Released {freed} bytes of tiles from {} subimage {}",
                self.file.path(),
                self.subimage
            );
            self.reporter.record_zapped(freed);
        }
        freed as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::*;
    use crate::math::Float;

    fn file(w: usize, h: usize, tile: usize) -> ArcTextureFile {
        let header = TextureFileHeader::new(w, h, ChannelList::uniform(&["y"], ChannelType::Float32))
            .with(ATTR_TILE_SIZE, AttrValue::TileSize(tile, tile));
        let values: Vec<Float> = (0..w * h).map(|v| v as Float).collect();
        Arc::new(MemoryTextureFile::from_floats("tiles", header, &values).unwrap())
    }

    #[test]
    fn loads_tiles_on_demand() {
        let sentry = Arc::new(MemorySentry::new(1 << 20));
        let tiles = TileArray::new(file(8, 8, 4), 0, Some(&sentry)).unwrap();
        assert_eq!(tiles.num_loaded(), 0);

        let tile = tiles.tile_for(5, 6).unwrap();
        assert_eq!(tile.value(5, 6, 0), 53.0);
        assert_eq!(tiles.num_loaded(), 1);
        tiles.tile_for(4, 4).unwrap();
        assert_eq!(tiles.num_loaded(), 1);
        assert_eq!(sentry.total_memory(), tiles.memory_usage());
        assert!(tiles.tile_for(8, 0).is_err());
    }

    #[test]
    fn zap_releases_tiles_and_drop_reports() {
        let sentry = Arc::new(MemorySentry::new(1 << 20));
        let tiles = TileArray::new(file(8, 8, 4), 0, Some(&sentry)).unwrap();
        tiles.tile_for(0, 0).unwrap();
        tiles.tile_for(7, 7).unwrap();
        let used = tiles.memory_usage();
        assert!(used > 0);

        let freed = tiles.zap_memory();
        assert_eq!(freed as i64, used);
        assert_eq!(tiles.num_loaded(), 0);
        assert_eq!(tiles.memory_usage(), 0);

        tiles.tile_for(0, 0).unwrap();
        let total_before = sentry.total_memory();
        assert!(total_before > 0);
        drop(tiles);
        assert!(sentry.total_memory() < total_before);
    }

    #[test]
    fn budget_pressure_evicts_tiles() {
        let sentry = Arc::new(MemorySentry::new(200));
        let tiles = TileArray::new(file(16, 16, 4), 0, Some(&sentry)).unwrap();
        for i in 0..4 {
            tiles.tile_for(i * 4, 0).unwrap();
        }
        assert!(tiles.num_loaded() < 4);
        assert!(sentry.total_memory() <= 200);
    }

    #[test]
    fn bad_subimage() {
        assert!(TileArray::new(file(2, 2, 2), 1, None).is_err());
    }
}
