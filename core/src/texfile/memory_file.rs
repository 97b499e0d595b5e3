//! In-memory Texture Files

use super::*;
use crate::math::Float;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// One subimage held in memory.
struct Subimage {
    /// Subimage header.
    header: TextureFileHeader,

    /// Raw pixel bytes for the full subimage, row-major.
    data: Vec<u8>,
}

/// A texture file whose pixels are fully resident in memory. Tiles are cut
/// out of the subimages on request using each header's tile size.
pub struct MemoryTextureFile {
    /// Path or name of the file.
    path: String,

    /// The subimages.
    subimages: Vec<Subimage>,
}

impl MemoryTextureFile {
    /// Creates a file from raw subimage data.
    ///
    /// * `path`      - Path or name of the file.
    /// * `subimages` - Header and raw pixel bytes of each subimage.
    pub fn new(path: &str, subimages: Vec<(TextureFileHeader, Vec<u8>)>) -> TexResult<Self> {
        if subimages.is_empty() {
            return Err(TexError::invalid_file(path, "no subimages"));
        }
        let subimages = subimages
            .into_iter()
            .map(|(header, data)| {
                let expected = header.width * header.height * header.channels.bytes_per_pixel();
                if header.width == 0 || header.height == 0 || header.channels.is_empty() {
                    Err(TexError::invalid_file(path, "empty subimage"))
                } else if data.len() != expected {
                    Err(TexError::invalid_file(
                        path,
                        format!("subimage is {} bytes, expected {expected}", data.len()),
                    ))
                } else {
                    Ok(Subimage { header, data })
                }
            })
            .collect::<TexResult<Vec<_>>>()?;
        Ok(Self {
            path: path.to_string(),
            subimages,
        })
    }

    /// Creates a single subimage file from normalized float values, converting
    /// them to each channel's storage type.
    ///
    /// * `path`   - Path or name of the file.
    /// * `header` - Subimage header.
    /// * `values` - `width * height * channels` values, row-major, interleaved.
    pub fn from_floats(path: &str, header: TextureFileHeader, values: &[Float]) -> TexResult<Self> {
        let data = encode_floats(path, &header, values)?;
        Self::new(path, vec![(header, data)])
    }

    /// Creates a file from several subimages given as normalized floats.
    ///
    /// * `path`      - Path or name of the file.
    /// * `subimages` - Header and float values of each subimage.
    pub fn from_float_subimages(
        path: &str,
        subimages: Vec<(TextureFileHeader, Vec<Float>)>,
    ) -> TexResult<Self> {
        let subimages = subimages
            .into_iter()
            .map(|(header, values)| {
                let data = encode_floats(path, &header, &values)?;
                Ok((header, data))
            })
            .collect::<TexResult<Vec<_>>>()?;
        Self::new(path, subimages)
    }
}

/// Converts normalized floats into raw pixel bytes for a header's layout.
///
/// * `path`   - File path for error messages.
/// * `header` - Subimage header.
/// * `values` - Float values, row-major, interleaved.
pub fn encode_floats(path: &str, header: &TextureFileHeader, values: &[Float]) -> TexResult<Vec<u8>> {
    let n_channels = header.channels.len();
    let n_pixels = header.width * header.height;
    if values.len() != n_pixels * n_channels {
        return Err(TexError::invalid_file(
            path,
            format!("{} values for {n_pixels} pixels of {n_channels} channels", values.len()),
        ));
    }
    let bpp = header.channels.bytes_per_pixel();
    let mut data = vec![0u8; n_pixels * bpp];
    for (pixel, src) in data.chunks_exact_mut(bpp).zip(values.chunks_exact(n_channels)) {
        for (c, v) in src.iter().enumerate() {
            header.channels.write_normalized(pixel, c, *v);
        }
    }
    Ok(data)
}

impl TextureFile for MemoryTextureFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn num_subimages(&self) -> usize {
        self.subimages.len()
    }

    fn header(&self, subimage: usize) -> &TextureFileHeader {
        &self.subimages[subimage].header
    }

    fn read_tile(&self, subimage: usize, tile_x: usize, tile_y: usize) -> TexResult<TextureTile> {
        let sub = self.subimages.get(subimage).ok_or(TexError::Index {
            index: subimage,
            len: self.subimages.len(),
        })?;
        let header = &sub.header;
        let (tw, th) = header.tile_size();
        let x0 = tile_x * tw;
        let y0 = tile_y * th;
        if x0 >= header.width || y0 >= header.height {
            return Err(TexError::BadParams(format!(
                "tile ({tile_x}, {tile_y}) outside {} x {} image",
                header.width, header.height
            )));
        }
        let w = tw.min(header.width - x0);
        let h = th.min(header.height - y0);

        let bpp = header.channels.bytes_per_pixel();
        let mut data = Vec::with_capacity(w * h * bpp);
        for y in y0..y0 + h {
            let start = (y * header.width + x0) * bpp;
            data.extend_from_slice(&sub.data[start..start + w * bpp]);
        }
        TextureTile::new(x0, y0, w, h, header.channels.clone(), data)
    }
}

/// Opens `MemoryTextureFile`s registered by name.
#[derive(Default)]
pub struct MemoryFileOpener {
    /// Registered files.
    files: RwLock<HashMap<String, ArcTextureFile>>,

    /// Number of calls to `open()`.
    opens: AtomicUsize,
}

impl MemoryFileOpener {
    /// Creates an opener with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file under a path.
    ///
    /// * `path` - The path.
    /// * `file` - The file.
    pub fn insert(&self, path: &str, file: ArcTextureFile) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.to_string(), file);
        }
    }

    /// Returns how many times `open()` has been called.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl TextureFileOpener for MemoryFileOpener {
    fn open(&self, path: &str) -> TexResult<ArcTextureFile> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let files = self
            .files
            .read()
            .map_err(|_| TexError::invalid_file(path, "file registry poisoned"))?;
        files
            .get(path)
            .cloned()
            .ok_or_else(|| TexError::invalid_file(path, "no such file"))
    }

    fn exists(&self, path: &str) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::*;
    use std::sync::Arc;

    fn header(w: usize, h: usize, tile: Option<(usize, usize)>) -> TextureFileHeader {
        let header = TextureFileHeader::new(w, h, ChannelList::uniform(&["y"], ChannelType::Float32));
        match tile {
            Some((tw, th)) => header.with(ATTR_TILE_SIZE, AttrValue::TileSize(tw, th)),
            None => header,
        }
    }

    #[test]
    fn untiled_file_is_one_tile() {
        let values: Vec<Float> = (0..6).map(|v| v as Float).collect();
        let file = MemoryTextureFile::from_floats("a", header(3, 2, None), &values).unwrap();
        let tile = file.read_tile(0, 0, 0).unwrap();
        assert_eq!((tile.width(), tile.height()), (3, 2));
        assert_eq!(tile.value(2, 1, 0), 5.0);
        assert!(file.read_tile(0, 1, 0).is_err());
    }

    #[test]
    fn edge_tiles_are_truncated() {
        let values: Vec<Float> = (0..15).map(|v| v as Float).collect();
        let file = MemoryTextureFile::from_floats("a", header(5, 3, Some((2, 2))), &values).unwrap();
        let tile = file.read_tile(0, 2, 1).unwrap();
        assert_eq!(tile.origin(), (4, 2));
        assert_eq!((tile.width(), tile.height()), (1, 1));
        assert_eq!(tile.value(4, 2, 0), 14.0);
        let tile = file.read_tile(0, 1, 0).unwrap();
        assert_eq!(tile.value(3, 1, 0), 8.0);
    }

    #[test]
    fn value_count_mismatch_is_invalid() {
        let err = MemoryTextureFile::from_floats("bad", header(2, 2, None), &[0.0; 3]);
        assert!(matches!(err, Err(TexError::InvalidFile { .. })));
    }

    #[test]
    fn opener_lookup() {
        let opener = MemoryFileOpener::new();
        let file = MemoryTextureFile::from_floats("t", header(1, 1, None), &[0.5]).unwrap();
        opener.insert("t", Arc::new(file));
        assert!(opener.exists("t"));
        assert!(!opener.exists("u"));
        assert!(opener.open("t").is_ok());
        assert!(opener.open("u").is_err());
        assert_eq!(opener.open_count(), 2);
    }
}
