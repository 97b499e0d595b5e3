//! Image I/O
//!
//! Reads image files from disk and turns them into mipmapped, tiled texture
//! files.

use crate::channel::*;
use crate::error::*;
use crate::filter::*;
use crate::math::*;
use crate::mipmap::*;
use crate::texfile::*;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use exr::prelude as exrs;
use exr::prelude::{ReadChannels, ReadLayers};
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::sync::{Arc, OnceLock};

/// Default tile size for textures read from disk.
pub const DEFAULT_TILE_SIZE: usize = 64;

/// Pixels decoded from an image file.
pub struct DecodedImage {
    /// Width in pixels.
    pub width: usize,

    /// Height in pixels.
    pub height: usize,

    /// Pixel layout the values will be stored as.
    pub channels: ChannelList,

    /// Normalized values, row-major with row 0 at the top, interleaved.
    pub values: Vec<Float>,
}

impl DecodedImage {
    /// Moves the r, g, b and a channels to the front, keeping the rest in
    /// their original order, and permutes the pixel values to match.
    pub fn into_canonical_order(mut self) -> Self {
        let order = self.channels.reorder_channels();
        if order.iter().enumerate().all(|(i, &j)| i == j) {
            return self;
        }
        let n = order.len();
        let mut values = Vec::with_capacity(self.values.len());
        for pixel in self.values.chunks_exact(n) {
            values.extend(order.iter().map(|&j| pixel[j]));
        }
        self.values = values;
        self
    }
}

/// Read an image.
///
/// * `path` - Input file path.
pub fn read_image(path: &str) -> TexResult<DecodedImage> {
    match get_extension_from_filename(path).as_deref() {
        Some(".exr") => read_exr(path),
        Some(".pfm") => read_pfm(path),
        Some(_extension) => read_8_bit(path),
        None => Err(TexError::invalid_file(
            path,
            "can't determine file type from suffix",
        )),
    }
}

/// Read the RGBA channels of a single layer OpenEXR file.
///
/// * `path` - Input file path.
fn read_exr(path: &str) -> TexResult<DecodedImage> {
    let reader = exrs::read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _channels| {
                let width = resolution.width();
                let height = resolution.height();
                DecodedImage {
                    width,
                    height,
                    channels: ChannelList::uniform(&["r", "g", "b", "a"], ChannelType::Float32),
                    values: vec![0.0; 4 * width * height],
                }
            },
            |img, position, (r, g, b, a): (f32, f32, f32, f32)| {
                let offset = 4 * (position.y() * img.width + position.x());
                img.values[offset..offset + 4].copy_from_slice(&[r, g, b, a]);
            },
        )
        .first_valid_layer()
        .all_attributes();

    match reader.from_file(path) {
        Ok(image) => {
            let pixels = image.layer_data.channel_data.pixels;
            info!("Read EXR image {path} ({} x {})", pixels.width, pixels.height);
            Ok(pixels)
        }
        Err(err) => Err(TexError::invalid_file(path, err)),
    }
}

/// Returns true if the character is a space, newline or tab.
///
/// * `c` - The character to check.
#[inline(always)]
fn is_white_space(c: char) -> bool {
    c == ' ' || c == '\n' || c == '\t' || c == '\r'
}

/// Reads a whitespace terminated word of at most `len` bytes.
///
/// * `reader` - Input.
/// * `len`    - Maximum number of bytes to read.
fn read_pfm_word<R: Read>(reader: &mut R, len: usize) -> TexResult<String> {
    let mut s = String::new();
    let mut c = reader.read_u8()?;
    while !is_white_space(c as char) {
        if s.len() == len {
            return Err(TexError::BadParams(
                "PFM header word too long".to_string(),
            ));
        }
        s.push(c as char);
        c = reader.read_u8()?;
    }
    Ok(s)
}

/// Reads a PFM header word and parses it.
///
/// * `path`   - File path for error messages.
/// * `reader` - Input.
/// * `what`   - Name of the field.
fn parse_pfm_word<R: Read, T: std::str::FromStr>(path: &str, reader: &mut R, what: &str) -> TexResult<T> {
    read_pfm_word(reader, 80)?
        .parse::<T>()
        .map_err(|_| TexError::invalid_file(path, format!("bad PFM {what}")))
}

/// Read a PFM (Portable FloatMap) file.
///
/// * `path` - Input file path.
fn read_pfm(path: &str) -> TexResult<DecodedImage> {
    let mut reader = BufReader::new(File::open(path)?);

    let n_channels = match read_pfm_word(&mut reader, 2)?.as_str() {
        "Pf" => 1,
        "PF" => 3,
        s => return Err(TexError::invalid_file(path, format!("invalid PFM type '{s}'"))),
    };
    let width: usize = parse_pfm_word(path, &mut reader, "width")?;
    let height: usize = parse_pfm_word(path, &mut reader, "height")?;
    let scale: f32 = parse_pfm_word(path, &mut reader, "scale")?;
    if width == 0 || height == 0 {
        return Err(TexError::invalid_file(path, "empty PFM image"));
    }
    let little_endian = scale < 0.0;
    let scale = scale.abs();

    // Rows are stored bottom to top.
    let row_len = width * n_channels;
    let mut values = vec![0.0; row_len * height];
    for y in (0..height).rev() {
        for v in values[y * row_len..(y + 1) * row_len].iter_mut() {
            let f = if little_endian {
                reader.read_f32::<LittleEndian>()
            } else {
                reader.read_f32::<BigEndian>()
            }
            .map_err(|e| TexError::invalid_file(path, format!("truncated pixel data: {e}")))?;
            *v = f * scale;
        }
    }

    let names: &[&str] = if n_channels == 1 { &["y"] } else { &["r", "g", "b"] };
    info!("Read PFM image {path} ({width} x {height} x {n_channels})");
    Ok(DecodedImage {
        width,
        height,
        channels: ChannelList::uniform(names, ChannelType::Float32),
        values,
    })
}

/// Read an 8-bit image format, keeping luminance, RGB or RGBA channels.
///
/// * `path` - Input file path.
fn read_8_bit(path: &str) -> TexResult<DecodedImage> {
    let img = image::open(path).map_err(|e| TexError::invalid_file(path, e))?;
    let color = img.color();
    let width = img.width() as usize;
    let height = img.height() as usize;

    let (names, raw): (&[&str], Vec<u8>) = match (color.channel_count(), color.has_alpha()) {
        (1, _) => (&["y"], img.into_luma8().into_raw()),
        (_, true) => (&["r", "g", "b", "a"], img.into_rgba8().into_raw()),
        _ => (&["r", "g", "b"], img.into_rgb8().into_raw()),
    };
    let values = raw.iter().map(|v| *v as Float / 255.0).collect();

    info!(
        "Read 8-bit image {path} ({width} x {height} x {})",
        names.len()
    );
    Ok(DecodedImage {
        width,
        height,
        channels: ChannelList::uniform(names, ChannelType::Uint8),
        values,
    })
}

/// Writes a single channel or RGB PFM file, top row first in `values`.
///
/// * `path`       - Output file path.
/// * `width`      - Width in pixels.
/// * `height`     - Height in pixels.
/// * `n_channels` - 1 or 3.
/// * `values`     - Pixel values.
pub fn write_pfm(path: &str, width: usize, height: usize, n_channels: usize, values: &[f32]) -> TexResult<()> {
    let ty = match n_channels {
        1 => "Pf",
        3 => "PF",
        _ => return Err(TexError::BadParams(format!("PFM can't hold {n_channels} channels"))),
    };
    if values.len() != width * height * n_channels {
        return Err(TexError::BadParams(format!(
            "{} values for {width} x {height} x {n_channels} PFM",
            values.len()
        )));
    }

    let mut file = BufWriter::new(File::create(path)?);
    write!(file, "{ty}\n{width} {height}\n-1\n")?;
    let row_len = width * n_channels;
    for y in (0..height).rev() {
        for v in values[y * row_len..(y + 1) * row_len].iter() {
            file.write_f32::<LittleEndian>(*v)?;
        }
    }
    file.flush()?;
    Ok(())
}

/// Returns regular expression for extracting the file extension. This will
/// match the last occurrence of a period followed by no periods or slashes.
fn regex_file_ext() -> &'static Regex {
    static DATA: OnceLock<Regex> = OnceLock::new();
    DATA.get_or_init(|| Regex::new(r"(\.[^./\\]+)$").unwrap())
}

/// Retrieve the lowercase extension from a file path.
///
/// * `path` - The file path.
fn get_extension_from_filename(path: &str) -> Option<String> {
    regex_file_ext()
        .captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Opens image files from disk as mipmapped in-memory texture files.
pub struct ImageFileOpener {
    /// Filter used to generate mip levels.
    mip_filter: Arc<dyn Filter>,

    /// Width of the mip filter in destination pixels.
    mip_filter_width: Float,

    /// Tile size recorded in the headers.
    tile_size: usize,

    /// Wrap modes recorded in the headers.
    wrap_modes: (WrapMode, WrapMode),
}

impl ImageFileOpener {
    /// Creates a new opener.
    ///
    /// * `mip_filter`       - Filter used to generate mip levels.
    /// * `mip_filter_width` - Width of the mip filter in destination pixels.
    pub fn new(mip_filter: Arc<dyn Filter>, mip_filter_width: Float) -> Self {
        Self {
            mip_filter,
            mip_filter_width,
            tile_size: DEFAULT_TILE_SIZE,
            wrap_modes: (WrapMode::Clamp, WrapMode::Clamp),
        }
    }

    /// Sets the tile size recorded in the headers.
    ///
    /// * `tile_size` - Tile width and height.
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    /// Sets the wrap modes recorded in the headers.
    ///
    /// * `s_wrap` - Wrap mode in s.
    /// * `t_wrap` - Wrap mode in t.
    pub fn with_wrap_modes(mut self, s_wrap: WrapMode, t_wrap: WrapMode) -> Self {
        self.wrap_modes = (s_wrap, t_wrap);
        self
    }
}

impl TextureFileOpener for ImageFileOpener {
    fn open(&self, path: &str) -> TexResult<ArcTextureFile> {
        let image = read_image(path)?.into_canonical_order();
        let header = TextureFileHeader::new(image.width, image.height, image.channels)
            .with(ATTR_TILE_SIZE, AttrValue::TileSize(self.tile_size, self.tile_size))
            .with(
                ATTR_WRAP_MODES,
                AttrValue::WrapModes(self.wrap_modes.0, self.wrap_modes.1),
            )
            .with(ATTR_TEXTURE_FORMAT, AttrValue::Text(TextureFormat::Plain.to_string()));
        let subimages = build_mip_subimages(
            path,
            &header,
            image.values,
            self.mip_filter.as_ref(),
            self.mip_filter_width,
        )?;
        Ok(Arc::new(MemoryTextureFile::new(path, subimages)?))
    }
}
