//! Texture File Header

use crate::channel::*;
use crate::error::*;
use crate::geometry::Matrix4x4;
use crate::math::Float;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Attribute key for the s and t wrap modes.
pub const ATTR_WRAP_MODES: &str = "wrapModes";

/// Attribute key for the tile size.
pub const ATTR_TILE_SIZE: &str = "tileSize";

/// Attribute key for the world to camera matrix of a shadow map.
pub const ATTR_WORLD_TO_CAMERA: &str = "worldToCamera";

/// Attribute key for the world to screen matrix of a shadow map.
pub const ATTR_WORLD_TO_SCREEN: &str = "worldToScreen";

/// Attribute key for the texture format.
pub const ATTR_TEXTURE_FORMAT: &str = "textureFormat";

/// Attribute key for the compression scheme.
pub const ATTR_COMPRESSION: &str = "compression";

/// Attribute key for the image description.
pub const ATTR_DESCRIPTION: &str = "description";

/// Attribute key for the creating software.
pub const ATTR_SOFTWARE: &str = "software";

/// Policy for raster positions outside the image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Positions outside contribute zero but keep their filter weight.
    Black,
    /// Positions wrap around.
    Periodic,
    /// Positions are clamped to the edge.
    Clamp,
    /// Positions outside are dropped and the remaining weights renormalized.
    Trunc,
}

impl FromStr for WrapMode {
    type Err = TexError;

    /// Parse a wrap mode name.
    ///
    /// * `s` - Wrap mode name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Self::Black),
            "periodic" | "repeat" => Ok(Self::Periodic),
            "clamp" => Ok(Self::Clamp),
            "trunc" => Ok(Self::Trunc),
            _ => Err(TexError::NotFound(format!("wrap mode {s}"))),
        }
    }
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Black => "black",
            Self::Periodic => "periodic",
            Self::Clamp => "clamp",
            Self::Trunc => "trunc",
        };
        write!(f, "{s}")
    }
}

/// What kind of map a texture file holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Plain 2D texture.
    Plain,
    /// Lat-long environment map.
    LatLongEnvironment,
    /// Cube face environment map.
    CubeEnvironment,
    /// Shadow depth map.
    Shadow,
    /// Occlusion map (one shadow map per subimage).
    Occlusion,
}

impl FromStr for TextureFormat {
    type Err = TexError;

    /// Parse a texture format name.
    ///
    /// * `s` - Format name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "latlong" | "LatLong Environment" => Ok(Self::LatLongEnvironment),
            "cubeface" | "CubeFace Environment" => Ok(Self::CubeEnvironment),
            "shadow" | "Shadow" => Ok(Self::Shadow),
            "occlusion" | "Occlusion" => Ok(Self::Occlusion),
            _ => Err(TexError::NotFound(format!("texture format {s}"))),
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plain => "plain",
            Self::LatLongEnvironment => "latlong",
            Self::CubeEnvironment => "cubeface",
            Self::Shadow => "shadow",
            Self::Occlusion => "occlusion",
        };
        write!(f, "{s}")
    }
}

/// Value of a header attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// Free text.
    Text(String),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(Float),
    /// 4x4 transform.
    Matrix(Matrix4x4),
    /// Wrap modes for s and t.
    WrapModes(WrapMode, WrapMode),
    /// Tile width and height.
    TileSize(usize, usize),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Matrix(m) => write!(f, "{:?}", m.m),
            Self::WrapModes(s, t) => write!(f, "{s} {t}"),
            Self::TileSize(w, h) => write!(f, "{w} x {h}"),
        }
    }
}

/// Header of one texture subimage.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureFileHeader {
    /// Width in pixels.
    pub width: usize,

    /// Height in pixels.
    pub height: usize,

    /// Pixel layout.
    pub channels: ChannelList,

    /// Keyed attributes.
    attributes: BTreeMap<String, AttrValue>,
}

impl TextureFileHeader {
    /// Creates a header with no attributes.
    ///
    /// * `width`    - Width in pixels.
    /// * `height`   - Height in pixels.
    /// * `channels` - Pixel layout.
    pub fn new(width: usize, height: usize, channels: ChannelList) -> Self {
        Self {
            width,
            height,
            channels,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute, replacing any previous value.
    ///
    /// * `key`   - Attribute key.
    /// * `value` - Attribute value.
    pub fn set(&mut self, key: &str, value: AttrValue) {
        self.attributes.insert(key.to_string(), value);
    }

    /// Sets an attribute and returns the header.
    ///
    /// * `key`   - Attribute key.
    /// * `value` - Attribute value.
    pub fn with(mut self, key: &str, value: AttrValue) -> Self {
        self.set(key, value);
        self
    }

    /// Returns an attribute.
    ///
    /// * `key` - Attribute key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// Returns an iterator over all attributes in key order.
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.attributes.iter()
    }

    /// Returns the s and t wrap modes, if recorded.
    pub fn wrap_modes(&self) -> Option<(WrapMode, WrapMode)> {
        match self.get(ATTR_WRAP_MODES) {
            Some(AttrValue::WrapModes(s, t)) => Some((*s, *t)),
            _ => None,
        }
    }

    /// Returns the tile size; untiled images are a single tile.
    pub fn tile_size(&self) -> (usize, usize) {
        match self.get(ATTR_TILE_SIZE) {
            Some(AttrValue::TileSize(w, h)) if *w > 0 && *h > 0 => (*w, *h),
            _ => (self.width.max(1), self.height.max(1)),
        }
    }

    /// Returns the texture format; files without one are plain textures.
    pub fn texture_format(&self) -> TextureFormat {
        match self.get(ATTR_TEXTURE_FORMAT) {
            Some(AttrValue::Text(s)) => s.parse().unwrap_or(TextureFormat::Plain),
            _ => TextureFormat::Plain,
        }
    }

    /// Returns a matrix attribute.
    ///
    /// * `key` - Attribute key.
    pub fn matrix(&self, key: &str) -> Option<Matrix4x4> {
        match self.get(key) {
            Some(AttrValue::Matrix(m)) => Some(*m),
            _ => None,
        }
    }

    /// Returns a text attribute.
    ///
    /// * `key` - Attribute key.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(AttrValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for TextureFileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "resolution: {} x {}", self.width, self.height)?;
        writeln!(f, "channels:   {}", self.channels)?;
        for (key, value) in self.attributes.iter() {
            writeln!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}
