//! Channel Model
//!
//! Describes the semantics of the channels in a pixel and the byte layout of
//! multi-channel pixels. Channels are stored interleaved in the order they
//! appear in the `ChannelList`.

use crate::error::*;
use crate::math::Float;
use std::fmt;
use std::ops::Index;

mod sample_vector;

// Re-export
pub use sample_vector::*;

/// Numeric storage type of a channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// 32-bit IEEE float.
    Float32,
    /// 16-bit IEEE half float.
    Float16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unknown or mixed type.
    Unknown,
}

impl ChannelType {
    /// Returns the number of bytes used to store one sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Float32 | Self::Int32 | Self::Uint32 => 4,
            Self::Float16 | Self::Int16 | Self::Uint16 => 2,
            Self::Int8 | Self::Uint8 => 1,
            Self::Unknown => 0,
        }
    }

    /// Returns true for floating point storage types.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float16)
    }

    /// Reads one sample from raw bytes and converts it to a normalized
    /// floating point value.
    ///
    /// * `bytes` - Raw bytes starting at the sample.
    #[inline]
    pub fn read_normalized(&self, bytes: &[u8]) -> Float {
        match self {
            Self::Float32 => f32::read_raw(bytes).to_normalized(),
            Self::Float16 => half::f16::read_raw(bytes).to_normalized(),
            Self::Int32 => i32::read_raw(bytes).to_normalized(),
            Self::Uint32 => u32::read_raw(bytes).to_normalized(),
            Self::Int16 => i16::read_raw(bytes).to_normalized(),
            Self::Uint16 => u16::read_raw(bytes).to_normalized(),
            Self::Int8 => i8::read_raw(bytes).to_normalized(),
            Self::Uint8 => u8::read_raw(bytes).to_normalized(),
            Self::Unknown => 0.0,
        }
    }

    /// Converts a normalized floating point value to this storage type and
    /// writes it into raw bytes.
    ///
    /// * `v`     - The value.
    /// * `bytes` - Destination bytes starting at the sample.
    #[inline]
    pub fn write_normalized(&self, v: Float, bytes: &mut [u8]) {
        match self {
            Self::Float32 => f32::from_normalized(v).write_raw(bytes),
            Self::Float16 => half::f16::from_normalized(v).write_raw(bytes),
            Self::Int32 => i32::from_normalized(v).write_raw(bytes),
            Self::Uint32 => u32::from_normalized(v).write_raw(bytes),
            Self::Int16 => i16::from_normalized(v).write_raw(bytes),
            Self::Uint16 => u16::from_normalized(v).write_raw(bytes),
            Self::Int8 => i8::from_normalized(v).write_raw(bytes),
            Self::Uint8 => u8::from_normalized(v).write_raw(bytes),
            Self::Unknown => {}
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Float32 => "float32",
            Self::Float16 => "float16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Name and storage type of a single channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    /// Channel name.
    pub name: String,

    /// Storage type.
    pub channel_type: ChannelType,
}

impl Channel {
    /// Creates a new `Channel`.
    ///
    /// * `name`         - Channel name.
    /// * `channel_type` - Storage type.
    pub fn new(name: &str, channel_type: ChannelType) -> Self {
        Self {
            name: name.to_string(),
            channel_type,
        }
    }

    /// Returns the number of bytes used to store one sample of this channel.
    pub fn bytes_per_sample(&self) -> usize {
        self.channel_type.bytes_per_sample()
    }
}

/// Names that go first, in this order, after canonical reordering.
const CANONICAL_NAMES: [&str; 4] = ["r", "g", "b", "a"];

/// Ordered list of channels making up a pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelList {
    /// The channels in storage order.
    channels: Vec<Channel>,

    /// Byte offset of each channel within a pixel.
    offsets: Vec<usize>,

    /// Total bytes in a pixel.
    bytes_per_pixel: usize,
}

impl ChannelList {
    /// Creates an empty `ChannelList`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `ChannelList` where all channels share one storage type.
    ///
    /// * `names`        - Channel names in storage order.
    /// * `channel_type` - Storage type.
    pub fn uniform(names: &[&str], channel_type: ChannelType) -> Self {
        let mut list = Self::new();
        for name in names {
            list.add_channel(Channel::new(name, channel_type));
        }
        list
    }

    /// Appends a channel.
    ///
    /// * `channel` - The channel.
    pub fn add_channel(&mut self, channel: Channel) {
        self.offsets.push(self.bytes_per_pixel);
        self.bytes_per_pixel += channel.bytes_per_sample();
        self.channels.push(channel);
    }

    /// Appends `n` channels with placeholder names. Placeholder names are a
    /// '?' followed by the channel's position in the list.
    ///
    /// * `channel_type` - Storage type.
    /// * `n`            - Number of channels.
    pub fn add_unnamed_channels(&mut self, channel_type: ChannelType, n: usize) {
        for _ in 0..n {
            let name = placeholder_name(self.channels.len());
            self.add_channel(Channel::new(&name, channel_type));
        }
    }

    /// Replaces empty channel names with placeholder names.
    pub fn name_unnamed_channels(&mut self) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            if channel.name.is_empty() {
                channel.name = placeholder_name(i);
            }
        }
    }

    /// Returns the number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if there are no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Returns an iterator over the channels.
    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }

    /// Returns the byte offset of a channel within a pixel.
    ///
    /// * `i` - Channel index.
    pub fn channel_byte_offset(&self, i: usize) -> TexResult<usize> {
        self.offsets.get(i).copied().ok_or(TexError::Index {
            index: i,
            len: self.channels.len(),
        })
    }

    /// Returns the total number of bytes in a pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Returns the index of the channel with the given name.
    ///
    /// * `name` - Channel name.
    pub fn find_channel_index(&self, name: &str) -> TexResult<usize> {
        self.channels
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| TexError::NotFound(name.to_string()))
    }

    /// Returns the storage type shared by all channels, or `Unknown` if the
    /// types differ or the list is empty.
    pub fn shared_type(&self) -> ChannelType {
        match self.channels.first() {
            Some(first) if self.channels.iter().all(|c| c.channel_type == first.channel_type) => {
                first.channel_type
            }
            _ => ChannelType::Unknown,
        }
    }

    /// Returns the permutation that puts the channels into canonical order:
    /// r, g, b, a first (matched case-insensitively), then the others in
    /// their original relative order. `order[i]` is the old index of the
    /// channel that ends up at position `i`.
    pub fn canonical_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.channels.len());
        for canonical in CANONICAL_NAMES {
            if let Some(i) = self
                .channels
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(canonical))
            {
                order.push(i);
            }
        }
        for i in 0..self.channels.len() {
            if !order.contains(&i) {
                order.push(i);
            }
        }
        order
    }

    /// Reorders the channels into canonical order and returns the permutation
    /// applied (see `canonical_order()`). Byte offsets are recomputed.
    pub fn reorder_channels(&mut self) -> Vec<usize> {
        let order = self.canonical_order();
        let old = std::mem::take(&mut self.channels);
        self.offsets.clear();
        self.bytes_per_pixel = 0;
        for &i in order.iter() {
            self.add_channel(old[i].clone());
        }
        order
    }

    /// Reads channel `i` of a pixel as a normalized float.
    ///
    /// * `pixel` - Raw bytes of one pixel.
    /// * `i`     - Channel index; must be in range.
    #[inline]
    pub fn read_normalized(&self, pixel: &[u8], i: usize) -> Float {
        debug_assert!(i < self.channels.len());
        self.channels[i]
            .channel_type
            .read_normalized(&pixel[self.offsets[i]..])
    }

    /// Writes a normalized float into channel `i` of a pixel.
    ///
    /// * `pixel` - Raw bytes of one pixel.
    /// * `i`     - Channel index; must be in range.
    /// * `v`     - The value.
    #[inline]
    pub fn write_normalized(&self, pixel: &mut [u8], i: usize, v: Float) {
        debug_assert!(i < self.channels.len());
        self.channels[i]
            .channel_type
            .write_normalized(v, &mut pixel[self.offsets[i]..])
    }
}

impl Index<usize> for ChannelList {
    type Output = Channel;

    /// Index the channels.
    ///
    /// * `i` - Channel index.
    fn index(&self, i: usize) -> &Self::Output {
        &self.channels[i]
    }
}

impl fmt::Display for ChannelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .channels
            .iter()
            .map(|c| format!("{}:{}", c.name, c.channel_type))
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Returns a placeholder name for an unnamed channel.
///
/// * `i` - Channel position.
fn placeholder_name(i: usize) -> String {
    format!("?{i:02}")
}
