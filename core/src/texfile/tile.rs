//! Texture Tile

use crate::channel::*;
use crate::error::*;
use crate::math::Float;
use half::f16;

/// A rectangular block of raw pixels from one subimage. Pixels are stored
/// row-major, interleaved according to the channel list.
#[derive(Clone, Debug)]
pub struct TextureTile {
    /// Raster x of the top-left pixel.
    x0: usize,

    /// Raster y of the top-left pixel.
    y0: usize,

    /// Width in pixels.
    width: usize,

    /// Height in pixels.
    height: usize,

    /// Pixel layout.
    channels: ChannelList,

    /// Storage type shared by all channels (or `Unknown`).
    shared_type: ChannelType,

    /// Raw pixel bytes.
    data: Vec<u8>,
}

impl TextureTile {
    /// Creates a new tile.
    ///
    /// * `x0`       - Raster x of the top-left pixel.
    /// * `y0`       - Raster y of the top-left pixel.
    /// * `width`    - Width in pixels.
    /// * `height`   - Height in pixels.
    /// * `channels` - Pixel layout.
    /// * `data`     - Raw pixel bytes.
    pub fn new(
        x0: usize,
        y0: usize,
        width: usize,
        height: usize,
        channels: ChannelList,
        data: Vec<u8>,
    ) -> TexResult<Self> {
        let expected = width * height * channels.bytes_per_pixel();
        if data.len() != expected {
            return Err(TexError::BadParams(format!(
                "tile data is {} bytes, expected {expected}",
                data.len()
            )));
        }
        let shared_type = channels.shared_type();
        Ok(Self {
            x0,
            y0,
            width,
            height,
            channels,
            shared_type,
            data,
        })
    }

    /// Returns the raster position of the top-left pixel.
    pub fn origin(&self) -> (usize, usize) {
        (self.x0, self.y0)
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel layout.
    pub fn channels(&self) -> &ChannelList {
        &self.channels
    }

    /// Returns true if the tile holds the raster position.
    ///
    /// * `x` - Raster x.
    /// * `y` - Raster y.
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x0 + self.width && y >= self.y0 && y < self.y0 + self.height
    }

    /// Returns the raw bytes of a pixel.
    ///
    /// * `x` - Raster x; must be inside the tile.
    /// * `y` - Raster y; must be inside the tile.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        debug_assert!(self.contains(x, y));
        let bpp = self.channels.bytes_per_pixel();
        let offset = ((y - self.y0) * self.width + (x - self.x0)) * bpp;
        &self.data[offset..offset + bpp]
    }

    /// Returns one channel of a pixel as a normalized float.
    ///
    /// * `x`       - Raster x; must be inside the tile.
    /// * `y`       - Raster y; must be inside the tile.
    /// * `channel` - Channel index; must be in range.
    #[inline]
    pub fn value(&self, x: usize, y: usize, channel: usize) -> Float {
        self.channels.read_normalized(self.pixel(x, y), channel)
    }

    /// Reads consecutive channels of a pixel as normalized floats.
    /// `start_channel + out.len()` must not exceed the channel count.
    ///
    /// * `x`             - Raster x; must be inside the tile.
    /// * `y`             - Raster y; must be inside the tile.
    /// * `start_channel` - First channel to read.
    /// * `out`           - Destination.
    #[inline]
    pub fn read_pixel(&self, x: usize, y: usize, start_channel: usize, out: &mut [Float]) {
        let pixel = self.pixel(x, y);
        match self.shared_type {
            ChannelType::Uint8 => read_samples::<u8>(pixel, start_channel, out),
            ChannelType::Uint16 => read_samples::<u16>(pixel, start_channel, out),
            ChannelType::Float32 => read_samples::<f32>(pixel, start_channel, out),
            ChannelType::Float16 => read_samples::<f16>(pixel, start_channel, out),
            ChannelType::Int8 => read_samples::<i8>(pixel, start_channel, out),
            ChannelType::Int16 => read_samples::<i16>(pixel, start_channel, out),
            ChannelType::Int32 => read_samples::<i32>(pixel, start_channel, out),
            ChannelType::Uint32 => read_samples::<u32>(pixel, start_channel, out),
            ChannelType::Unknown => {
                for (i, o) in out.iter_mut().enumerate() {
                    *o = self.channels.read_normalized(pixel, start_channel + i);
                }
            }
        }
    }

    /// Returns the bytes held by the tile.
    pub fn memory_size(&self) -> usize {
        self.data.len() + std::mem::size_of::<Self>()
    }
}

/// Reads a run of samples sharing one storage type.
///
/// * `pixel` - Raw pixel bytes.
/// * `start` - First channel.
/// * `out`   - Destination.
#[inline(always)]
fn read_samples<T: SampleType>(pixel: &[u8], start: usize, out: &mut [Float]) {
    let samples = SampleVector::<T>::new(pixel);
    for (i, o) in out.iter_mut().enumerate() {
        *o = samples.get(start + i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_data_size() {
        let channels = ChannelList::uniform(&["r", "g"], ChannelType::Uint8);
        assert!(TextureTile::new(0, 0, 2, 2, channels, vec![0; 7]).is_err());
    }

    #[test]
    fn reads_pixels_at_absolute_positions() {
        let channels = ChannelList::uniform(&["r", "g"], ChannelType::Uint8);
        let data = vec![0, 255, 51, 102, 255, 0, 0, 0];
        let tile = TextureTile::new(4, 8, 2, 2, channels, data).unwrap();
        assert!(tile.contains(5, 9));
        assert!(!tile.contains(6, 9));
        assert_eq!(tile.value(4, 8, 1), 1.0);
        assert_eq!(tile.value(4, 9, 0), 1.0);

        let mut out = [0.0; 2];
        tile.read_pixel(5, 8, 0, &mut out);
        assert_eq!(out, [0.2, 0.4]);
    }

    #[test]
    fn mixed_channel_types() {
        let mut channels = ChannelList::new();
        channels.add_channel(Channel::new("y", ChannelType::Uint8));
        channels.add_channel(Channel::new("z", ChannelType::Float32));
        let mut data = vec![0u8; 5];
        channels.write_normalized(&mut data, 0, 1.0);
        channels.write_normalized(&mut data, 1, 7.5);
        let tile = TextureTile::new(0, 0, 1, 1, channels, data).unwrap();
        let mut out = [0.0; 2];
        tile.read_pixel(0, 0, 0, &mut out);
        assert_eq!(out, [1.0, 7.5]);
        assert!(tile.memory_size() >= 5);
    }
}
