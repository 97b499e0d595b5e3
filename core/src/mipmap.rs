//! MIPMap
//!
//! Generates the image pyramid stored as successive subimages of plain and
//! environment texture files.

use crate::cached_filter::*;
use crate::error::*;
use crate::filter::*;
use crate::math::*;
use crate::texfile::*;

/// One pyramid level as normalized floats.
#[derive(Clone, Debug, PartialEq)]
pub struct MipLevel {
    /// Width in pixels.
    pub width: usize,

    /// Height in pixels.
    pub height: usize,

    /// Number of channels per pixel.
    pub channels: usize,

    /// Row-major, interleaved values.
    pub data: Vec<Float>,
}

impl MipLevel {
    /// Creates a new level.
    ///
    /// * `width`    - Width in pixels.
    /// * `height`   - Height in pixels.
    /// * `channels` - Number of channels per pixel.
    /// * `data`     - `width * height * channels` values.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<Float>) -> TexResult<Self> {
        if width == 0 || height == 0 || channels == 0 || data.len() != width * height * channels {
            return Err(TexError::BadParams(format!(
                "{} values for a {width} x {height} x {channels} level",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Returns one channel of a pixel.
    ///
    /// * `x` - Column.
    /// * `y` - Row.
    /// * `c` - Channel.
    #[inline]
    pub fn value(&self, x: usize, y: usize, c: usize) -> Float {
        self.data[(y * self.width + x) * self.channels + c]
    }
}

/// Maps an out-of-range raster index into the image.
///
/// * `i`    - Raster index.
/// * `n`    - Image size along the axis.
/// * `wrap` - Wrap mode; only periodic wraps, everything else clamps.
#[inline]
fn remap(i: i64, n: usize, wrap: WrapMode) -> usize {
    let n = n as i64;
    match wrap {
        WrapMode::Periodic => rem(i, n) as usize,
        _ => clamp(i, 0, n - 1) as usize,
    }
}

/// Returns the source raster position a downsampling kernel is placed at
/// for destination sample `i`: the centre of source sample `2i` for odd
/// kernels, the boundary after it for even ones.
///
/// * `i`            - Destination index.
/// * `include_zero` - Whether the kernel is odd.
#[inline]
fn kernel_centre(i: usize, include_zero: bool) -> Float {
    if include_zero {
        2.0 * i as Float + 0.5
    } else {
        2.0 * i as Float + 1.0
    }
}

/// Halves the resolution of a level.
///
/// * `level`        - Source level.
/// * `filter`       - Reconstruction filter.
/// * `filter_width` - Filter width in destination pixels.
/// * `wrap`         - Wrap modes for s and t.
pub fn downsample(
    level: &MipLevel,
    filter: &dyn Filter,
    filter_width: Float,
    wrap: (WrapMode, WrapMode),
) -> MipLevel {
    let width = std::cmp::max(1, (level.width + 1) / 2);
    let height = std::cmp::max(1, (level.height + 1) / 2);
    let odd_x = level.width % 2 == 1;
    let odd_y = level.height % 2 == 1;

    // Source pixels are half a destination pixel wide.
    let scale = 0.5;
    let kernel = CachedFilter::new(
        filter,
        filter_width / scale,
        filter_width / scale,
        odd_x,
        odd_y,
        scale,
    );

    let nc = level.channels;
    let mut data = vec![0.0; width * height * nc];
    for y in 0..height {
        for x in 0..width {
            let support = kernel.support_at(kernel_centre(x, odd_x), kernel_centre(y, odd_y));
            let (sx0, sy0) = (support.sx.start, support.sy.start);
            let out = &mut data[(y * width + x) * nc..(y * width + x + 1) * nc];
            for j in 0..kernel.height() {
                let sy = remap(sy0 + j as i64, level.height, wrap.1);
                for i in 0..kernel.width() {
                    let w = kernel.weight(i, j);
                    if w == 0.0 {
                        continue;
                    }
                    let sx = remap(sx0 + i as i64, level.width, wrap.0);
                    for (c, o) in out.iter_mut().enumerate() {
                        *o += w * level.value(sx, sy, c);
                    }
                }
            }
        }
    }

    MipLevel {
        width,
        height,
        channels: nc,
        data,
    }
}

/// Builds the full pyramid down to 1x1; the first entry is the input level.
///
/// * `level`        - Full resolution level.
/// * `filter`       - Reconstruction filter.
/// * `filter_width` - Filter width in destination pixels.
/// * `wrap`         - Wrap modes for s and t.
pub fn build_mip_levels(
    level: MipLevel,
    filter: &dyn Filter,
    filter_width: Float,
    wrap: (WrapMode, WrapMode),
) -> Vec<MipLevel> {
    let n_levels = 1 + log2_floor(std::cmp::max(level.width, level.height) as Float);
    let mut levels = Vec::with_capacity(n_levels);
    levels.push(level);
    while let Some(last) = levels.last() {
        if last.width == 1 && last.height == 1 {
            break;
        }
        let next = downsample(last, filter, filter_width, wrap);
        levels.push(next);
    }
    levels
}

/// Builds a pyramid and encodes each level in the header's channel storage
/// types, ready to be used as file subimages.
///
/// * `path`         - File path for error messages.
/// * `header`       - Header of the full resolution image.
/// * `values`       - Normalized values of the full resolution image.
/// * `filter`       - Reconstruction filter.
/// * `filter_width` - Filter width in destination pixels.
pub fn build_mip_subimages(
    path: &str,
    header: &TextureFileHeader,
    values: Vec<Float>,
    filter: &dyn Filter,
    filter_width: Float,
) -> TexResult<Vec<(TextureFileHeader, Vec<u8>)>> {
    let base = MipLevel::new(header.width, header.height, header.channels.len(), values)?;
    let wrap = header
        .wrap_modes()
        .unwrap_or((WrapMode::Clamp, WrapMode::Clamp));
    let levels = build_mip_levels(base, filter, filter_width, wrap);
    info!(
        "Generated {} mip levels for {path} ({} x {})",
        levels.len(),
        header.width,
        header.height
    );

    levels
        .into_iter()
        .map(|level| {
            let mut level_header = header.clone();
            level_header.width = level.width;
            level_header.height = level.height;
            let data = encode_floats(path, &level_header, &level.data)?;
            Ok((level_header, data))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::*;
    use float_cmp::*;

    struct BoxFilter;

    impl Filter for BoxFilter {
        fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float {
            if x.abs() <= 0.5 * x_width && y.abs() <= 0.5 * y_width {
                1.0
            } else {
                0.0
            }
        }
    }

    fn level(w: usize, h: usize, f: impl Fn(usize, usize) -> Float) -> MipLevel {
        let data = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        MipLevel::new(w, h, 1, data).unwrap()
    }

    #[test]
    fn level_sizes() {
        let levels = build_mip_levels(level(5, 3, |_, _| 0.0), &BoxFilter, 2.0, (WrapMode::Clamp, WrapMode::Clamp));
        let sizes: Vec<(usize, usize)> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(5, 3), (3, 2), (2, 1), (1, 1)]);

        let levels = build_mip_levels(level(4, 4, |_, _| 0.0), &BoxFilter, 2.0, (WrapMode::Clamp, WrapMode::Clamp));
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn constant_image_stays_constant() {
        let levels = build_mip_levels(level(7, 5, |_, _| 0.25), &BoxFilter, 2.0, (WrapMode::Clamp, WrapMode::Clamp));
        for l in levels.iter() {
            for v in l.data.iter() {
                assert!(approx_eq!(Float, *v, 0.25, epsilon = 1e-5));
            }
        }
    }

    #[test]
    fn periodic_checkerboard_averages() {
        let src = level(4, 4, |x, y| ((x + y) % 2) as Float);
        let half = downsample(&src, &BoxFilter, 2.0, (WrapMode::Periodic, WrapMode::Periodic));
        assert_eq!((half.width, half.height), (2, 2));
        for v in half.data.iter() {
            assert!(approx_eq!(Float, *v, 0.5, epsilon = 1e-5));
        }
    }

    #[test]
    fn subimages_use_storage_type() {
        let header = TextureFileHeader::new(2, 2, ChannelList::uniform(&["y"], ChannelType::Uint8))
            .with(ATTR_WRAP_MODES, AttrValue::WrapModes(WrapMode::Clamp, WrapMode::Clamp));
        let subimages = build_mip_subimages("m", &header, vec![0.0, 1.0, 1.0, 0.0], &BoxFilter, 2.0).unwrap();
        assert_eq!(subimages.len(), 2);
        let (h, data) = &subimages[1];
        assert_eq!((h.width, h.height), (1, 1));
        assert_eq!(data.len(), 1);
        assert_eq!(data[0], 128);
    }
}
