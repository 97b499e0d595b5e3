//! Plain Texture Sampler

use crate::filtering::*;
use crate::footprint::*;
use crate::options::*;
use std::sync::Arc;
use texcore::error::*;
use texcore::math::Float;
use texcore::memory::*;
use texcore::texfile::*;

/// Filtered lookups into a 2D texture.
pub trait TextureSampler: Send + Sync {
    /// Filters the texture over a parallelogram in `[0, 1]^2` texture space
    /// and writes `options.num_channels` values into `out`.
    ///
    /// * `pllgram` - The footprint.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_pllgram(&self, pllgram: &SamplePllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()>;

    /// Filters the texture over a quadrilateral. The default implementation
    /// filters over the best fitting parallelogram.
    ///
    /// * `quad`    - The footprint.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_quad(&self, quad: &SampleQuad, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        self.sample_pllgram(&SamplePllgram::from(quad), options, out)
    }

    /// Returns options matching the texture's wrap modes and channels.
    fn default_sample_options(&self) -> TextureSampleOptions;
}

/// Atomic reference counted `TextureSampler`.
pub type ArcTextureSampler = Arc<dyn TextureSampler>;

/// Samples a mipmapped plain texture.
pub struct PlainTextureSampler {
    /// Tiles and kernels.
    core: FilterCore,

    /// Options derived from the file header.
    default_options: TextureSampleOptions,
}

impl PlainTextureSampler {
    /// Creates a sampler for a texture file.
    ///
    /// * `file`   - The texture file.
    /// * `sentry` - Memory sentry for tile accounting.
    pub fn create(file: ArcTextureFile, sentry: Option<&Arc<MemorySentry>>) -> TexResult<Self> {
        let default_options = TextureSampleOptions::from_header(file.header(0));
        let core = FilterCore::new(file, sentry)?;
        Ok(Self {
            core,
            default_options,
        })
    }

    /// Returns the filtering core.
    pub fn core(&self) -> &FilterCore {
        &self.core
    }
}

impl TextureSampler for PlainTextureSampler {
    fn sample_pllgram(&self, pllgram: &SamplePllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        self.core
            .sample_pllgram((1, 1), (0, 0), self.core.num_levels(), pllgram, options, out)
    }

    fn default_sample_options(&self) -> TextureSampleOptions {
        self.default_options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use texcore::channel::*;
    use texcore::filter::*;
    use texcore::geometry::*;

    fn sampler(w: usize, h: usize, names: &[&str], values: &[Float]) -> PlainTextureSampler {
        let header = TextureFileHeader::new(w, h, ChannelList::uniform(names, ChannelType::Float32))
            .with(ATTR_WRAP_MODES, AttrValue::WrapModes(WrapMode::Clamp, WrapMode::Clamp));
        let file = MemoryTextureFile::from_floats("plain", header, values).unwrap();
        PlainTextureSampler::create(Arc::new(file), None).unwrap()
    }

    #[test]
    fn box_lookup_on_first_pixel() {
        let s = sampler(2, 2, &["y"], &[1.0, 2.0, 3.0, 4.0]);
        let opts = TextureSampleOptions {
            filter_type: FilterType::Box,
            ..s.default_sample_options()
        };
        let mut out = [0.0];
        let p = SamplePllgram::from_extents(Point2f::new(0.25, 0.25), 0.0, 0.0);
        s.sample_pllgram(&p, &opts, &mut out).unwrap();
        assert_eq!(out[0], 1.0);

        let p = SamplePllgram::from_extents(Point2f::new(0.75, 0.75), 0.5, 0.5);
        s.sample_pllgram(&p, &opts, &mut out).unwrap();
        assert_eq!(out[0], 4.0);
    }

    #[test]
    fn quad_defaults_to_pllgram() {
        let s = sampler(4, 4, &["y"], &(0..16).map(|v| v as Float).collect::<Vec<_>>());
        let opts = s.default_sample_options();
        let q = SampleQuad::new(
            Point2f::new(0.25, 0.25),
            Point2f::new(0.5, 0.25),
            Point2f::new(0.25, 0.5),
            Point2f::new(0.5, 0.5),
        );
        let mut a = [0.0];
        let mut b = [0.0];
        s.sample_quad(&q, &opts, &mut a).unwrap();
        s.sample_pllgram(&SamplePllgram::from(&q), &opts, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn channel_window() {
        let s = sampler(1, 1, &["r", "g", "b"], &[0.1, 0.2, 0.3]);
        let opts = TextureSampleOptions {
            start_channel: 1,
            num_channels: 3,
            fill: 9.0,
            ..s.default_sample_options()
        };
        let mut out = [0.0; 3];
        let p = SamplePllgram::from_extents(Point2f::new(0.5, 0.5), 0.0, 0.0);
        s.sample_pllgram(&p, &opts, &mut out).unwrap();
        assert!(approx_eq!(Float, out[0], 0.2, epsilon = 1e-6));
        assert!(approx_eq!(Float, out[1], 0.3, epsilon = 1e-6));
        assert_eq!(out[2], 9.0);
    }

    #[test]
    fn bad_params_are_reported() {
        let s = sampler(1, 1, &["r", "g", "b"], &[0.1, 0.2, 0.3]);
        let opts = s.default_sample_options();
        let p = SamplePllgram::default();
        let mut out = [0.0; 2];
        assert!(matches!(
            s.sample_pllgram(&p, &opts, &mut out),
            Err(TexError::BadParams(_))
        ));
    }
}
