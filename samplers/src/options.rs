//! Sample Options

use texcore::error::*;
use texcore::filter::*;
use texcore::math::Float;
use texcore::texfile::*;

/// Options for plain texture and environment lookups.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureSampleOptions {
    /// Wrap mode in s.
    pub s_wrap: WrapMode,

    /// Wrap mode in t.
    pub t_wrap: WrapMode,

    /// Extra filter width in s as a fraction of the texture width.
    pub s_blur: Float,

    /// Extra filter width in t as a fraction of the texture height.
    pub t_blur: Float,

    /// Multiplier for the footprint width in s.
    pub s_width: Float,

    /// Multiplier for the footprint width in t.
    pub t_width: Float,

    /// Filter function.
    pub filter_type: FilterType,

    /// Value written for channels the texture doesn't have and when the
    /// filter has no support inside the image.
    pub fill: Float,

    /// First channel to read.
    pub start_channel: usize,

    /// Number of channels to write.
    pub num_channels: usize,
}

impl Default for TextureSampleOptions {
    fn default() -> Self {
        Self {
            s_wrap: WrapMode::Black,
            t_wrap: WrapMode::Black,
            s_blur: 0.0,
            t_blur: 0.0,
            s_width: 1.0,
            t_width: 1.0,
            filter_type: FilterType::Gaussian,
            fill: 0.0,
            start_channel: 0,
            num_channels: 1,
        }
    }
}

impl TextureSampleOptions {
    /// Returns options using the wrap modes and channel count recorded in a
    /// texture header.
    ///
    /// * `header` - The header.
    pub fn from_header(header: &TextureFileHeader) -> Self {
        let (s_wrap, t_wrap) = header
            .wrap_modes()
            .unwrap_or((WrapMode::Black, WrapMode::Black));
        Self {
            s_wrap,
            t_wrap,
            num_channels: header.channels.len().max(1),
            ..Default::default()
        }
    }

    /// Checks the options against an output buffer.
    ///
    /// * `out` - Output buffer.
    pub fn validate(&self, out: &[Float]) -> TexResult<()> {
        if self.num_channels == 0 {
            return Err(TexError::BadParams("no channels requested".to_string()));
        }
        if out.len() < self.num_channels {
            return Err(TexError::BadParams(format!(
                "output holds {} values, {} channels requested",
                out.len(),
                self.num_channels
            )));
        }
        for (name, v) in [
            ("sblur", self.s_blur),
            ("tblur", self.t_blur),
            ("swidth", self.s_width),
            ("twidth", self.t_width),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(TexError::BadParams(format!("{name} = {v}")));
            }
        }
        Ok(())
    }
}

/// Depth test used by shadow lookups.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DepthCompare {
    /// In shadow when the stored depth is less than the biased query depth.
    Less,
    /// In shadow when the stored depth is less than or equal to the biased
    /// query depth.
    LessEqual,
}

impl DepthCompare {
    /// Returns true if a point at `depth` is hidden by the `stored` depth.
    ///
    /// * `stored` - Depth recorded in the map.
    /// * `depth`  - Biased depth of the query point.
    #[inline]
    pub fn occluded(&self, stored: Float, depth: Float) -> bool {
        match self {
            Self::Less => stored < depth,
            Self::LessEqual => stored <= depth,
        }
    }
}

/// Options for shadow lookups.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowSampleOptions {
    /// Filter, blur, width and output channel options.
    pub base: TextureSampleOptions,

    /// Depth offset subtracted from the query depth.
    pub bias: Float,

    /// Number of depth comparisons per lookup.
    pub num_samples: usize,

    /// Depth test.
    pub depth_compare: DepthCompare,
}

impl Default for ShadowSampleOptions {
    fn default() -> Self {
        Self {
            base: TextureSampleOptions {
                filter_type: FilterType::Box,
                ..Default::default()
            },
            bias: 0.01,
            num_samples: 16,
            depth_compare: DepthCompare::Less,
        }
    }
}

impl ShadowSampleOptions {
    /// Checks the options against an output buffer.
    ///
    /// * `out` - Output buffer.
    pub fn validate(&self, out: &[Float]) -> TexResult<()> {
        self.base.validate(out)?;
        if !self.bias.is_finite() {
            return Err(TexError::BadParams(format!("bias = {}", self.bias)));
        }
        if self.num_samples == 0 {
            return Err(TexError::BadParams("no shadow samples requested".to_string()));
        }
        Ok(())
    }
}

/// Options for occlusion lookups.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OcclusionSampleOptions {
    /// Options for each shadow map lookup.
    pub shadow: ShadowSampleOptions,

    /// Maximum number of maps, best facing first, combined per lookup.
    pub num_maps: usize,
}

impl Default for OcclusionSampleOptions {
    fn default() -> Self {
        Self {
            shadow: ShadowSampleOptions::default(),
            num_maps: usize::MAX,
        }
    }
}

impl OcclusionSampleOptions {
    /// Checks the options against an output buffer.
    ///
    /// * `out` - Output buffer.
    pub fn validate(&self, out: &[Float]) -> TexResult<()> {
        self.shadow.validate(out)
    }
}
