//! Dummy Samplers
//!
//! Stand-ins cached in place of samplers whose files could not be opened.
//! Plain and environment dummies return 0 for every channel except the alpha
//! slot (absolute channel 3), which is 1. Shadow and occlusion dummies
//! report nothing occluded.

use crate::environment::*;
use crate::footprint::*;
use crate::occlusion::*;
use crate::options::*;
use crate::shadow::*;
use crate::texture::*;
use texcore::error::*;
use texcore::geometry::*;
use texcore::math::Float;

/// Absolute channel index that reads as opaque.
const ALPHA_CHANNEL: usize = 3;

/// Writes the neutral colour value for each requested channel.
///
/// * `options` - Sample options.
/// * `out`     - Output buffer.
fn write_neutral(options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
    options.validate(out)?;
    for (i, o) in out[..options.num_channels].iter_mut().enumerate() {
        *o = if options.start_channel + i == ALPHA_CHANNEL {
            1.0
        } else {
            0.0
        };
    }
    Ok(())
}

/// Plain texture that is transparent black with opaque alpha.
#[derive(Default)]
pub struct DummyTextureSampler;

impl TextureSampler for DummyTextureSampler {
    fn sample_pllgram(&self, _pllgram: &SamplePllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        write_neutral(options, out)
    }

    fn default_sample_options(&self) -> TextureSampleOptions {
        TextureSampleOptions::default()
    }
}

/// Environment that is black with opaque alpha.
#[derive(Default)]
pub struct DummyEnvironmentSampler;

impl EnvironmentSampler for DummyEnvironmentSampler {
    fn sample_pllgram(&self, _pllgram: &Sample3dPllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        write_neutral(options, out)
    }

    fn default_sample_options(&self) -> TextureSampleOptions {
        TextureSampleOptions::default()
    }
}

/// Shadow map that never shadows.
#[derive(Default)]
pub struct DummyShadowSampler;

impl ShadowSampler for DummyShadowSampler {
    fn sample_pllgram(&self, _pllgram: &Sample3dPllgram, options: &ShadowSampleOptions, out: &mut [Float]) -> TexResult<()> {
        options.validate(out)?;
        out[..options.base.num_channels].iter_mut().for_each(|o| *o = 0.0);
        Ok(())
    }

    fn default_sample_options(&self) -> ShadowSampleOptions {
        ShadowSampleOptions::default()
    }

    fn set_curr_to_world(&self, _curr_to_world: &Matrix4x4) {}
}

/// Occlusion map that never occludes.
#[derive(Default)]
pub struct DummyOcclusionSampler;

impl OcclusionSampler for DummyOcclusionSampler {
    fn sample_pllgram(
        &self,
        _pllgram: &Sample3dPllgram,
        _normal: &Vector3f,
        options: &OcclusionSampleOptions,
        out: &mut [Float],
    ) -> TexResult<()> {
        options.validate(out)?;
        out[..options.shadow.base.num_channels]
            .iter_mut()
            .for_each(|o| *o = 0.0);
        Ok(())
    }

    fn default_sample_options(&self) -> OcclusionSampleOptions {
        OcclusionSampleOptions::default()
    }

    fn set_curr_to_world(&self, _curr_to_world: &Matrix4x4) {}
}
