//! Occlusion Sampler
//!
//! Combines a set of shadow maps rendered from around a scene into an
//! ambient occlusion estimate for a surface orientation.

use crate::footprint::*;
use crate::options::*;
use crate::shadow::*;
use arc_swap::ArcSwap;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::sync::Arc;
use texcore::error::*;
use texcore::geometry::*;
use texcore::math::Float;
use texcore::memory::*;
use texcore::texfile::*;

/// Occlusion lookups.
pub trait OcclusionSampler: Send + Sync {
    /// Writes the fraction of light occluded over a footprint (0 unoccluded)
    /// to each of the requested outputs.
    ///
    /// * `pllgram` - Positions in current space.
    /// * `normal`  - Surface normal in current space.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_pllgram(
        &self,
        pllgram: &Sample3dPllgram,
        normal: &Vector3f,
        options: &OcclusionSampleOptions,
        out: &mut [Float],
    ) -> TexResult<()>;

    /// Occlusion lookup over a quadrilateral. The default implementation uses
    /// the best fitting parallelogram.
    ///
    /// * `quad`    - Positions in current space.
    /// * `normal`  - Surface normal in current space.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_quad(
        &self,
        quad: &Sample3dQuad,
        normal: &Vector3f,
        options: &OcclusionSampleOptions,
        out: &mut [Float],
    ) -> TexResult<()> {
        self.sample_pllgram(&Sample3dPllgram::from(quad), normal, options, out)
    }

    /// Returns default occlusion options.
    fn default_sample_options(&self) -> OcclusionSampleOptions;

    /// Sets the current to world transform used to place lookups.
    ///
    /// * `curr_to_world` - The transform.
    fn set_curr_to_world(&self, curr_to_world: &Matrix4x4);
}

/// Atomic reference counted `OcclusionSampler`.
pub type ArcOcclusionSampler = Arc<dyn OcclusionSampler>;

/// Samples an occlusion map: one shadow map per subimage.
pub struct OcclusionMapSampler {
    /// The shadow maps.
    maps: Vec<ShadowMap>,

    /// Current to world transform, for normals.
    curr_to_world: ArcSwap<Matrix4x4>,
}

impl OcclusionMapSampler {
    /// Creates a sampler with every subimage of the file as a shadow map.
    ///
    /// * `file`          - The texture file.
    /// * `sentry`        - Memory sentry for tile accounting.
    /// * `curr_to_world` - Initial current to world transform.
    pub fn create(file: ArcTextureFile, sentry: Option<&Arc<MemorySentry>>, curr_to_world: &Matrix4x4) -> TexResult<Self> {
        if file.num_subimages() == 0 {
            return Err(TexError::invalid_file(file.path(), "no shadow maps"));
        }
        let maps = (0..file.num_subimages())
            .map(|i| ShadowMap::new(file.clone(), i, sentry, curr_to_world))
            .collect::<TexResult<Vec<_>>>()?;
        debug!("Occlusion map {} has {} views", file.path(), maps.len());
        Ok(Self {
            maps,
            curr_to_world: ArcSwap::from_pointee(*curr_to_world),
        })
    }

    /// Returns the number of shadow maps.
    pub fn num_maps(&self) -> usize {
        self.maps.len()
    }
}

impl OcclusionSampler for OcclusionMapSampler {
    fn sample_pllgram(
        &self,
        pllgram: &Sample3dPllgram,
        normal: &Vector3f,
        options: &OcclusionSampleOptions,
        out: &mut [Float],
    ) -> TexResult<()> {
        options.validate(out)?;
        let n = self.curr_to_world.load().transform_normal(normal);
        if n.length() == 0.0 {
            return Err(TexError::BadParams("zero length normal".to_string()));
        }
        let n = n.normalize();

        // Maps seeing the front of the surface, best facing first.
        let mut weighted: Vec<(Float, &ShadowMap)> = self
            .maps
            .iter()
            .map(|m| (-n.dot(&m.view_dir()), m))
            .filter(|(w, _)| *w > 0.0)
            .collect();
        weighted.sort_by_key(|(w, _)| Reverse(OrderedFloat(*w)));
        weighted.truncate(options.num_maps);

        let (mut total, mut occluded) = (0.0, 0.0);
        for (w, map) in weighted.iter() {
            occluded += w * map.shadow_fraction(pllgram, &options.shadow);
            total += w;
        }
        let result = if total > 0.0 { occluded / total } else { 0.0 };
        out[..options.shadow.base.num_channels]
            .iter_mut()
            .for_each(|o| *o = result);
        Ok(())
    }

    fn default_sample_options(&self) -> OcclusionSampleOptions {
        OcclusionSampleOptions::default()
    }

    fn set_curr_to_world(&self, curr_to_world: &Matrix4x4) {
        self.curr_to_world.store(Arc::new(*curr_to_world));
        for map in self.maps.iter() {
            map.set_curr_to_world(curr_to_world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    /// Swaps the x and z axes.
    fn swap_xz() -> Matrix4x4 {
        Matrix4x4::new([
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Two views: one looking down +z that sees everything occluded, one
    /// looking down +x that sees nothing.
    fn two_view_map() -> OcclusionMapSampler {
        let a = shadow_map_header(4, 4, Matrix4x4::default(), Matrix4x4::default());
        let b = shadow_map_header(4, 4, swap_xz(), swap_xz());
        let file = MemoryTextureFile::from_float_subimages("ao", vec![(a, vec![0.0; 16]), (b, vec![100.0; 16])]).unwrap();
        OcclusionMapSampler::create(Arc::new(file), None, &Matrix4x4::default()).unwrap()
    }

    fn lookup(s: &OcclusionMapSampler, normal: Vector3f, num_maps: usize) -> Float {
        let opts = OcclusionSampleOptions {
            num_maps,
            ..s.default_sample_options()
        };
        let p = Sample3dPllgram::point(Vector3f::new(0.0, 0.0, 0.5));
        let mut out = [-1.0];
        s.sample_pllgram(&p, &normal, &opts, &mut out).unwrap();
        out[0]
    }

    #[test]
    fn views_facing_the_normal() {
        let s = two_view_map();
        assert_eq!(s.num_maps(), 2);
        assert_eq!(lookup(&s, Vector3f::new(0.0, 0.0, -1.0), usize::MAX), 1.0);
        assert_eq!(lookup(&s, Vector3f::new(-1.0, 0.0, 0.0), usize::MAX), 0.0);
        // Neither view sees the front of the surface.
        assert_eq!(lookup(&s, Vector3f::new(0.0, 1.0, 0.0), usize::MAX), 0.0);
    }

    #[test]
    fn weighted_mean_of_views() {
        let s = two_view_map();
        let n = Vector3f::new(-1.0, 0.0, -2.0);
        assert!(approx_eq!(Float, lookup(&s, n, usize::MAX), 2.0 / 3.0, epsilon = 1e-5));
        assert_eq!(lookup(&s, n, 1), 1.0);
    }

    #[test]
    fn normals_follow_curr_to_world() {
        let s = two_view_map();
        s.set_curr_to_world(&swap_xz());
        // (0, 0, -1) in current space is (-1, 0, 0) in world space, so only
        // the +x view counts.
        assert_eq!(lookup(&s, Vector3f::new(0.0, 0.0, -1.0), usize::MAX), 0.0);
    }

    #[test]
    fn zero_normal_is_bad_params() {
        let s = two_view_map();
        let opts = s.default_sample_options();
        let mut out = [0.0];
        let p = Sample3dPllgram::point(Vector3f::new(0.0, 0.0, 0.5));
        assert!(s.sample_pllgram(&p, &Vector3f::default(), &opts, &mut out).is_err());
    }
}
