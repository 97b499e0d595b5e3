//! Shadow Sampler
//!
//! Percentage closer filtering of depth maps rendered from a light.

use crate::footprint::*;
use crate::options::*;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use texcore::channel::*;
use texcore::error::*;
use texcore::geometry::*;
use texcore::math::*;
use texcore::memory::*;
use texcore::texfile::*;
use texcore::tile_array::*;

/// Shadow lookups in a depth map.
pub trait ShadowSampler: Send + Sync {
    /// Writes the fraction of a footprint that is in shadow (0 fully visible,
    /// 1 fully shadowed) to each of the `options.base.num_channels` outputs.
    ///
    /// * `pllgram` - Positions in current space.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_pllgram(&self, pllgram: &Sample3dPllgram, options: &ShadowSampleOptions, out: &mut [Float]) -> TexResult<()>;

    /// Shadow lookup over a quadrilateral. The default implementation uses
    /// the best fitting parallelogram.
    ///
    /// * `quad`    - Positions in current space.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_quad(&self, quad: &Sample3dQuad, options: &ShadowSampleOptions, out: &mut [Float]) -> TexResult<()> {
        self.sample_pllgram(&Sample3dPllgram::from(quad), options, out)
    }

    /// Returns default shadow options.
    fn default_sample_options(&self) -> ShadowSampleOptions;

    /// Sets the current to world transform used to place lookups.
    ///
    /// * `curr_to_world` - The transform.
    fn set_curr_to_world(&self, curr_to_world: &Matrix4x4);
}

/// Atomic reference counted `ShadowSampler`.
pub type ArcShadowSampler = Arc<dyn ShadowSampler>;

/// Transforms from current space into a shadow map's view, replaced
/// together.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewTransforms {
    /// Current to light camera space.
    pub curr_to_camera: Matrix4x4,

    /// Current to raster space of the map.
    pub curr_to_raster: Matrix4x4,
}

/// One depth map and the transforms of the view it was rendered from.
pub struct ShadowMap {
    /// Depth tiles.
    tiles: Arc<TileArray>,

    /// World to light camera space.
    world_to_camera: Matrix4x4,

    /// World to raster space of the map.
    world_to_raster: Matrix4x4,

    /// Current space transforms.
    transforms: ArcSwap<ViewTransforms>,

    /// Direction the light looks along, in world space.
    view_dir: Vector3f,

    /// Set after the first tile read failure has been logged.
    read_failed: AtomicBool,
}

impl ShadowMap {
    /// Creates a shadow map from one subimage. The header must carry the
    /// world to camera and world to screen matrices and channel 0 must hold
    /// 32-bit float depth.
    ///
    /// * `file`          - The texture file.
    /// * `subimage`      - Subimage index.
    /// * `sentry`        - Memory sentry for tile accounting.
    /// * `curr_to_world` - Initial current to world transform.
    pub fn new(
        file: ArcTextureFile,
        subimage: usize,
        sentry: Option<&Arc<MemorySentry>>,
        curr_to_world: &Matrix4x4,
    ) -> TexResult<Self> {
        if subimage >= file.num_subimages() {
            return Err(TexError::Index {
                index: subimage,
                len: file.num_subimages(),
            });
        }
        let path = file.path().to_string();
        let header = file.header(subimage);
        let world_to_camera = header
            .matrix(ATTR_WORLD_TO_CAMERA)
            .ok_or_else(|| TexError::invalid_file(&path, "shadow map has no world to camera matrix"))?;
        let world_to_screen = header
            .matrix(ATTR_WORLD_TO_SCREEN)
            .ok_or_else(|| TexError::invalid_file(&path, "shadow map has no world to screen matrix"))?;
        if header.channels.is_empty() || header.channels[0].channel_type != ChannelType::Float32 {
            return Err(TexError::invalid_file(&path, "shadow map depth must be 32-bit float"));
        }
        let camera_to_world = world_to_camera
            .inverse()
            .ok_or_else(|| TexError::invalid_file(&path, "singular world to camera matrix"))?;

        let (w, h) = (header.width as Float, header.height as Float);
        let screen_to_raster = Matrix4x4::scale(0.5 * w, 0.5 * h, 1.0)
            * Matrix4x4::translate(Vector3f::new(1.0, 1.0, 0.0))
            * Matrix4x4::scale(1.0, -1.0, 1.0);
        let world_to_raster = screen_to_raster * world_to_screen;
        let view_dir = camera_to_world
            .transform_vector(&Vector3f::new(0.0, 0.0, 1.0))
            .normalize();

        let tiles = TileArray::new(file, subimage, sentry)?;
        let map = Self {
            tiles,
            world_to_camera,
            world_to_raster,
            transforms: ArcSwap::from_pointee(ViewTransforms {
                curr_to_camera: world_to_camera,
                curr_to_raster: world_to_raster,
            }),
            view_dir,
            read_failed: AtomicBool::new(false),
        };
        map.set_curr_to_world(curr_to_world);
        Ok(map)
    }

    /// Returns the direction the light looks along in world space.
    pub fn view_dir(&self) -> Vector3f {
        self.view_dir
    }

    /// Sets the current to world transform.
    ///
    /// * `curr_to_world` - The transform.
    pub fn set_curr_to_world(&self, curr_to_world: &Matrix4x4) {
        self.transforms.store(Arc::new(ViewTransforms {
            curr_to_camera: self.world_to_camera * *curr_to_world,
            curr_to_raster: self.world_to_raster * *curr_to_world,
        }));
    }

    /// Returns the current space transforms.
    pub fn transforms(&self) -> Arc<ViewTransforms> {
        self.transforms.load_full()
    }

    /// Returns the weighted fraction of the footprint in shadow. Samples are
    /// placed on a `k x k` stratified grid over the parallelogram with
    /// `k = ceil(sqrt(num_samples))`.
    ///
    /// * `pllgram` - Positions in current space.
    /// * `options` - Sample options; must be valid.
    pub fn shadow_fraction(&self, pllgram: &Sample3dPllgram, options: &ShadowSampleOptions) -> Float {
        let transforms = self.transforms.load();
        let to_raster = &transforms.curr_to_raster;
        let to_camera = &transforms.curr_to_camera;
        let base = &options.base;

        let c = Point3f::new(pllgram.c.x, pllgram.c.y, pllgram.c.z);
        let rc = to_raster.transform_point(&c);
        let rs1 = (to_raster.transform_point(&(c + pllgram.s1)) - rc) * base.s_width;
        let rs2 = (to_raster.transform_point(&(c + pllgram.s2)) - rc) * base.t_width;
        let cz = to_camera.transform_point(&c).z;
        let dz1 = (to_camera.transform_point(&(c + pllgram.s1)).z - cz) * base.s_width;
        let dz2 = (to_camera.transform_point(&(c + pllgram.s2)).z - cz) * base.t_width;

        let header = self.tiles.header();
        let (w, h) = (header.width, header.height);
        let blur_x = 0.5 * base.s_blur * w as Float;
        let blur_y = 0.5 * base.t_blur * h as Float;

        let filter = filters::filter_for(base.filter_type);
        let k = ((options.num_samples as Float).sqrt().ceil() as usize).max(1);
        let mut tile: Option<Arc<TextureTile>> = None;
        let (mut total, mut shadowed) = (0.0, 0.0);

        for j in 0..k {
            let v = (2 * j + 1) as Float / k as Float - 1.0;
            for i in 0..k {
                let u = (2 * i + 1) as Float / k as Float - 1.0;
                let weight = filter.evaluate(u, v, 2.0, 2.0);
                if weight == 0.0 {
                    continue;
                }
                total += weight;

                let depth = cz + dz1 * u + dz2 * v;
                if depth <= 0.0 {
                    continue;
                }
                let rx = rc.x + rs1.x * u + rs2.x * v + blur_x * u;
                let ry = rc.y + rs1.y * u + rs2.y * v + blur_y * v;
                if !(rx >= 0.0 && ry >= 0.0 && rx < w as Float && ry < h as Float) {
                    continue;
                }
                let (px, py) = (rx as usize, ry as usize);

                if !tile.as_ref().map_or(false, |t| t.contains(px, py)) {
                    match self.tiles.tile_for(px, py) {
                        Ok(t) => tile = Some(t),
                        Err(err) => {
                            self.report_read_failure(&err);
                            continue;
                        }
                    }
                }
                if let Some(t) = tile.as_ref() {
                    if options
                        .depth_compare
                        .occluded(t.value(px, py, 0), depth - options.bias)
                    {
                        shadowed += weight;
                    }
                }
            }
        }

        if total > 0.0 {
            shadowed / total
        } else {
            0.0
        }
    }

    /// Logs the first tile read failure of this map.
    ///
    /// * `err` - The error.
    fn report_read_failure(&self, err: &TexError) {
        if !self.read_failed.swap(true, Ordering::Relaxed) {
            warn!("Shadow map tile read failed: {err}; treating samples as visible");
        }
    }
}

/// Samples a single shadow map.
pub struct ShadowMapSampler {
    /// The map.
    map: ShadowMap,
}

impl ShadowMapSampler {
    /// Creates a sampler from subimage 0 of a shadow map file.
    ///
    /// * `file`          - The texture file.
    /// * `sentry`        - Memory sentry for tile accounting.
    /// * `curr_to_world` - Initial current to world transform.
    pub fn create(file: ArcTextureFile, sentry: Option<&Arc<MemorySentry>>, curr_to_world: &Matrix4x4) -> TexResult<Self> {
        let map = ShadowMap::new(file, 0, sentry, curr_to_world)?;
        Ok(Self { map })
    }
}

impl ShadowSampler for ShadowMapSampler {
    fn sample_pllgram(&self, pllgram: &Sample3dPllgram, options: &ShadowSampleOptions, out: &mut [Float]) -> TexResult<()> {
        options.validate(out)?;
        let fraction = self.map.shadow_fraction(pllgram, options);
        out[..options.base.num_channels]
            .iter_mut()
            .for_each(|o| *o = fraction);
        Ok(())
    }

    fn default_sample_options(&self) -> ShadowSampleOptions {
        ShadowSampleOptions::default()
    }

    fn set_curr_to_world(&self, curr_to_world: &Matrix4x4) {
        self.map.set_curr_to_world(curr_to_world);
    }
}

/// Creates the header of a single channel float depth map.
///
/// * `width`           - Width in pixels.
/// * `height`          - Height in pixels.
/// * `world_to_camera` - World to light camera transform.
/// * `world_to_screen` - World to light screen transform.
pub fn shadow_map_header(
    width: usize,
    height: usize,
    world_to_camera: Matrix4x4,
    world_to_screen: Matrix4x4,
) -> TextureFileHeader {
    TextureFileHeader::new(width, height, ChannelList::uniform(&["z"], ChannelType::Float32))
        .with(ATTR_TEXTURE_FORMAT, AttrValue::Text(TextureFormat::Shadow.to_string()))
        .with(ATTR_WORLD_TO_CAMERA, AttrValue::Matrix(world_to_camera))
        .with(ATTR_WORLD_TO_SCREEN, AttrValue::Matrix(world_to_screen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    /// 4 x 4 orthographic map looking down +z: depth 1 on the left half and
    /// 10 on the right half.
    fn split_map() -> ArcTextureFile {
        let header = shadow_map_header(4, 4, Matrix4x4::default(), Matrix4x4::default());
        let values: Vec<Float> = (0..16).map(|i| if i % 4 < 2 { 1.0 } else { 10.0 }).collect();
        Arc::new(MemoryTextureFile::from_floats("shadow", header, &values).unwrap())
    }

    fn lookup(s: &ShadowMapSampler, p: Sample3dPllgram, num_samples: usize) -> Float {
        let opts = ShadowSampleOptions {
            num_samples,
            ..s.default_sample_options()
        };
        let mut out = [-1.0];
        s.sample_pllgram(&p, &opts, &mut out).unwrap();
        out[0]
    }

    #[test]
    fn point_lookups() {
        let s = ShadowMapSampler::create(split_map(), None, &Matrix4x4::default()).unwrap();
        assert_eq!(lookup(&s, Sample3dPllgram::point(Vector3f::new(-0.5, 0.0, 5.0)), 1), 1.0);
        assert_eq!(lookup(&s, Sample3dPllgram::point(Vector3f::new(0.5, 0.0, 5.0)), 1), 0.0);
        // Closer to the light than the stored depth.
        assert_eq!(lookup(&s, Sample3dPllgram::point(Vector3f::new(-0.5, 0.0, 0.5)), 1), 0.0);
        // Behind the light and outside the map.
        assert_eq!(lookup(&s, Sample3dPllgram::point(Vector3f::new(-0.5, 0.0, -1.0)), 1), 0.0);
        assert_eq!(lookup(&s, Sample3dPllgram::point(Vector3f::new(-2.0, 0.0, 5.0)), 1), 0.0);
    }

    #[test]
    fn footprint_straddling_an_edge() {
        let s = ShadowMapSampler::create(split_map(), None, &Matrix4x4::default()).unwrap();
        let p = Sample3dPllgram::new(
            Vector3f::new(0.0, 0.0, 5.0),
            Vector3f::new(0.5, 0.0, 0.0),
            Vector3f::new(0.0, 0.1, 0.0),
        );
        assert!(approx_eq!(Float, lookup(&s, p, 4), 0.5, epsilon = 1e-6));
        assert!(approx_eq!(Float, lookup(&s, p, 16), 0.5, epsilon = 1e-6));
    }

    #[test]
    fn curr_to_world_moves_lookups() {
        let s = ShadowMapSampler::create(split_map(), None, &Matrix4x4::default()).unwrap();
        let p = Sample3dPllgram::point(Vector3f::new(-0.5, 0.0, 5.0));
        assert_eq!(lookup(&s, p, 1), 1.0);
        s.set_curr_to_world(&Matrix4x4::translate(Vector3f::new(1.0, 0.0, 0.0)));
        assert_eq!(lookup(&s, p, 1), 0.0);
    }

    #[test]
    fn transforms_are_replaced_together() {
        let map = ShadowMap::new(split_map(), 0, None, &Matrix4x4::default()).unwrap();
        let moves = [
            Matrix4x4::translate(Vector3f::new(1.0, 0.0, 0.0)),
            Matrix4x4::translate(Vector3f::new(0.0, 2.0, 0.0)),
        ];
        let expected: Vec<ViewTransforms> = moves
            .iter()
            .map(|m| {
                map.set_curr_to_world(m);
                *map.transforms()
            })
            .collect();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..2000 {
                    map.set_curr_to_world(&moves[i % 2]);
                }
            });
            for _ in 0..2 {
                scope.spawn(|| {
                    for _ in 0..2000 {
                        let t = *map.transforms();
                        assert!(expected.contains(&t));
                    }
                });
            }
        });
    }

    #[test]
    fn writes_every_channel() {
        let s = ShadowMapSampler::create(split_map(), None, &Matrix4x4::default()).unwrap();
        let mut opts = s.default_sample_options();
        opts.base.num_channels = 3;
        let mut out = [0.0; 3];
        s.sample_pllgram(&Sample3dPllgram::point(Vector3f::new(-0.5, 0.0, 5.0)), &opts, &mut out)
            .unwrap();
        assert_eq!(out, [1.0; 3]);
        assert!(s
            .sample_pllgram(&Sample3dPllgram::default(), &opts, &mut [0.0; 2])
            .is_err());
    }

    #[test]
    fn rejects_maps_without_transforms_or_float_depth() {
        let header = TextureFileHeader::new(2, 2, ChannelList::uniform(&["z"], ChannelType::Float32));
        let f: ArcTextureFile = Arc::new(MemoryTextureFile::from_floats("a", header, &[0.0; 4]).unwrap());
        assert!(ShadowMapSampler::create(f, None, &Matrix4x4::default()).is_err());

        let header = TextureFileHeader::new(2, 2, ChannelList::uniform(&["z"], ChannelType::Uint8))
            .with(ATTR_WORLD_TO_CAMERA, AttrValue::Matrix(Matrix4x4::default()))
            .with(ATTR_WORLD_TO_SCREEN, AttrValue::Matrix(Matrix4x4::default()));
        let f: ArcTextureFile = Arc::new(MemoryTextureFile::from_floats("b", header, &[0.0; 4]).unwrap());
        assert!(ShadowMapSampler::create(f, None, &Matrix4x4::default()).is_err());
    }
}
