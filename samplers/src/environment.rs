//! Environment Sampler
//!
//! Maps direction footprints onto a lat-long or cube face texture and filters
//! with the same core as plain textures.
//!
//! Cube face maps hold six square faces in a 3 x 2 grid: `+x +y +z` on the
//! top row and `-x -y -z` on the bottom row.

use crate::filtering::*;
use crate::footprint::*;
use crate::options::*;
use std::sync::Arc;
use texcore::error::*;
use texcore::geometry::*;
use texcore::math::*;
use texcore::memory::*;
use texcore::texfile::*;

/// Filtered lookups into an environment map.
pub trait EnvironmentSampler: Send + Sync {
    /// Filters the map over a parallelogram of directions.
    ///
    /// * `pllgram` - Directions; need not be normalized.
    /// * `options` - Sample options; wrap modes are set by the mapping.
    /// * `out`     - Output buffer.
    fn sample_pllgram(&self, pllgram: &Sample3dPllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()>;

    /// Filters the map over a quadrilateral of directions. The default
    /// implementation filters over the best fitting parallelogram.
    ///
    /// * `quad`    - Directions; need not be normalized.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_quad(&self, quad: &Sample3dQuad, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        self.sample_pllgram(&Sample3dPllgram::from(quad), options, out)
    }

    /// Returns options matching the map.
    fn default_sample_options(&self) -> TextureSampleOptions;
}

/// Atomic reference counted `EnvironmentSampler`.
pub type ArcEnvironmentSampler = Arc<dyn EnvironmentSampler>;

/// Direction parameterization of an environment map.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnvironmentMapping {
    /// Longitude in s, colatitude from +z in t.
    LatLong,
    /// Six cube faces.
    CubeFace,
}

/// Samples a lat-long or cube face environment map.
pub struct EnvironmentMapSampler {
    /// Tiles and kernels.
    core: FilterCore,

    /// Parameterization.
    mapping: EnvironmentMapping,

    /// Number of mip levels usable with the mapping.
    max_levels: usize,

    /// Options derived from the file header.
    default_options: TextureSampleOptions,
}

impl EnvironmentMapSampler {
    /// Creates a sampler. Files marked as cube face maps use the cube
    /// mapping; everything else is read as lat-long.
    ///
    /// * `file`   - The texture file.
    /// * `sentry` - Memory sentry for tile accounting.
    pub fn create(file: ArcTextureFile, sentry: Option<&Arc<MemorySentry>>) -> TexResult<Self> {
        let path = file.path().to_string();
        let mapping = match file.header(0).texture_format() {
            TextureFormat::CubeEnvironment => EnvironmentMapping::CubeFace,
            _ => EnvironmentMapping::LatLong,
        };
        let mut default_options = TextureSampleOptions::from_header(file.header(0));
        let core = FilterCore::new(file, sentry)?;

        let max_levels = match mapping {
            EnvironmentMapping::LatLong => {
                default_options.s_wrap = WrapMode::Periodic;
                default_options.t_wrap = WrapMode::Clamp;
                core.num_levels()
            }
            EnvironmentMapping::CubeFace => {
                default_options.s_wrap = WrapMode::Clamp;
                default_options.t_wrap = WrapMode::Clamp;
                let n = (0..core.num_levels())
                    .take_while(|l| {
                        let h = core.header(*l);
                        h.width % 3 == 0 && h.height % 2 == 0 && h.width / 3 == h.height / 2
                    })
                    .count();
                if n == 0 {
                    return Err(TexError::invalid_file(&path, "cube face map is not a 3 x 2 grid of square faces"));
                }
                n
            }
        };

        Ok(Self {
            core,
            mapping,
            max_levels,
            default_options,
        })
    }

    /// Returns the parameterization.
    pub fn mapping(&self) -> EnvironmentMapping {
        self.mapping
    }

    /// Filters a lat-long map.
    ///
    /// * `pllgram` - Directions.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_latlong(&self, pllgram: &Sample3dPllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        let (cs, ct) = latlong_st(&pllgram.c).ok_or_else(zero_direction)?;
        let footprint = st_footprint((cs, ct), pllgram, |d| {
            latlong_st(d).map(|(s, t)| {
                // Unwrap across the seam relative to the centre.
                if s - cs > 0.5 {
                    (s - 1.0, t)
                } else if cs - s > 0.5 {
                    (s + 1.0, t)
                } else {
                    (s, t)
                }
            })
        });

        let options = TextureSampleOptions {
            s_wrap: WrapMode::Periodic,
            t_wrap: WrapMode::Clamp,
            ..*options
        };
        self.core
            .sample_pllgram((1, 1), (0, 0), self.max_levels, &footprint, &options, out)
    }

    /// Filters a cube face map within the face the footprint centre points
    /// at.
    ///
    /// * `pllgram` - Directions.
    /// * `options` - Sample options.
    /// * `out`     - Output buffer.
    fn sample_cube(&self, pllgram: &Sample3dPllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        if pllgram.c.length() == 0.0 {
            return Err(zero_direction());
        }
        let face = cube_face(&pllgram.c);
        let centre = cube_face_st(face, &pllgram.c).ok_or_else(zero_direction)?;
        let footprint = st_footprint(centre, pllgram, |d| cube_face_st(face, d));

        let options = TextureSampleOptions {
            s_wrap: WrapMode::Clamp,
            t_wrap: WrapMode::Clamp,
            ..*options
        };
        self.core.sample_pllgram(
            (3, 2),
            (face % 3, face / 3),
            self.max_levels,
            &footprint,
            &options,
            out,
        )
    }
}

impl EnvironmentSampler for EnvironmentMapSampler {
    fn sample_pllgram(&self, pllgram: &Sample3dPllgram, options: &TextureSampleOptions, out: &mut [Float]) -> TexResult<()> {
        match self.mapping {
            EnvironmentMapping::LatLong => self.sample_latlong(pllgram, options, out),
            EnvironmentMapping::CubeFace => self.sample_cube(pllgram, options, out),
        }
    }

    fn default_sample_options(&self) -> TextureSampleOptions {
        self.default_options
    }
}

fn zero_direction() -> TexError {
    TexError::BadParams("zero length direction".to_string())
}

/// Maps the corners of a direction footprint to texture coordinates and fits
/// a parallelogram around the centre. Corners that don't map are pulled in
/// to the centre.
///
/// * `centre`  - Texture coordinates of the centre direction.
/// * `pllgram` - Directions.
/// * `to_st`   - Maps a direction to texture coordinates.
fn st_footprint<F>(centre: (Float, Float), pllgram: &Sample3dPllgram, to_st: F) -> SamplePllgram
where
    F: Fn(&Vector3f) -> Option<(Float, Float)>,
{
    let [v1, v2, v3, v4] = pllgram.corners().map(|d| {
        let (s, t) = to_st(&d).unwrap_or(centre);
        Point2f::new(s, t)
    });
    let fit = SamplePllgram::from(&SampleQuad::new(v1, v2, v3, v4));
    SamplePllgram::new(Point2f::new(centre.0, centre.1), fit.s1, fit.s2)
}

/// Returns the lat-long coordinates of a direction, or `None` for a zero
/// vector.
///
/// * `d` - The direction.
pub fn latlong_st(d: &Vector3f) -> Option<(Float, Float)> {
    let len = d.length();
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    let s = rem(d.y.atan2(d.x) * INV_TWO_PI, 1.0);
    let t = clamp(d.z / len, -1.0, 1.0).acos() * INV_PI;
    Some((s, t))
}

/// Returns the cube face (0 to 5 for `+x +y +z -x -y -z`) a direction
/// points at.
///
/// * `d` - The direction.
pub fn cube_face(d: &Vector3f) -> usize {
    let axis = d.max_dimension();
    if d.component(axis) >= 0.0 {
        axis
    } else {
        axis + 3
    }
}

/// Projects a direction onto a cube face and returns normalized face
/// coordinates, or `None` if the direction points away from the face.
///
/// * `face` - Face index.
/// * `d`    - The direction.
pub fn cube_face_st(face: usize, d: &Vector3f) -> Option<(Float, Float)> {
    let (sc, tc, ma) = match face {
        0 => (-d.z, -d.y, d.x),
        1 => (d.x, d.z, d.y),
        2 => (d.x, -d.y, d.z),
        3 => (d.z, -d.y, -d.x),
        4 => (d.x, -d.z, -d.y),
        _ => (-d.x, -d.y, -d.z),
    };
    if ma <= 0.0 {
        return None;
    }
    Some((0.5 * (sc / ma + 1.0), 0.5 * (tc / ma + 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use texcore::channel::*;
    use texcore::filter::*;

    fn file(w: usize, h: usize, format: TextureFormat, f: impl Fn(usize, usize) -> Float) -> ArcTextureFile {
        let header = TextureFileHeader::new(w, h, ChannelList::uniform(&["y"], ChannelType::Float32))
            .with(ATTR_TEXTURE_FORMAT, AttrValue::Text(format.to_string()));
        let values: Vec<Float> = (0..h).flat_map(|y| (0..w).map(move |x| (x, y))).map(|(x, y)| f(x, y)).collect();
        let subimages = texcore::mipmap::build_mip_subimages("env", &header, values, filters::filter_for(FilterType::Box), 2.0).unwrap();
        Arc::new(MemoryTextureFile::new("env", subimages).unwrap())
    }

    fn box_options(s: &EnvironmentMapSampler) -> TextureSampleOptions {
        TextureSampleOptions {
            filter_type: FilterType::Box,
            ..s.default_sample_options()
        }
    }

    #[test]
    fn latlong_coordinates() {
        let (s, t) = latlong_st(&Vector3f::new(0.0, 0.0, 2.0)).unwrap();
        assert_eq!((s, t), (0.0, 0.0));
        let (s, t) = latlong_st(&Vector3f::new(0.0, -1.0, 0.0)).unwrap();
        assert!(approx_eq!(Float, s, 0.75, epsilon = 1e-6));
        assert!(approx_eq!(Float, t, 0.5, epsilon = 1e-6));
        assert!(latlong_st(&Vector3f::default()).is_none());
    }

    #[test]
    fn latlong_lookup_wraps_across_seam() {
        let s = EnvironmentMapSampler::create(file(8, 4, TextureFormat::LatLongEnvironment, |x, _| x as Float), None).unwrap();
        assert_eq!(s.mapping(), EnvironmentMapping::LatLong);
        let opts = box_options(&s);
        let mut out = [0.0];

        let angle = TWO_PI * 2.5 / 8.0;
        let d = Vector3f::new(angle.cos(), angle.sin(), 0.0);
        s.sample_pllgram(&Sample3dPllgram::point(d), &opts, &mut out).unwrap();
        assert!(approx_eq!(Float, out[0], 2.0, epsilon = 1e-5));

        // s = 0 straddles the last and first columns.
        let d = Vector3f::new(1.0, 0.0, 0.0);
        s.sample_pllgram(&Sample3dPllgram::point(d), &opts, &mut out).unwrap();
        assert!(approx_eq!(Float, out[0], 3.5, epsilon = 1e-5));
    }

    #[test]
    fn cube_faces() {
        assert_eq!(cube_face(&Vector3f::new(1.0, 0.5, 0.5)), 0);
        assert_eq!(cube_face(&Vector3f::new(0.0, -2.0, 1.0)), 4);
        assert_eq!(cube_face(&Vector3f::new(0.1, 0.0, -0.5)), 5);
        assert_eq!(cube_face_st(2, &Vector3f::new(0.0, 0.0, 1.0)), Some((0.5, 0.5)));
        assert_eq!(cube_face_st(2, &Vector3f::new(0.0, 0.0, -1.0)), None);
    }

    #[test]
    fn cube_lookup_stays_on_face() {
        // 2 x 2 faces, each filled with its face index.
        let s = EnvironmentMapSampler::create(
            file(6, 4, TextureFormat::CubeEnvironment, |x, y| (x / 2 + 3 * (y / 2)) as Float),
            None,
        )
        .unwrap();
        assert_eq!(s.mapping(), EnvironmentMapping::CubeFace);
        let opts = box_options(&s);
        let mut out = [0.0];
        for (d, face) in [
            (Vector3f::new(1.0, 0.0, 0.0), 0.0),
            (Vector3f::new(0.0, 1.0, 0.0), 1.0),
            (Vector3f::new(0.0, 0.0, 1.0), 2.0),
            (Vector3f::new(-1.0, 0.0, 0.0), 3.0),
            (Vector3f::new(0.0, -1.0, 0.0), 4.0),
            (Vector3f::new(0.0, 0.0, -1.0), 5.0),
        ] {
            s.sample_pllgram(&Sample3dPllgram::point(d), &opts, &mut out).unwrap();
            assert!(approx_eq!(Float, out[0], face, epsilon = 1e-5));
        }
    }

    #[test]
    fn bad_cube_layout() {
        let f = file(4, 4, TextureFormat::CubeEnvironment, |_, _| 0.0);
        assert!(EnvironmentMapSampler::create(f, None).is_err());
    }

    #[test]
    fn zero_direction_is_bad_params() {
        let s = EnvironmentMapSampler::create(file(8, 4, TextureFormat::LatLongEnvironment, |_, _| 0.0), None).unwrap();
        let opts = s.default_sample_options();
        let mut out = [0.0];
        assert!(s
            .sample_pllgram(&Sample3dPllgram::point(Vector3f::default()), &opts, &mut out)
            .is_err());
    }
}
