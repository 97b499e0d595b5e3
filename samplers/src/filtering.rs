//! Filtering Core
//!
//! The filtered lookup shared by plain texture and environment samplers:
//! mip level selection, footprint frames, filter tables, wrap handling and
//! the weighted sum over the footprint's support.
//!
//! A footprint is reduced to its principal half axes. Texel offsets are
//! mapped into that frame, where the filter's unit square `[-1, 1]^2` covers
//! the footprint, so long thin footprints stay long and thin at any angle.

use crate::footprint::*;
use crate::options::*;
use filters::filter_for;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use texcore::cached_filter::*;
use texcore::error::*;
use texcore::filter::*;
use texcore::filter_support::*;
use texcore::geometry::*;
use texcore::math::*;
use texcore::memory::*;
use texcore::texfile::*;
use texcore::tile_array::*;

/// Footprints wider than this many texels at the chosen level push the
/// lookup to a coarser level.
pub const MAX_KERNEL_WIDTH: Float = 32.0;

/// Table samples per unit of filter space.
const TABLE_RESOLUTION: usize = 32;

/// Footprint half sides are clamped to this many texture widths.
const MAX_HALF_SIDE: Float = 4.0;

/// Channels read from a tile per call.
const PIXEL_CHUNK: usize = 16;

/// Returns the smallest full width, in texels, at which a filter still
/// reconstructs a value at every position between texel centres.
///
/// * `filter_type` - Filter function.
pub fn min_filter_width(filter_type: FilterType) -> Float {
    match filter_type {
        FilterType::Box => 1.0,
        FilterType::Triangle | FilterType::Gaussian | FilterType::Disk => 2.0,
        FilterType::CatmullRom | FilterType::Sinc => 4.0,
    }
}

/// A filter function sampled over its unit square, `[-1, 1]^2`.
pub struct FilterTable {
    kernel: CachedFilter,
}

impl FilterTable {
    /// Samples a filter function.
    ///
    /// * `filter_type` - Filter function.
    pub fn new(filter_type: FilterType) -> Self {
        let n = (2 * TABLE_RESOLUTION) as Float;
        let scale = 1.0 / TABLE_RESOLUTION as Float;
        Self {
            kernel: CachedFilter::new(filter_for(filter_type), n, n, true, true, scale),
        }
    }

    /// Returns the weight at a point of filter space; zero outside the unit
    /// square.
    ///
    /// * `u` - First coordinate.
    /// * `v` - Second coordinate.
    #[inline]
    pub fn weight(&self, u: Float, v: Float) -> Float {
        let r = TABLE_RESOLUTION as Float;
        let i = (u * r).round();
        let j = (v * r).round();
        if !(i.abs() <= r && j.abs() <= r) {
            return 0.0;
        }
        self.kernel.weight((i + r) as usize, (j + r) as usize)
    }
}

/// Filter tables built for one sampler, shared by concurrent queries. Holds
/// at most one table per filter type.
#[derive(Default)]
pub struct KernelCache {
    tables: RwLock<HashMap<FilterType, Arc<FilterTable>>>,
}

impl KernelCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached tables.
    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no tables are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the table for a filter, building and caching it on first use.
    /// Concurrent first uses may each build a table; one of them is kept.
    ///
    /// * `filter_type` - Filter function.
    pub fn get(&self, filter_type: FilterType) -> Arc<FilterTable> {
        let cached = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&filter_type)
            .cloned();
        if let Some(table) = cached {
            return table;
        }

        let table = Arc::new(FilterTable::new(filter_type));
        trace!("Built {filter_type} filter table");
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(filter_type)
            .or_insert(table)
            .clone()
    }
}

/// A footprint in the raster space of one level: its centre and principal
/// half axes. Texel offsets from the centre map into filter space by
/// projecting onto the axes and dividing by the radii.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FilterFrame {
    /// Centre x.
    pub cx: Float,

    /// Centre y.
    pub cy: Float,

    /// Unit direction of the first axis; the second is perpendicular.
    pub axis: Vector2f,

    /// Half width along the first axis.
    pub r1: Float,

    /// Half width along the second axis.
    pub r2: Float,
}

impl FilterFrame {
    /// Creates an axis aligned frame.
    ///
    /// * `cx` - Centre x.
    /// * `cy` - Centre y.
    /// * `fw` - Full width in x.
    /// * `fh` - Full height in y.
    pub fn axis_aligned(cx: Float, cy: Float, fw: Float, fh: Float) -> Self {
        Self {
            cx,
            cy,
            axis: Vector2f::new(1.0, 0.0),
            r1: 0.5 * fw,
            r2: 0.5 * fh,
        }
    }

    /// Creates a frame from the second moments `[[a, b], [b, c]]` of a
    /// footprint. The radii are the square roots of the eigenvalues.
    ///
    /// * `cx` - Centre x.
    /// * `cy` - Centre y.
    /// * `a`  - Moment in x.
    /// * `b`  - Cross moment.
    /// * `c`  - Moment in y.
    pub fn from_moments(cx: Float, cy: Float, a: Float, b: Float, c: Float) -> Self {
        let m = 0.5 * (a + c);
        let d = (0.25 * (a - c) * (a - c) + b * b).sqrt();
        let l1 = m + d;
        let l2 = (m - d).max(0.0);

        let axis = if d > 0.0 {
            let v1 = Vector2f::new(b, l1 - a);
            let v2 = Vector2f::new(l1 - c, b);
            let v = if v1.length_squared() >= v2.length_squared() { v1 } else { v2 };
            v * (1.0 / v.length())
        } else {
            Vector2f::new(1.0, 0.0)
        };

        Self {
            cx,
            cy,
            axis,
            r1: l1.sqrt(),
            r2: l2.sqrt(),
        }
    }

    /// Returns the full width across the narrow axis.
    pub fn minor_width(&self) -> Float {
        2.0 * self.r1.min(self.r2)
    }

    /// Returns the full width along the long axis.
    pub fn major_width(&self) -> Float {
        2.0 * self.r1.max(self.r2)
    }

    /// Returns the frame with its radii clamped to `[lo, hi]`.
    ///
    /// * `lo` - Smallest radius.
    /// * `hi` - Largest radius.
    pub fn clamp_radii(&self, lo: Float, hi: Float) -> Self {
        let hi = hi.max(lo);
        Self {
            r1: self.r1.clamp(lo, hi),
            r2: self.r2.clamp(lo, hi),
            ..*self
        }
    }

    /// Maps an offset from the centre into filter space.
    ///
    /// * `dx` - Offset in x.
    /// * `dy` - Offset in y.
    #[inline]
    fn to_filter(&self, dx: Float, dy: Float) -> (Float, Float) {
        let u = (dx * self.axis.x + dy * self.axis.y) / self.r1;
        let v = (dy * self.axis.x - dx * self.axis.y) / self.r2;
        (u, v)
    }

    /// Returns the half extents of the frame's bounding box, padded by the
    /// table's rounding tolerance.
    fn half_extents(&self) -> (Float, Float) {
        let pad = 1.0 + 0.5 / TABLE_RESOLUTION as Float;
        let ex = self.axis.x.abs() * self.r1 + self.axis.y.abs() * self.r2;
        let ey = self.axis.y.abs() * self.r1 + self.axis.x.abs() * self.r2;
        (ex * pad, ey * pad)
    }
}

/// Returns the raster frame of a footprint given in normalized coordinates
/// of a `w x h` texel region, including width multipliers and blur.
///
/// * `pllgram` - Footprint in normalized coordinates.
/// * `options` - Sample options.
/// * `w`       - Region width in texels.
/// * `h`       - Region height in texels.
fn raster_frame(pllgram: &SamplePllgram, options: &TextureSampleOptions, w: Float, h: Float) -> FilterFrame {
    let side = |v: Float| v.clamp(-MAX_HALF_SIDE, MAX_HALF_SIDE);
    let sw = options.s_width.min(MAX_HALF_SIDE) * w;
    let tw = options.t_width.min(MAX_HALF_SIDE) * h;
    let s1 = Vector2f::new(side(pllgram.s1.x) * sw, side(pllgram.s1.y) * tw);
    let s2 = Vector2f::new(side(pllgram.s2.x) * sw, side(pllgram.s2.y) * tw);
    let bx = 0.5 * options.s_blur.min(MAX_HALF_SIDE) * w;
    let by = 0.5 * options.t_blur.min(MAX_HALF_SIDE) * h;

    FilterFrame::from_moments(
        pllgram.c.x * w,
        pllgram.c.y * h,
        s1.x * s1.x + s2.x * s2.x + bx * bx,
        s1.x * s1.y + s2.x * s2.y,
        s1.y * s1.y + s2.y * s2.y + by * by,
    )
}

/// A rectangle of a subimage that filtering is confined to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    /// Left edge.
    pub x0: usize,

    /// Top edge.
    pub y0: usize,

    /// Width in pixels.
    pub width: usize,

    /// Height in pixels.
    pub height: usize,
}

/// Where a texel position lands after wrapping.
enum Wrapped {
    /// Inside the region at this offset.
    Inside(usize),
    /// Outside; contributes zero with its weight.
    Black,
}

/// Maps a texel position into a region axis.
///
/// * `i`    - Position relative to the region.
/// * `n`    - Region size along the axis.
/// * `wrap` - Wrap mode.
#[inline]
fn wrap_index(i: i64, n: usize, wrap: WrapMode) -> Wrapped {
    let n = n as i64;
    if (0..n).contains(&i) {
        return Wrapped::Inside(i as usize);
    }
    match wrap {
        WrapMode::Periodic => Wrapped::Inside(rem(i, n) as usize),
        WrapMode::Clamp => Wrapped::Inside(clamp(i, 0, n - 1) as usize),
        // Trunc supports are clipped before the loop.
        WrapMode::Black | WrapMode::Trunc => Wrapped::Black,
    }
}

/// Moves a centre coordinate next to the region without changing what the
/// support covers after wrapping.
///
/// * `c`    - Centre.
/// * `e`    - Half extent of the support.
/// * `n`    - Region size.
/// * `wrap` - Wrap mode.
#[inline]
fn settle_centre(c: Float, e: Float, n: usize, wrap: WrapMode) -> Float {
    let n = n as Float;
    match wrap {
        WrapMode::Periodic => rem(c, n),
        _ => c.clamp(-e - 1.0, n + e + 1.0),
    }
}

/// Returns the texels whose centres lie within `e` of `c`.
///
/// * `c` - Centre.
/// * `e` - Half extent.
#[inline]
fn texel_span(c: Float, e: Float) -> FilterSupport1D {
    let start = (c - e - 0.5).ceil() as i64;
    let end = (c + e - 0.5).floor() as i64 + 1;
    FilterSupport1D::new(start, end)
}

/// Mipmapped tile storage plus the filter tables of one sampler.
pub struct FilterCore {
    /// Tile arrays, one per mip level, finest first.
    levels: Vec<Arc<TileArray>>,

    /// Filter tables.
    kernels: KernelCache,

    /// Set after the first tile read failure has been logged.
    read_failed: AtomicBool,
}

impl FilterCore {
    /// Creates the core for a file whose subimages are mip levels. Subimages
    /// that don't halve the previous level are ignored.
    ///
    /// * `file`   - The texture file.
    /// * `sentry` - Memory sentry for tile accounting.
    pub fn new(file: ArcTextureFile, sentry: Option<&Arc<MemorySentry>>) -> TexResult<Self> {
        if file.num_subimages() == 0 {
            return Err(TexError::invalid_file(file.path(), "no subimages"));
        }
        let base = file.header(0);
        if base.width == 0 || base.height == 0 || base.channels.is_empty() {
            return Err(TexError::invalid_file(file.path(), "empty image"));
        }

        let mut levels = vec![TileArray::new(file.clone(), 0, sentry)?];
        for i in 1..file.num_subimages() {
            let (pw, ph) = (levels[i - 1].width(), levels[i - 1].height());
            let h = file.header(i);
            if h.width != std::cmp::max(1, (pw + 1) / 2)
                || h.height != std::cmp::max(1, (ph + 1) / 2)
                || h.channels != base.channels
            {
                warn!("{}: subimage {i} is not a mip level; ignoring the rest", file.path());
                break;
            }
            levels.push(TileArray::new(file.clone(), i, sentry)?);
        }

        Ok(Self {
            levels,
            kernels: KernelCache::new(),
            read_failed: AtomicBool::new(false),
        })
    }

    /// Returns the number of mip levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Returns the header of a mip level.
    ///
    /// * `level` - Mip level; must be less than `num_levels()`.
    pub fn header(&self, level: usize) -> &TextureFileHeader {
        self.levels[level].header()
    }

    /// Returns the filter table cache.
    pub fn kernels(&self) -> &KernelCache {
        &self.kernels
    }

    /// Returns the finest level at which a footprint is at least one texel
    /// across its narrow axis, and coarser still if its long axis would
    /// exceed `MAX_KERNEL_WIDTH` texels.
    ///
    /// * `minor`      - Narrow width in level 0 texels.
    /// * `major`      - Long width in level 0 texels.
    /// * `max_levels` - Number of levels that may be used.
    pub fn choose_level(&self, minor: Float, major: Float, max_levels: usize) -> usize {
        let n = max_levels.clamp(1, self.levels.len());
        let mut level = std::cmp::min(log2_floor(minor), n - 1);
        while level + 1 < n && major * self.level_scale(level) > MAX_KERNEL_WIDTH {
            level += 1;
        }
        level
    }

    /// Returns the size of a level relative to level 0.
    ///
    /// * `level` - Mip level.
    fn level_scale(&self, level: usize) -> Float {
        let sx = self.levels[level].width() as Float / self.levels[0].width() as Float;
        let sy = self.levels[level].height() as Float / self.levels[0].height() as Float;
        sx.max(sy)
    }

    /// Filters a footprint given in normalized coordinates of one cell of a
    /// `grid` partition of the image (the whole image for a 1x1 grid).
    ///
    /// * `grid`       - Number of cells in x and y.
    /// * `cell`       - Cell to filter within.
    /// * `max_levels` - Number of levels whose size divides evenly by `grid`.
    /// * `pllgram`    - Footprint in normalized cell coordinates.
    /// * `options`    - Sample options.
    /// * `out`        - Output buffer.
    pub fn sample_pllgram(
        &self,
        grid: (usize, usize),
        cell: (usize, usize),
        max_levels: usize,
        pllgram: &SamplePllgram,
        options: &TextureSampleOptions,
        out: &mut [Float],
    ) -> TexResult<()> {
        options.validate(out)?;
        let coords = [pllgram.c.x, pllgram.c.y, pllgram.s1.x, pllgram.s1.y, pllgram.s2.x, pllgram.s2.y];
        if !coords.iter().all(|v| v.is_finite()) {
            return Err(TexError::BadParams(format!("footprint {pllgram:?}")));
        }

        let base = self.header(0);
        let bw = (base.width / grid.0) as Float;
        let bh = (base.height / grid.1) as Float;
        let frame = raster_frame(pllgram, options, bw, bh);
        let level = self.choose_level(frame.minor_width(), frame.major_width(), max_levels);

        let h = self.header(level);
        let (rw, rh) = (h.width / grid.0, h.height / grid.1);
        let region = PixelRegion {
            x0: cell.0 * rw,
            y0: cell.1 * rh,
            width: rw,
            height: rh,
        };
        let frame = raster_frame(pllgram, options, rw as Float, rh as Float);
        self.filter(level, &region, &frame, options, out)
    }

    /// Filters a level over a frame whose centre is relative to a region.
    /// Radii are widened to the filter's minimum width and narrowed to the
    /// region size.
    ///
    /// * `level`   - Mip level.
    /// * `region`  - Region of the level to filter within.
    /// * `frame`   - Footprint in region raster coordinates.
    /// * `options` - Sample options; must be valid for `out`.
    /// * `out`     - Output buffer.
    pub fn filter(
        &self,
        level: usize,
        region: &PixelRegion,
        frame: &FilterFrame,
        options: &TextureSampleOptions,
        out: &mut [Float],
    ) -> TexResult<()> {
        let tiles = &self.levels[level];
        let nc = options.num_channels;
        let available = tiles
            .header()
            .channels
            .len()
            .saturating_sub(options.start_channel)
            .min(nc);
        out[available..nc].iter_mut().for_each(|o| *o = options.fill);
        if available == 0 {
            return Ok(());
        }

        let table = self.kernels.get(options.filter_type);
        let mut frame = frame.clamp_radii(
            0.5 * min_filter_width(options.filter_type),
            region.width.max(region.height) as Float,
        );
        let (ex, ey) = frame.half_extents();
        frame.cx = settle_centre(frame.cx, ex, region.width, options.s_wrap);
        frame.cy = settle_centre(frame.cy, ey, region.height, options.t_wrap);

        let mut support = FilterSupport::new(texel_span(frame.cx, ex), texel_span(frame.cy, ey));
        if options.s_wrap == WrapMode::Trunc {
            support.sx.truncate(0, region.width as i64);
        }
        if options.t_wrap == WrapMode::Trunc {
            support.sy.truncate(0, region.height as i64);
        }

        let acc = &mut out[..available];
        acc.iter_mut().for_each(|a| *a = 0.0);
        let mut pixel = [0.0; PIXEL_CHUNK];
        let mut total = 0.0;
        let mut tile: Option<Arc<TextureTile>> = None;

        for y in support.sy.start..support.sy.end {
            let dy = y as Float + 0.5 - frame.cy;
            let ry = wrap_index(y, region.height, options.t_wrap);
            for x in support.sx.start..support.sx.end {
                let (u, v) = frame.to_filter(x as Float + 0.5 - frame.cx, dy);
                let w = table.weight(u, v);
                if w == 0.0 {
                    continue;
                }
                let (px, py) = match (wrap_index(x, region.width, options.s_wrap), &ry) {
                    (Wrapped::Inside(px), Wrapped::Inside(py)) => (region.x0 + px, region.y0 + *py),
                    _ => {
                        total += w;
                        continue;
                    }
                };

                if !tile.as_ref().map_or(false, |t| t.contains(px, py)) {
                    match tiles.tile_for(px, py) {
                        Ok(t) => tile = Some(t),
                        Err(err) => {
                            self.report_read_failure(tiles.header(), &err);
                            acc.iter_mut().for_each(|a| *a = options.fill);
                            return Ok(());
                        }
                    }
                }
                if let Some(t) = tile.as_ref() {
                    for (k, chunk) in acc.chunks_mut(PIXEL_CHUNK).enumerate() {
                        let values = &mut pixel[..chunk.len()];
                        t.read_pixel(px, py, options.start_channel + k * PIXEL_CHUNK, values);
                        for (a, p) in chunk.iter_mut().zip(values.iter()) {
                            *a += w * p;
                        }
                    }
                }
                total += w;
            }
        }

        if total == 0.0 {
            acc.iter_mut().for_each(|a| *a = options.fill);
        } else {
            acc.iter_mut().for_each(|a| *a /= total);
        }
        Ok(())
    }

    /// Logs the first tile read failure of this sampler.
    ///
    /// * `header` - Header of the level being read.
    /// * `err`    - The error.
    fn report_read_failure(&self, header: &TextureFileHeader, err: &TexError) {
        if !self.read_failed.swap(true, Ordering::Relaxed) {
            warn!(
                "Tile read failed for {} x {} level: {err}; using fill value",
                header.width, header.height
            );
        }
    }
}
